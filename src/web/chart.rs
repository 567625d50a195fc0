use serde_json::{json, Map, Value};

use crate::query::Table;
use crate::reports::{ChartKind, ChartSpec};

const HEIGHT: u32 = 400;
const PIE_RADIUS: f64 = 150.0;

fn data_values(table: &Table) -> Vec<Value> {
    table
        .rows
        .iter()
        .map(|row| {
            let record: Map<String, Value> = table
                .columns
                .iter()
                .zip(row)
                .map(|(name, cell)| (name.clone(), serde_json::to_value(cell).unwrap_or(Value::Null)))
                .collect();
            Value::Object(record)
        })
        .collect()
}

fn category_axis(field: &str) -> Value {
    let kind = if field == "Date" { "temporal" } else { "ordinal" };
    // Keep the row order the query produced.
    json!({ "field": field, "type": kind, "sort": null, "title": field })
}

fn value_axis(field: &str, title: &str) -> Value {
    json!({ "field": field, "type": "quantitative", "title": title })
}

/// Vega-Lite spec drawing `table` as described by `spec`.
pub fn vega_lite(spec: &ChartSpec, table: &Table) -> Value {
    let (mut mark, mut encoding) = match spec.kind {
        ChartKind::Line { markers } => (
            json!({ "type": "line", "point": markers }),
            json!({ "x": category_axis(spec.x), "y": value_axis(spec.y, spec.value_label) }),
        ),
        ChartKind::Bar { horizontal: false } => (
            json!({ "type": "bar" }),
            json!({ "x": category_axis(spec.x), "y": value_axis(spec.y, spec.value_label) }),
        ),
        ChartKind::Bar { horizontal: true } => (
            json!({ "type": "bar" }),
            json!({ "x": value_axis(spec.x, spec.value_label), "y": category_axis(spec.y) }),
        ),
        ChartKind::Pie { hole } => (
            json!({ "type": "arc", "outerRadius": PIE_RADIUS, "innerRadius": PIE_RADIUS * hole }),
            json!({
                "theta": { "field": spec.y, "type": "quantitative" },
                "color": { "field": spec.x, "type": "nominal", "title": spec.x },
            }),
        ),
    };

    if let Some(field) = spec.color {
        encoding["color"] = json!({ "field": field, "type": "nominal", "title": field });
    }

    if let Some(tint) = spec.tint {
        mark["color"] = json!(tint);
    }

    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
        "title": spec.title,
        "width": "container",
        "height": HEIGHT,
        "data": { "values": data_values(table) },
        "mark": mark,
        "encoding": encoding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CellValue;

    fn table() -> Table {
        let mut t = Table::new(vec!["Category".into(), "Total".into()]);
        t.rows.push(vec![CellValue::Text("Rent".into()), CellValue::Real(9000.0)]);
        t.rows.push(vec![CellValue::Text("Gifts".into()), CellValue::Integer(200)]);
        t
    }

    #[test]
    fn test_horizontal_bar_puts_value_on_x() {
        let spec = ChartSpec::hbar("Totals", "Total", "Category");
        let v = vega_lite(&spec, &table());
        assert_eq!(v["encoding"]["x"]["field"], "Total");
        assert_eq!(v["encoding"]["x"]["type"], "quantitative");
        assert_eq!(v["encoding"]["x"]["title"], "Amount (₹)");
        assert_eq!(v["encoding"]["y"]["type"], "ordinal");
        assert_eq!(v["data"]["values"][0]["Category"], "Rent");
        assert_eq!(v["data"]["values"][1]["Total"], 200);
    }

    #[test]
    fn test_pie_has_hole() {
        let spec = ChartSpec::pie("Split", "Category", "Total");
        let v = vega_lite(&spec, &table());
        assert_eq!(v["mark"]["type"], "arc");
        assert_eq!(v["mark"]["innerRadius"], 45.0);
        assert_eq!(v["encoding"]["theta"]["field"], "Total");
        assert_eq!(v["encoding"]["color"]["field"], "Category");
    }

    #[test]
    fn test_line_markers_color_and_tint() {
        let spec = ChartSpec::line("Trend", "Category", "Total").color("Category").tint("green");
        let v = vega_lite(&spec, &table());
        assert_eq!(v["mark"]["type"], "line");
        assert_eq!(v["mark"]["point"], true);
        assert_eq!(v["mark"]["color"], "green");
        assert_eq!(v["encoding"]["color"]["field"], "Category");
        assert_eq!(v["title"], "Trend");
    }

    #[test]
    fn test_date_axis_is_temporal() {
        let mut t = Table::new(vec!["Date".into(), "Total".into()]);
        t.rows.push(vec![CellValue::Text("2024-01-01".into()), CellValue::Real(1.0)]);
        let v = vega_lite(&ChartSpec::line("Daily", "Date", "Total"), &t);
        assert_eq!(v["encoding"]["x"]["type"], "temporal");
    }
}
