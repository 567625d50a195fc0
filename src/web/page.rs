use std::fmt::Write;
use std::path::Path;

use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::dataset::{DatasetCache, DateWindow, Overview};
use crate::fmt::{money, number};
use crate::query::{QueryError, Table};
use crate::reports::{reports_for, run_report, Callout, ChartSpec, Level, Page, ReportOutput};
use crate::web::chart::vega_lite;

const NO_DATA: &str = "No data found in the database. Please ensure `expense-tracker setup` was \
                       run correctly and the `expenses.db` file exists and is populated.";

const MONTHLY_SPENDING: ChartSpec = ChartSpec::line("Total Spending Per Month", "Month", "Amount_Paid");
const CATEGORY_SPENDING: ChartSpec = ChartSpec::hbar("Total Spending Per Category", "Amount_Paid", "Category");
const PAYMENT_MODES: ChartSpec = ChartSpec::pie("Spending Distribution by Payment Mode", "Payment_Mode", "Amount_Paid");
const MONTHLY_CASHBACK: ChartSpec = ChartSpec::line("Total Cashback Received Per Month", "Month", "Cashback")
    .tint("green")
    .value_label("Cashback (₹)");

const STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif;display:flex;color:#262730}\
aside{width:260px;min-height:100vh;background:#f0f2f6;padding:1.5rem;box-sizing:border-box}\
aside label{display:block;margin:.3rem 0}\
main{flex:1;padding:2rem 3rem;min-width:0}\
table{border-collapse:collapse;margin:1rem 0;font-size:.9rem}\
th,td{border:1px solid #e6e9ef;padding:.3rem .6rem;text-align:left}\
th{background:#fafafa}\
.metrics{display:flex;gap:2rem}\
.metric .value{font-size:1.8rem}\
.callout{padding:.8rem 1rem;border-radius:.4rem;margin:.8rem 0}\
.info{background:#e8f0fe}.success{background:#e6f4ea}.warning{background:#fef7e0}.error{background:#fce8e6}\
.chart{width:100%}\
.note{font-style:italic}";

/// Query string of `GET /`. Dates arrive as `YYYY-MM-DD`; empty or malformed
/// values are treated as absent.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl PageParams {
    fn date(value: &Option<String>) -> Option<NaiveDate> {
        value
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        Self::date(&self.start)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        Self::date(&self.end)
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Default)]
struct Html {
    buf: String,
    charts: usize,
}

impl Html {
    fn raw(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn heading(&mut self, level: u8, text: &str) {
        let _ = write!(self.buf, "<h{level}>{}</h{level}>", escape(text));
    }

    fn paragraph(&mut self, text: &str) {
        let _ = write!(self.buf, "<p>{}</p>", escape(text));
    }

    fn rule(&mut self) {
        self.raw("<hr>");
    }

    fn callout(&mut self, callout: &Callout) {
        let class = match callout.level {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        let _ = write!(self.buf, "<div class=\"callout {class}\">{}", escape(&callout.text));
        if !callout.items.is_empty() {
            self.raw("<ul>");
            for item in &callout.items {
                let _ = write!(self.buf, "<li>{}</li>", escape(item));
            }
            self.raw("</ul>");
        }
        self.raw("</div>");
    }

    fn error(&mut self, message: &str) {
        self.callout(&Callout::new(Level::Error, message));
    }

    fn metric(&mut self, label: &str, value: &str) {
        let _ = write!(
            self.buf,
            "<div class=\"metric\"><div>{}</div><div class=\"value\">{}</div></div>",
            escape(label),
            escape(value)
        );
    }

    fn table(&mut self, table: &Table) {
        self.raw("<table><thead><tr>");
        for column in &table.columns {
            let _ = write!(self.buf, "<th>{}</th>", escape(column));
        }
        self.raw("</tr></thead><tbody>");
        for row in &table.rows {
            self.raw("<tr>");
            for cell in row {
                let _ = write!(self.buf, "<td>{}</td>", escape(&cell.to_string()));
            }
            self.raw("</tr>");
        }
        self.raw("</tbody></table>");
    }

    fn chart(&mut self, spec: &ChartSpec, table: &Table) {
        self.charts += 1;
        let id = format!("chart-{}", self.charts);
        // A literal "</" would end the script element early.
        let json = vega_lite(spec, table).to_string().replace("</", "<\\/");
        let _ = write!(
            self.buf,
            "<div class=\"chart\" id=\"{id}\"></div>\
             <script>vegaEmbed('#{id}', {json}, {{actions: false}});</script>"
        );
    }

    fn report(&mut self, output: &ReportOutput) {
        let report = output.report;
        let _ = write!(self.buf, "<section id=\"{}\">", escape(report.id));
        if !report.title.is_empty() {
            self.heading(3, report.title);
        }
        if let Some(preface) = report.preface {
            self.paragraph(preface);
        }
        if let Some(caption) = report.caption {
            self.heading(4, caption);
        }
        if let Some(error) = &output.error {
            self.error(&error.to_string());
        }
        self.table(&output.table);
        for callout in &output.callouts {
            self.callout(callout);
        }
        if let Some(chart) = &report.chart {
            if !output.table.is_empty() {
                self.chart(chart, &output.table);
            }
        }
        if let Some(note) = report.note {
            let _ = write!(self.buf, "<p class=\"note\">{}</p>", escape(note));
        }
        self.raw("</section>");
    }
}

fn open_document(html: &mut Html, page: Page, span: Option<(DateWindow, DateWindow)>) {
    let _ = write!(
        html.buf,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>Personal Expense Tracker</title><style>{STYLE}</style>\
         <script src=\"https://cdn.jsdelivr.net/npm/vega@5\"></script>\
         <script src=\"https://cdn.jsdelivr.net/npm/vega-lite@5\"></script>\
         <script src=\"https://cdn.jsdelivr.net/npm/vega-embed@6\"></script>\
         </head><body><aside><h2>Navigation</h2><form method=\"get\" action=\"/\"><p>Go to</p>"
    );
    for candidate in Page::ALL {
        let checked = if candidate == page { " checked" } else { "" };
        let _ = write!(
            html.buf,
            "<label><input type=\"radio\" name=\"page\" value=\"{}\" onchange=\"this.form.submit()\"{checked}> {}</label>",
            candidate.slug(),
            escape(candidate.label())
        );
    }
    if let Some((bounds, window)) = span {
        let _ = write!(
            html.buf,
            "<h3>Filter Data</h3><p>Select Date Range</p>\
             <label>From <input type=\"date\" name=\"start\" min=\"{min}\" max=\"{max}\" value=\"{start}\"></label>\
             <label>To <input type=\"date\" name=\"end\" min=\"{min}\" max=\"{max}\" value=\"{end}\"></label>\
             <button type=\"submit\">Apply</button>",
            min = bounds.start,
            max = bounds.end,
            start = window.start,
            end = window.end,
        );
    }
    html.raw(
        "</form><hr><form method=\"post\" action=\"/reload\"><button type=\"submit\">Reload data</button></form>\
         </aside><main><h1>💰 Personal Expense Tracker Dashboard</h1>\
         <p>Welcome to your personal expense tracker! This dashboard provides insights into your \
         spending habits over a year based on simulated data. Navigate through the sidebar to \
         explore different aspects of your financial data.</p>",
    );
}

fn close_document(html: &mut Html) {
    html.raw("</main></body></html>");
}

fn overview(html: &mut Html, data: &Overview) {
    html.heading(2, "📊 Overall Spending Habits");
    let s = &data.summary;
    html.raw("<div class=\"metrics\">");
    html.metric("Total Spending", &money(s.total_spent));
    html.metric("Total Cashback Received", &money(s.total_cashback));
    html.metric("Total Transactions", &number(s.count as i64));
    html.metric("Avg. Transaction Value", &s.average.map(money).unwrap_or_else(|| "n/a".to_string()));
    html.raw("</div>");
    html.rule();

    html.heading(3, "Monthly Spending Trend");
    html.chart(&MONTHLY_SPENDING, &data.monthly_spending);
    html.rule();
    html.heading(3, "Spending by Category");
    html.chart(&CATEGORY_SPENDING, &data.category_spending);
    html.heading(3, "Spending by Payment Mode");
    html.chart(&PAYMENT_MODES, &data.payment_modes);
    html.rule();
    html.heading(3, "Monthly Cashback Trend");
    html.chart(&MONTHLY_CASHBACK, &data.monthly_cashback);
}

fn catalog_page(html: &mut Html, db_path: &Path, page: Page) {
    match page {
        Page::Predefined => html.heading(2, "🎯 Pre-defined Query Insights"),
        _ => {
            html.heading(2, "🔍 Custom Insightful Queries");
            html.paragraph("Here are additional queries to further explore spending patterns.");
        }
    }
    for report in reports_for(page) {
        let output = run_report(db_path, report);
        html.report(&output);
    }
}

/// Page shown when a request could not be served at all.
pub fn failure_page(error: &QueryError) -> String {
    let mut html = Html::default();
    open_document(&mut html, Page::Overview, None);
    html.error(&error.to_string());
    close_document(&mut html);
    html.buf
}

fn no_data(page: Page, error: Option<&QueryError>) -> (StatusCode, String) {
    let mut html = Html::default();
    open_document(&mut html, page, None);
    html.error(NO_DATA);
    if let Some(e) = error {
        html.error(&e.to_string());
    }
    close_document(&mut html);
    (StatusCode::SERVICE_UNAVAILABLE, html.buf)
}

/// Render one full page: sidebar navigation and date filter, then the
/// selected page's content. Fails closed with 503 when the store is missing or
/// holds no rows.
pub fn render(db_path: &Path, cache: &DatasetCache, params: &PageParams) -> (StatusCode, String) {
    let page = Page::from_slug(params.page.as_deref());
    let loaded = cache.get(db_path);

    let (dataset, bounds) = match loaded.as_ref() {
        Ok(dataset) => match dataset.date_span() {
            Some(bounds) => (dataset, bounds),
            None => return no_data(page, None),
        },
        Err(e) => return no_data(page, Some(e)),
    };
    let window = DateWindow::pick(bounds, params.start_date(), params.end_date());
    tracing::debug!(
        page = page.slug(),
        rows = dataset.row_count(),
        version = ?cache.version(),
        start = %window.start,
        end = %window.end,
        "rendering page"
    );

    let mut html = Html::default();
    open_document(&mut html, page, Some((bounds, window)));
    match page {
        Page::Overview => overview(&mut html, &Overview::build(&dataset.filter(window))),
        Page::Predefined | Page::Custom => catalog_page(&mut html, db_path, page),
        Page::RawData => {
            html.heading(2, "📋 Raw Expense Data");
            html.paragraph("Here you can view the raw simulated expense data.");
            html.table(&dataset.raw_table());
        }
    }
    close_document(&mut html);
    (StatusCode::OK, html.buf)
}
