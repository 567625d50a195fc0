use std::path::Path;

use rusqlite::types::ToSql;

use crate::fmt::money;
use crate::query::{run_query, CellValue, QueryError, Table};

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Predefined,
    Custom,
    RawData,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Overview, Page::Predefined, Page::Custom, Page::RawData];

    pub fn slug(self) -> &'static str {
        match self {
            Page::Overview => "overview",
            Page::Predefined => "predefined",
            Page::Custom => "custom",
            Page::RawData => "raw",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Page::Overview => "Dashboard Overview",
            Page::Predefined => "Pre-defined Query Insights",
            Page::Custom => "Custom Query Insights",
            Page::RawData => "Raw Data Viewer",
        }
    }

    /// Unknown or missing slugs land on the overview.
    pub fn from_slug(slug: Option<&str>) -> Page {
        Page::ALL
            .into_iter()
            .find(|p| Some(p.slug()) == slug)
            .unwrap_or(Page::Overview)
    }
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

/// Canonical weekday orders. Reports pick one each; they are not unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdayOrder {
    SundayFirst,
    MondayFirst,
}

const SUNDAY_FIRST: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];
const MONDAY_FIRST: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

impl WeekdayOrder {
    pub fn names(self) -> &'static [&'static str; 7] {
        match self {
            WeekdayOrder::SundayFirst => &SUNDAY_FIRST,
            WeekdayOrder::MondayFirst => &MONDAY_FIRST,
        }
    }

    pub fn rank(self, name: &str) -> Option<usize> {
        self.names().iter().position(|n| *n == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    Reorder { column: &'static str, order: WeekdayOrder },
}

impl PostProcess {
    pub fn apply(self, table: &mut Table) {
        match self {
            PostProcess::Reorder { column, order } => table.reorder_by(column, |v| order.rank(v)),
        }
    }
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartKind {
    Line { markers: bool },
    Bar { horizontal: bool },
    /// `hole` is the inner radius as a fraction of the outer one.
    Pie { hole: f64 },
}

/// For bars and lines `x`/`y` are the axis fields; a horizontal bar puts the
/// value on `x`. For pies `x` names the slices and `y` sizes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: &'static str,
    pub x: &'static str,
    pub y: &'static str,
    pub color: Option<&'static str>,
    pub tint: Option<&'static str>,
    pub value_label: &'static str,
}

impl ChartSpec {
    pub const fn new(kind: ChartKind, title: &'static str, x: &'static str, y: &'static str) -> Self {
        Self { kind, title, x, y, color: None, tint: None, value_label: "Amount (₹)" }
    }

    pub const fn line(title: &'static str, x: &'static str, y: &'static str) -> Self {
        Self::new(ChartKind::Line { markers: true }, title, x, y)
    }

    pub const fn bar(title: &'static str, x: &'static str, y: &'static str) -> Self {
        Self::new(ChartKind::Bar { horizontal: false }, title, x, y)
    }

    pub const fn hbar(title: &'static str, value: &'static str, label: &'static str) -> Self {
        Self::new(ChartKind::Bar { horizontal: true }, title, value, label)
    }

    pub const fn pie(title: &'static str, names: &'static str, values: &'static str) -> Self {
        Self::new(ChartKind::Pie { hole: 0.3 }, title, names, values)
    }

    pub const fn color(mut self, field: &'static str) -> Self {
        self.color = Some(field);
        self
    }

    pub const fn tint(mut self, color: &'static str) -> Self {
        self.tint = Some(color);
        self
    }

    pub const fn value_label(mut self, label: &'static str) -> Self {
        self.value_label = label;
        self
    }
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Callout {
    pub level: Level,
    pub text: String,
    pub items: Vec<String>,
}

impl Callout {
    pub fn new(level: Level, text: impl Into<String>) -> Self {
        Self { level, text: text.into(), items: Vec::new() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Level::Info, text)
    }
}

/// A headline derived from a report's result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insight {
    MoneyTotal { label: &'static str, column: &'static str },
    RowCount { label: &'static str },
    TopShare { name: &'static str, pct: &'static str },
    Percentage { label: &'static str, column: &'static str, fallback: &'static str },
    RankedDays { label: &'static str, date: &'static str, value: &'static str },
    HalfYears { first: &'static str, second: &'static str },
}

impl Insight {
    pub fn evaluate(self, table: &Table) -> Vec<Callout> {
        match self {
            Insight::MoneyTotal { label, column } => {
                let total = table.first(column).and_then(CellValue::as_f64).unwrap_or(0.0);
                vec![Callout::info(format!("{label}: {}", money(total)))]
            }
            Insight::RowCount { label } => {
                if table.is_empty() {
                    return Vec::new();
                }
                vec![Callout::info(format!("{label}: {}", table.len()))]
            }
            Insight::TopShare { name, pct } => {
                let top = table.first(name).and_then(CellValue::as_str);
                let share = table.first(pct).and_then(CellValue::as_f64);
                match (top, share) {
                    (Some(top), Some(share)) => vec![Callout::info(format!(
                        "Highest contributing category: {top} with {share:.2}% of total spending."
                    ))],
                    _ => Vec::new(),
                }
            }
            Insight::Percentage { label, column, fallback } => {
                match table.first(column).and_then(CellValue::as_f64) {
                    Some(pct) => vec![Callout::info(format!("{label}: {pct:.2}%"))],
                    None => vec![Callout::info(fallback)],
                }
            }
            Insight::RankedDays { label, date, value } => {
                if table.is_empty() {
                    return Vec::new();
                }
                let items = table
                    .column(date)
                    .zip(table.column(value))
                    .map(|(d, v)| format!("{d}: {}", money(v.as_f64().unwrap_or(0.0))))
                    .collect();
                vec![Callout { level: Level::Info, text: label.to_string(), items }]
            }
            Insight::HalfYears { first, second } => {
                if table.is_empty() {
                    return Vec::new();
                }
                let h1 = table.first(first).and_then(CellValue::as_f64).unwrap_or(0.0);
                let h2 = table.first(second).and_then(CellValue::as_f64).unwrap_or(0.0);
                let verdict = if h1 > h2 {
                    Callout::new(Level::Warning, "Spending was higher in the first half of the year.")
                } else if h2 > h1 {
                    Callout::new(Level::Success, "Spending was higher in the second half of the year.")
                } else {
                    Callout::info("Spending was roughly equal in both halves.")
                };
                vec![
                    Callout::info(format!("H1 (Jan-Jun) Spending: {}", money(h1))),
                    Callout::info(format!("H2 (Jul-Dec) Spending: {}", money(h2))),
                    verdict,
                ]
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Report {
    pub id: &'static str,
    pub page: Page,
    /// Empty for a report that continues the previous heading.
    pub title: &'static str,
    pub caption: Option<&'static str>,
    pub preface: Option<&'static str>,
    pub sql: &'static str,
    pub params: &'static [&'static str],
    pub post: Option<PostProcess>,
    pub chart: Option<ChartSpec>,
    pub insight: Option<Insight>,
    pub note: Option<&'static str>,
}

impl Report {
    const fn new(id: &'static str, page: Page, title: &'static str, sql: &'static str) -> Self {
        Self {
            id,
            page,
            title,
            caption: None,
            preface: None,
            sql,
            params: &[],
            post: None,
            chart: None,
            insight: None,
            note: None,
        }
    }

    const fn caption(mut self, caption: &'static str) -> Self {
        self.caption = Some(caption);
        self
    }

    const fn preface(mut self, preface: &'static str) -> Self {
        self.preface = Some(preface);
        self
    }

    const fn params(mut self, params: &'static [&'static str]) -> Self {
        self.params = params;
        self
    }

    const fn post(mut self, post: PostProcess) -> Self {
        self.post = Some(post);
        self
    }

    const fn chart(mut self, chart: ChartSpec) -> Self {
        self.chart = Some(chart);
        self
    }

    const fn insight(mut self, insight: Insight) -> Self {
        self.insight = Some(insight);
        self
    }

    const fn note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }
}

macro_rules! weekday_name {
    () => {
        "CASE STRFTIME('%w', Date) \
         WHEN '0' THEN 'Sunday' WHEN '1' THEN 'Monday' WHEN '2' THEN 'Tuesday' \
         WHEN '3' THEN 'Wednesday' WHEN '4' THEN 'Thursday' WHEN '5' THEN 'Friday' \
         WHEN '6' THEN 'Saturday' END"
    };
}

const CATEGORY_TOTALS_SQL: &str = "SELECT Category, SUM(Amount_Paid) AS Total_Amount_Spent \
     FROM expenses GROUP BY Category ORDER BY Total_Amount_Spent DESC";

const MONTHLY_TOTALS_SQL: &str = "SELECT STRFTIME('%Y-%m', Date) AS Month, SUM(Amount_Paid) AS Monthly_Spending \
     FROM expenses GROUP BY Month ORDER BY Month";

const BY_WEEKDAY: PostProcess =
    PostProcess::Reorder { column: "Day_of_Week", order: WeekdayOrder::MondayFirst };

pub static CATALOG: &[Report] = &[
    // -- Pre-defined query insights --------------------------------------
    Report::new("category_totals", Page::Predefined, "1. Total Amount Spent in Each Category", CATEGORY_TOTALS_SQL)
        .chart(ChartSpec::hbar("Total Spending Per Category", "Total_Amount_Spent", "Category")),
    Report::new(
        "payment_mode_totals",
        Page::Predefined,
        "2. Total Amount Spent Using Each Payment Mode",
        "SELECT Payment_Mode, SUM(Amount_Paid) AS Total_Amount_Spent FROM expenses GROUP BY Payment_Mode",
    )
    .chart(ChartSpec::pie("Spending Distribution by Payment Mode", "Payment_Mode", "Total_Amount_Spent")),
    Report::new(
        "total_cashback",
        Page::Predefined,
        "3. Total Cashback Received Across All Transactions",
        "SELECT SUM(Cashback) AS Total_Cashback_Received FROM expenses",
    )
    .insight(Insight::MoneyTotal { label: "Overall Cashback Received", column: "Total_Cashback_Received" }),
    Report::new(
        "top_categories",
        Page::Predefined,
        "4. Top 5 Most Expensive Categories",
        "SELECT Category, SUM(Amount_Paid) AS Total_Amount_Spent FROM expenses \
         GROUP BY Category ORDER BY Total_Amount_Spent DESC LIMIT 5",
    )
    .chart(ChartSpec::hbar("Top 5 Most Expensive Categories", "Total_Amount_Spent", "Category").color("Category")),
    Report::new(
        "transportation_by_mode",
        Page::Predefined,
        "5. Spending on Transportation Using Different Payment Modes",
        "SELECT Payment_Mode, SUM(Amount_Paid) AS Transportation_Spending FROM expenses \
         WHERE Category = ?1 GROUP BY Payment_Mode",
    )
    .params(&["Transportation"])
    .chart(ChartSpec::bar("Transportation Spending by Payment Mode", "Payment_Mode", "Transportation_Spending")),
    Report::new(
        "cashback_transactions",
        Page::Predefined,
        "6. Transactions that Resulted in Cashback",
        "SELECT Date, Category, Description, Amount_Paid, Cashback FROM expenses \
         WHERE Cashback > 0 ORDER BY Date DESC",
    )
    .insight(Insight::RowCount { label: "Total transactions with cashback" }),
    Report::new("monthly_totals", Page::Predefined, "7. Total Spending in Each Month of the Year", MONTHLY_TOTALS_SQL)
        .chart(ChartSpec::line("Total Spending Per Month", "Month", "Monthly_Spending")),
    Report::new(
        "peak_category_months",
        Page::Predefined,
        "8. Months with Highest Spending in 'Travel', 'Entertainment', or 'Gifts'",
        "SELECT STRFTIME('%Y-%m', Date) AS Month, Category, SUM(Amount_Paid) AS Total_Category_Spending \
         FROM expenses WHERE Category IN ('Travel', 'Entertainment', 'Gifts') \
         GROUP BY Month, Category ORDER BY Month, Total_Category_Spending DESC",
    )
    .chart(
        ChartSpec::bar("Spending in Travel, Entertainment, Gifts by Month", "Month", "Total_Category_Spending")
            .color("Category"),
    ),
    Report::new(
        "recurring_expenses",
        Page::Predefined,
        "9. Recurring Expenses During Specific Months (e.g., insurance premiums, property taxes)",
        "SELECT Category, STRFTIME('%m', Date) AS Month_Number, COUNT(*) AS Transaction_Count \
         FROM expenses WHERE Category IN ('Bills', 'Subscriptions', 'Rent', 'Insurance', 'Utilities') \
         GROUP BY Category, Month_Number HAVING COUNT(*) > 1 ORDER BY Category, Month_Number",
    )
    .note(
        "HAVING COUNT(*) > 1 keeps categories that appear several times in the same month number \
         across the year, which suggests a recurring expense.",
    ),
    Report::new(
        "monthly_cashback",
        Page::Predefined,
        "10. Cashback or Rewards Earned in Each Month",
        "SELECT STRFTIME('%Y-%m', Date) AS Month, SUM(Cashback) AS Total_Cashback_Earned \
         FROM expenses GROUP BY Month ORDER BY Month",
    )
    .chart(
        ChartSpec::bar("Total Cashback Earned Per Month", "Month", "Total_Cashback_Earned")
            .tint("green")
            .value_label("Cashback (₹)"),
    ),
    Report::new(
        "spending_over_time",
        Page::Predefined,
        "11. How has your overall spending changed over time?",
        MONTHLY_TOTALS_SQL,
    )
    .preface("See the monthly spending trend on the Dashboard Overview or query 7 for a chart.")
    .note("Read the trend (increasing, decreasing, stable) from the slopes and plateaus of the monthly totals."),
    Report::new(
        "travel_costs",
        Page::Predefined,
        "12. Typical Costs Associated with Different Types of Travel",
        "SELECT Category, AVG(Amount_Paid) AS Average_Cost FROM expenses \
         WHERE Category LIKE '%Travel%' OR Category = 'Transportation' \
         GROUP BY Category ORDER BY Average_Cost DESC",
    )
    .chart(
        ChartSpec::bar("Average Costs by Travel-Related Category", "Category", "Average_Cost")
            .value_label("Average Amount (₹)"),
    )
    .note("More specific travel sub-categories (flights, hotels) would make this breakdown more granular."),
    Report::new(
        "grocery_weekdays",
        Page::Predefined,
        "13. Patterns in Grocery Spending (e.g., higher spending on weekends, increased spending during specific seasons)",
        concat!(
            "SELECT ",
            weekday_name!(),
            " AS Day_of_Week, AVG(Amount_Paid) AS Average_Grocery_Spending \
             FROM expenses WHERE Category = ?1 GROUP BY Day_of_Week ORDER BY Day_of_Week"
        ),
    )
    .caption("Weekly Grocery Spending Pattern")
    .params(&["Groceries"])
    .post(PostProcess::Reorder { column: "Day_of_Week", order: WeekdayOrder::SundayFirst })
    .chart(
        ChartSpec::bar("Average Grocery Spending by Day of Week", "Day_of_Week", "Average_Grocery_Spending")
            .value_label("Average Amount (₹)"),
    ),
    Report::new(
        "grocery_months",
        Page::Predefined,
        "",
        "SELECT STRFTIME('%Y-%m', Date) AS Month, SUM(Amount_Paid) AS Monthly_Grocery_Spending \
         FROM expenses WHERE Category = ?1 GROUP BY Month ORDER BY Month",
    )
    .caption("Monthly/Seasonal Grocery Spending Pattern")
    .params(&["Groceries"])
    .chart(ChartSpec::line("Monthly Grocery Spending Trend", "Month", "Monthly_Grocery_Spending")),
    Report::new(
        "priority_categories",
        Page::Predefined,
        "14. Define High and Low Priority Categories",
        CATEGORY_TOTALS_SQL,
    )
    .preface(
        "High priority (essential, high spend): Rent, Bills, Groceries, Transportation, Insurance, Utilities. \
         Low priority (discretionary): Entertainment, Shopping, Gifts, Personal Care, Miscellaneous, \
         Food & Dining. Compare against the category totals below.",
    ),
    Report::new(
        "top_share",
        Page::Predefined,
        "15. Which Category Contributes the Highest Percentage of the Total Spending?",
        "SELECT Category, SUM(Amount_Paid) AS Category_Spending, \
         (SUM(Amount_Paid) * 100.0 / (SELECT SUM(Amount_Paid) FROM expenses)) AS Percentage_of_Total \
         FROM expenses GROUP BY Category ORDER BY Percentage_of_Total DESC LIMIT 1",
    )
    .insight(Insight::TopShare { name: "Category", pct: "Percentage_of_Total" }),
    // -- Custom query insights -------------------------------------------
    Report::new(
        "daily_totals",
        Page::Custom,
        "1. Average Daily Spending",
        "SELECT Date, SUM(Amount_Paid) AS Daily_Total_Spending FROM expenses GROUP BY Date ORDER BY Date",
    )
    .chart(ChartSpec::line("Average Daily Spending Over Time", "Date", "Daily_Total_Spending")),
    Report::new(
        "category_counts",
        Page::Custom,
        "2. Number of Transactions Per Category",
        "SELECT Category, COUNT(*) AS Transaction_Count FROM expenses \
         GROUP BY Category ORDER BY Transaction_Count DESC",
    )
    .chart(
        ChartSpec::hbar("Number of Transactions Per Category", "Transaction_Count", "Category")
            .value_label("Number of Transactions"),
    ),
    Report::new(
        "category_max",
        Page::Custom,
        "3. Highest Single Transaction in Each Category",
        "SELECT Category, MAX(Amount_Paid) AS Highest_Transaction FROM expenses \
         GROUP BY Category ORDER BY Highest_Transaction DESC",
    )
    .chart(ChartSpec::hbar("Highest Single Transaction Per Category", "Highest_Transaction", "Category")),
    Report::new(
        "weekday_totals",
        Page::Custom,
        "4. Days of the Week with the Highest Overall Spending",
        concat!(
            "SELECT ",
            weekday_name!(),
            " AS Day_of_Week, SUM(Amount_Paid) AS Total_Spending \
             FROM expenses GROUP BY Day_of_Week ORDER BY Total_Spending DESC"
        ),
    )
    .post(BY_WEEKDAY)
    .chart(ChartSpec::bar("Total Spending by Day of Week", "Day_of_Week", "Total_Spending")),
    Report::new(
        "avg_cashback_pct",
        Page::Custom,
        "5. Average Cashback Percentage per Transaction (where cashback > 0)",
        "SELECT AVG(Cashback * 100.0 / Amount_Paid) AS Avg_Cashback_Percentage \
         FROM expenses WHERE Cashback > 0 AND Amount_Paid > 0",
    )
    .insight(Insight::Percentage {
        label: "Average Cashback Percentage on qualifying transactions",
        column: "Avg_Cashback_Percentage",
        fallback: "No transactions with cashback found or amount paid was zero.",
    }),
    Report::new(
        "top_days",
        Page::Custom,
        "6. Top 3 Spending Days in the Year",
        "SELECT Date, SUM(Amount_Paid) AS Daily_Total FROM expenses \
         GROUP BY Date ORDER BY Daily_Total DESC LIMIT 3",
    )
    .insight(Insight::RankedDays { label: "Top 3 Spending Days:", date: "Date", value: "Daily_Total" }),
    Report::new(
        "cash_vs_online",
        Page::Custom,
        "7. Comparison of 'Cash' vs. 'Online' Spending Trends Over Months",
        "SELECT STRFTIME('%Y-%m', Date) AS Month, Payment_Mode, SUM(Amount_Paid) AS Monthly_Spending \
         FROM expenses GROUP BY Month, Payment_Mode ORDER BY Month, Payment_Mode",
    )
    .chart(ChartSpec::line("Monthly Spending: Cash vs. Online", "Month", "Monthly_Spending").color("Payment_Mode")),
    Report::new(
        "no_cashback_categories",
        Page::Custom,
        "8. Categories with No Cashback Received (Potential Missed Savings)",
        "SELECT DISTINCT Category FROM expenses WHERE Cashback = 0 AND Amount_Paid > 0",
    )
    .note("These categories might be areas where you could look for cashback offers or alternative payment methods."),
    Report::new(
        "monthly_avg_value",
        Page::Custom,
        "9. Monthly Average Transaction Value",
        "SELECT STRFTIME('%Y-%m', Date) AS Month, AVG(Amount_Paid) AS Average_Transaction_Value \
         FROM expenses GROUP BY Month ORDER BY Month",
    )
    .chart(ChartSpec::bar("Average Transaction Value Per Month", "Month", "Average_Transaction_Value")),
    Report::new(
        "food_weekdays",
        Page::Custom,
        "10. Total Spending on 'Food & Dining' by Day of Week",
        concat!(
            "SELECT ",
            weekday_name!(),
            " AS Day_of_Week, SUM(Amount_Paid) AS Total_Food_Spending \
             FROM expenses WHERE Category = ?1 GROUP BY Day_of_Week ORDER BY Total_Food_Spending DESC"
        ),
    )
    .params(&["Food & Dining"])
    .post(BY_WEEKDAY)
    .chart(ChartSpec::bar("Total Food & Dining Spending by Day of Week", "Day_of_Week", "Total_Food_Spending")),
    Report::new(
        "cashback_share",
        Page::Custom,
        "11. Percentage of Transactions with Cashback",
        "SELECT CAST(SUM(CASE WHEN Cashback > 0 THEN 1 ELSE 0 END) AS REAL) * 100 / COUNT(*) \
         AS Percentage_Transactions_With_Cashback FROM expenses",
    )
    .insight(Insight::Percentage {
        label: "Percentage of transactions that received cashback",
        column: "Percentage_Transactions_With_Cashback",
        fallback: "No transactions found.",
    }),
    Report::new(
        "half_years",
        Page::Custom,
        "12. Total Spending for First 6 Months vs. Last 6 Months",
        "SELECT \
         SUM(CASE WHEN STRFTIME('%m', Date) BETWEEN '01' AND '06' THEN Amount_Paid ELSE 0 END) AS H1_Spending, \
         SUM(CASE WHEN STRFTIME('%m', Date) BETWEEN '07' AND '12' THEN Amount_Paid ELSE 0 END) AS H2_Spending \
         FROM expenses",
    )
    .insight(Insight::HalfYears { first: "H1_Spending", second: "H2_Spending" }),
    Report::new(
        "monthly_by_category",
        Page::Custom,
        "13. Monthly Spending by Category (Stacked Bar Chart)",
        "SELECT STRFTIME('%Y-%m', Date) AS Month, Category, SUM(Amount_Paid) AS Monthly_Category_Spending \
         FROM expenses GROUP BY Month, Category ORDER BY Month, Category",
    )
    .chart(
        ChartSpec::bar("Monthly Spending Breakdown by Category", "Month", "Monthly_Category_Spending")
            .color("Category"),
    ),
];

pub fn reports_for(page: Page) -> impl Iterator<Item = &'static Report> {
    CATALOG.iter().filter(move |r| r.page == page)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

pub struct ReportOutput {
    pub report: &'static Report,
    pub table: Table,
    pub error: Option<QueryError>,
    pub callouts: Vec<Callout>,
}

/// Query the store for one report. A failed query yields an empty table
/// and the error, so the page can keep rendering the remaining reports.
pub fn run_report(db_path: &Path, report: &'static Report) -> ReportOutput {
    let params: Vec<&dyn ToSql> = report.params.iter().map(|p| p as &dyn ToSql).collect();
    match run_query(db_path, report.sql, &params) {
        Ok(mut table) => {
            if let Some(post) = report.post {
                post.apply(&mut table);
            }
            let callouts = report.insight.map(|i| i.evaluate(&table)).unwrap_or_default();
            ReportOutput { report, table, error: None, callouts }
        }
        Err(e) => ReportOutput { report, table: Table::default(), error: Some(e), callouts: Vec::new() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, load_expenses};
    use crate::models::{Category, Expense, PaymentMode};
    use chrono::NaiveDate;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn find(id: &str) -> Option<&'static Report> {
        CATALOG.iter().find(|r| r.id == id)
    }

    fn expense(date: &str, category: Category, mode: PaymentMode, amount: f64, cashback: f64) -> Expense {
        Expense {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category,
            payment_mode: mode,
            description: None,
            amount_paid: amount,
            cashback,
        }
    }

    fn fixture_store(expenses: &[Expense]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.db");
        let mut conn = get_connection(&path).unwrap();
        load_expenses(&mut conn, expenses).unwrap();
        (dir, path)
    }

    fn three_rows() -> (tempfile::TempDir, PathBuf) {
        fixture_store(&[
            expense("2024-01-01", Category::Groceries, PaymentMode::Cash, 500.0, 0.0),
            expense("2024-01-01", Category::Groceries, PaymentMode::Online, 300.0, 5.0),
            expense("2024-01-02", Category::FoodAndDining, PaymentMode::Online, 200.0, 0.0),
        ])
    }

    fn run(path: &Path, id: &str) -> ReportOutput {
        let out = run_report(path, find(id).unwrap());
        assert!(out.error.is_none(), "{id} failed: {:?}", out.error);
        out
    }

    fn pairs(table: &Table, key: &str, value: &str) -> Vec<(String, f64)> {
        table
            .column(key)
            .zip(table.column(value))
            .map(|(k, v)| (k.to_string(), v.as_f64().unwrap()))
            .collect()
    }

    #[test]
    fn test_category_totals_fixture() {
        let (_dir, path) = three_rows();
        let out = run(&path, "category_totals");
        assert_eq!(
            pairs(&out.table, "Category", "Total_Amount_Spent"),
            vec![("Groceries".to_string(), 800.0), ("Food & Dining".to_string(), 200.0)]
        );
    }

    #[test]
    fn test_monthly_totals_fixture() {
        let (_dir, path) = three_rows();
        let out = run(&path, "monthly_totals");
        assert_eq!(pairs(&out.table, "Month", "Monthly_Spending"), vec![("2024-01".to_string(), 1000.0)]);
    }

    #[test]
    fn test_total_cashback_fixture() {
        let (_dir, path) = three_rows();
        let out = run(&path, "total_cashback");
        assert_eq!(out.table.first("Total_Cashback_Received").and_then(CellValue::as_f64), Some(5.0));
        assert_eq!(out.callouts, vec![Callout::info("Overall Cashback Received: ₹5.00")]);
    }

    #[test]
    fn test_every_report_runs_on_fixture() {
        let (_dir, path) = three_rows();
        for report in CATALOG {
            let out = run_report(&path, report);
            assert!(out.error.is_none(), "{} failed: {:?}", report.id, out.error);
            if let Some(chart) = report.chart {
                assert!(out.table.column_index(chart.x).is_some(), "{}: missing x {}", report.id, chart.x);
                assert!(out.table.column_index(chart.y).is_some(), "{}: missing y {}", report.id, chart.y);
                if let Some(color) = chart.color {
                    assert!(out.table.column_index(color).is_some(), "{}: missing color", report.id);
                }
            }
        }
    }

    #[test]
    fn test_every_report_runs_on_empty_store() {
        let (_dir, path) = fixture_store(&[]);
        for report in CATALOG {
            let out = run_report(&path, report);
            assert!(out.error.is_none(), "{} failed: {:?}", report.id, out.error);
        }
    }

    #[test]
    fn test_missing_store_reports_error_and_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_report(&dir.path().join("missing.db"), find("category_totals").unwrap());
        assert!(matches!(out.error, Some(QueryError::Connectivity { .. })));
        assert!(out.table.is_empty());
        assert!(out.callouts.is_empty());
    }

    #[test]
    fn test_catalog_ids_unique_and_pages_populated() {
        let ids: HashSet<_> = CATALOG.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
        assert_eq!(reports_for(Page::Predefined).count(), 16);
        assert_eq!(reports_for(Page::Custom).count(), 13);
        assert_eq!(reports_for(Page::Overview).count(), 0);
    }

    #[test]
    fn test_grocery_weekdays_sunday_first() {
        // 2024-01-07 is a Sunday, 2024-01-01 a Monday, 2024-01-06 a Saturday.
        let (_dir, path) = fixture_store(&[
            expense("2024-01-06", Category::Groceries, PaymentMode::Cash, 600.0, 0.0),
            expense("2024-01-01", Category::Groceries, PaymentMode::Cash, 500.0, 0.0),
            expense("2024-01-07", Category::Groceries, PaymentMode::Cash, 700.0, 0.0),
        ]);
        let out = run(&path, "grocery_weekdays");
        let days: Vec<_> = out.table.column("Day_of_Week").filter_map(CellValue::as_str).collect();
        assert_eq!(days, vec!["Sunday", "Monday", "Saturday"]);
    }

    #[test]
    fn test_weekday_totals_monday_first() {
        let (_dir, path) = fixture_store(&[
            expense("2024-01-07", Category::Rent, PaymentMode::Cash, 9000.0, 0.0),
            expense("2024-01-03", Category::Health, PaymentMode::Cash, 300.0, 0.0),
            expense("2024-01-01", Category::Gifts, PaymentMode::Cash, 100.0, 0.0),
        ]);
        let out = run(&path, "weekday_totals");
        let days: Vec<_> = out.table.column("Day_of_Week").filter_map(CellValue::as_str).collect();
        assert_eq!(days, vec!["Monday", "Wednesday", "Sunday"]);
    }

    #[test]
    fn test_weekday_orders_differ() {
        assert_eq!(WeekdayOrder::SundayFirst.rank("Sunday"), Some(0));
        assert_eq!(WeekdayOrder::MondayFirst.rank("Sunday"), Some(6));
        assert_eq!(WeekdayOrder::MondayFirst.rank("Funday"), None);
    }

    #[test]
    fn test_transportation_report_binds_category() {
        let (_dir, path) = fixture_store(&[
            expense("2024-02-01", Category::Transportation, PaymentMode::Cash, 100.0, 0.0),
            expense("2024-02-02", Category::Transportation, PaymentMode::Online, 50.0, 0.0),
            expense("2024-02-02", Category::Travel, PaymentMode::Online, 5000.0, 0.0),
        ]);
        let out = run(&path, "transportation_by_mode");
        assert_eq!(
            pairs(&out.table, "Payment_Mode", "Transportation_Spending"),
            vec![("Cash".to_string(), 100.0), ("Online".to_string(), 50.0)]
        );
    }

    #[test]
    fn test_cashback_share_fallback_on_empty_store() {
        let (_dir, path) = fixture_store(&[]);
        let out = run(&path, "cashback_share");
        assert_eq!(out.callouts, vec![Callout::info("No transactions found.")]);
    }

    #[test]
    fn test_cashback_share_fixture() {
        let (_dir, path) = three_rows();
        let out = run(&path, "cashback_share");
        assert_eq!(
            out.callouts,
            vec![Callout::info("Percentage of transactions that received cashback: 33.33%")]
        );
    }

    #[test]
    fn test_top_share_fixture() {
        let (_dir, path) = three_rows();
        let out = run(&path, "top_share");
        assert_eq!(
            out.callouts,
            vec![Callout::info("Highest contributing category: Groceries with 80.00% of total spending.")]
        );
    }

    #[test]
    fn test_half_years_verdict() {
        let (_dir, path) = fixture_store(&[
            expense("2024-02-01", Category::Rent, PaymentMode::Cash, 100.0, 0.0),
            expense("2024-08-01", Category::Rent, PaymentMode::Cash, 250.0, 0.0),
        ]);
        let out = run(&path, "half_years");
        assert_eq!(out.callouts.len(), 3);
        assert_eq!(out.callouts[0].text, "H1 (Jan-Jun) Spending: ₹100.00");
        assert_eq!(out.callouts[2].level, Level::Success);
    }

    #[test]
    fn test_half_years_equal_is_info() {
        let mut table = Table::new(vec!["H1_Spending".into(), "H2_Spending".into()]);
        table.rows.push(vec![CellValue::Real(10.0), CellValue::Real(10.0)]);
        let callouts = Insight::HalfYears { first: "H1_Spending", second: "H2_Spending" }.evaluate(&table);
        assert_eq!(callouts[2], Callout::info("Spending was roughly equal in both halves."));
    }

    #[test]
    fn test_top_days_lists_each_day() {
        let (_dir, path) = three_rows();
        let out = run(&path, "top_days");
        assert_eq!(out.callouts.len(), 1);
        assert_eq!(out.callouts[0].items, vec!["2024-01-01: ₹800.00", "2024-01-02: ₹200.00"]);
    }

    #[test]
    fn test_cashback_transactions_count() {
        let (_dir, path) = three_rows();
        let out = run(&path, "cashback_transactions");
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.callouts, vec![Callout::info("Total transactions with cashback: 1")]);
    }

    #[test]
    fn test_page_slugs() {
        assert_eq!(Page::from_slug(Some("raw")), Page::RawData);
        assert_eq!(Page::from_slug(Some("bogus")), Page::Overview);
        assert_eq!(Page::from_slug(None), Page::Overview);
    }
}
