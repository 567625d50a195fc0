use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::models::Expense;
use crate::query::{with_store, CellValue, QueryResult, Table};

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// The full `expenses` table held in memory for the Overview and Raw Data
/// pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    expenses: Vec<Expense>,
}

impl Dataset {
    /// Rows are kept sorted by date; ties keep their input order.
    pub fn from_expenses(mut expenses: Vec<Expense>) -> Self {
        expenses.sort_by_key(|e| e.date);
        Self { expenses }
    }

    pub fn load(db_path: &Path) -> QueryResult<Self> {
        let expenses = with_store(db_path, |conn| {
            let mut stmt = conn.prepare(
                "SELECT Date, Category, Payment_Mode, Description, Amount_Paid, Cashback \
                 FROM expenses ORDER BY Date",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Expense {
                    date: row.get(0)?,
                    category: row.get(1)?,
                    payment_mode: row.get(2)?,
                    description: row.get(3)?,
                    amount_paid: row.get(4)?,
                    cashback: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        tracing::info!(rows = expenses.len(), "dataset loaded");
        Ok(Self::from_expenses(expenses))
    }

    pub fn row_count(&self) -> usize {
        self.expenses.len()
    }

    /// First and last date present.
    pub fn date_span(&self) -> Option<DateWindow> {
        let first = self.expenses.first()?.date;
        let last = self.expenses.last()?.date;
        Some(DateWindow { start: first, end: last })
    }

    pub fn filter(&self, window: DateWindow) -> Vec<&Expense> {
        self.expenses.iter().filter(|e| window.contains(e.date)).collect()
    }

    /// Every row with derived `Month` and `DayOfWeek` columns.
    pub fn raw_table(&self) -> Table {
        let columns = [
            "Date", "Category", "Payment_Mode", "Description", "Amount_Paid", "Cashback", "Month",
            "DayOfWeek",
        ];
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for e in &self.expenses {
            table.rows.push(vec![
                CellValue::Text(e.date.format("%Y-%m-%d").to_string()),
                CellValue::Text(e.category.to_string()),
                CellValue::Text(e.payment_mode.to_string()),
                e.description.clone().map(CellValue::Text).unwrap_or(CellValue::Null),
                CellValue::Real(e.amount_paid),
                CellValue::Real(e.cashback),
                CellValue::Text(e.date.format("%Y-%m").to_string()),
                CellValue::Text(e.date.format("%A").to_string()),
            ]);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Filter window
// ---------------------------------------------------------------------------

/// Closed date interval, `start <= end` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        Self { start: a.min(b), end: a.max(b) }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    fn clamp(&self, day: NaiveDate) -> NaiveDate {
        day.clamp(self.start, self.end)
    }

    /// The window a user picked inside `span`: both bounds give a sorted
    /// range, one bound gives that single day, none gives the whole span.
    pub fn pick(span: DateWindow, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        match (start, end) {
            (Some(a), Some(b)) => DateWindow::new(span.clamp(a), span.clamp(b)),
            (Some(day), None) | (None, Some(day)) => DateWindow::single(span.clamp(day)),
            (None, None) => span,
        }
    }
}

// ---------------------------------------------------------------------------
// Overview aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_spent: f64,
    pub total_cashback: f64,
    pub count: usize,
    /// `None` when there are no rows.
    pub average: Option<f64>,
}

pub fn summarize(rows: &[&Expense]) -> Summary {
    let total_spent: f64 = rows.iter().map(|e| e.amount_paid).sum();
    let total_cashback: f64 = rows.iter().map(|e| e.cashback).sum();
    let count = rows.len();
    let average = (count > 0).then(|| total_spent / count as f64);
    Summary { total_spent, total_cashback, count, average }
}

fn totals_table<K, F, V>(rows: &[&Expense], key_name: &str, value_name: &str, key: F, value: V) -> Table
where
    K: Ord + ToString,
    F: Fn(&Expense) -> K,
    V: Fn(&Expense) -> f64,
{
    let mut totals: BTreeMap<K, f64> = BTreeMap::new();
    for &e in rows {
        *totals.entry(key(e)).or_default() += value(e);
    }
    let mut table = Table::new(vec![key_name.to_string(), value_name.to_string()]);
    for (k, v) in totals {
        table.rows.push(vec![CellValue::Text(k.to_string()), CellValue::Real(v)]);
    }
    table
}

fn month_of(e: &Expense) -> String {
    e.date.format("%Y-%m").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub summary: Summary,
    pub monthly_spending: Table,
    pub category_spending: Table,
    pub payment_modes: Table,
    pub monthly_cashback: Table,
}

impl Overview {
    pub fn build(rows: &[&Expense]) -> Self {
        let mut category_spending =
            totals_table(rows, "Category", "Amount_Paid", |e| e.category.to_string(), |e| e.amount_paid);
        category_spending.rows.sort_by(|a, b| {
            let a = a[1].as_f64().unwrap_or(0.0);
            let b = b[1].as_f64().unwrap_or(0.0);
            b.total_cmp(&a)
        });

        Self {
            summary: summarize(rows),
            monthly_spending: totals_table(rows, "Month", "Amount_Paid", month_of, |e| e.amount_paid),
            category_spending,
            payment_modes: totals_table(rows, "Payment_Mode", "Amount_Paid", |e| e.payment_mode, |e| e.amount_paid),
            monthly_cashback: totals_table(rows, "Month", "Cashback", month_of, |e| e.cashback),
        }
    }
}

// ---------------------------------------------------------------------------
// Memoization
// ---------------------------------------------------------------------------

struct Entry {
    version: u64,
    outcome: Arc<QueryResult<Dataset>>,
}

#[derive(Default)]
struct Slot {
    entry: Option<Entry>,
    /// Bumped by every invalidation so a load that raced one is discarded.
    generation: u64,
    loads: u64,
}

/// Holds the result of the first full-table load, errors included, until
/// [`DatasetCache::invalidate`] is called. Each fresh load bumps the version.
/// The lock is never held while the store is being read.
#[derive(Default)]
pub struct DatasetCache {
    slot: Mutex<Slot>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, db_path: &Path) -> Arc<QueryResult<Dataset>> {
        self.get_with(|| Dataset::load(db_path))
    }

    fn get_with<F>(&self, load: F) -> Arc<QueryResult<Dataset>>
    where
        F: FnOnce() -> QueryResult<Dataset>,
    {
        let generation = {
            let slot = self.lock();
            if let Some(entry) = &slot.entry {
                return Arc::clone(&entry.outcome);
            }
            slot.generation
        };

        let outcome = Arc::new(load());

        let mut slot = self.lock();
        if let Some(entry) = &slot.entry {
            return Arc::clone(&entry.outcome);
        }
        if slot.generation == generation {
            slot.loads += 1;
            let version = slot.loads;
            slot.entry = Some(Entry { version, outcome: Arc::clone(&outcome) });
            tracing::debug!(version, "dataset cache filled");
        }
        outcome
    }

    /// Version of the cached load, `None` while empty.
    pub fn version(&self) -> Option<u64> {
        self.lock().entry.as_ref().map(|e| e.version)
    }

    pub fn invalidate(&self) {
        let mut slot = self.lock();
        slot.entry = None;
        slot.generation += 1;
        tracing::info!("dataset cache invalidated");
    }
}
