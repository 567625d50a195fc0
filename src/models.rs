use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Groceries,
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    Transportation,
    Bills,
    Subscriptions,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    Entertainment,
    Shopping,
    Health,
    Education,
    Travel,
    Gifts,
    Rent,
    Utilities,
    Insurance,
    Miscellaneous,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::Groceries,
        Category::FoodAndDining,
        Category::Transportation,
        Category::Bills,
        Category::Subscriptions,
        Category::PersonalCare,
        Category::Entertainment,
        Category::Shopping,
        Category::Health,
        Category::Education,
        Category::Travel,
        Category::Gifts,
        Category::Rent,
        Category::Utilities,
        Category::Insurance,
        Category::Miscellaneous,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Groceries => "Groceries",
            Category::FoodAndDining => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Bills => "Bills",
            Category::Subscriptions => "Subscriptions",
            Category::PersonalCare => "Personal Care",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Travel => "Travel",
            Category::Gifts => "Gifts",
            Category::Rent => "Rent",
            Category::Utilities => "Utilities",
            Category::Insurance => "Insurance",
            Category::Miscellaneous => "Miscellaneous",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PaymentMode {
    Cash,
    Online,
}

impl PaymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Online => "Online",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(PaymentMode::Cash),
            "Online" => Ok(PaymentMode::Online),
            other => Err(format!("unknown payment mode: {other}")),
        }
    }
}

// Both enums are stored as their display strings.

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse().map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for PaymentMode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentMode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse().map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// One row of the `expenses` table. Column names match the persisted schema
/// so the CSV export and the table share a header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Payment_Mode")]
    pub payment_mode: PaymentMode,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Amount_Paid")]
    pub amount_paid: f64,
    #[serde(rename = "Cashback")]
    pub cashback: f64,
}
