use chrono::{Months, NaiveDate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Result, TrackerError};
use crate::models::{Category, Expense, PaymentMode};

/// Transactions per day: 0, 1, 2 or 3.
const DAILY_COUNT_WEIGHTS: [f64; 4] = [0.1, 0.4, 0.3, 0.2];

/// Upper bound on a generation window: one hundred years.
pub const MAX_MONTHS: u32 = 1200;

const ONLINE_SHARE: f64 = 0.7;
const CASHBACK_CHANCE: f64 = 0.3;
const CASHBACK_RATE: (f64, f64) = (0.005, 0.02);

/// Used for any category missing from `AMOUNT_RANGES`.
const DEFAULT_AMOUNT_RANGE: (f64, f64) = (50.0, 2000.0);

const AMOUNT_RANGES: &[(Category, f64, f64)] = &[
    (Category::Groceries, 500.0, 3000.0),
    (Category::FoodAndDining, 200.0, 1500.0),
    (Category::Transportation, 50.0, 1000.0),
    (Category::Bills, 1000.0, 8000.0),
    (Category::Subscriptions, 100.0, 500.0),
    (Category::PersonalCare, 100.0, 700.0),
    (Category::Entertainment, 300.0, 1500.0),
    (Category::Shopping, 500.0, 5000.0),
    (Category::Health, 200.0, 2500.0),
    (Category::Education, 500.0, 10000.0),
    (Category::Travel, 1000.0, 15000.0),
    (Category::Gifts, 200.0, 2000.0),
    (Category::Rent, 5000.0, 30000.0),
    (Category::Utilities, 500.0, 2500.0),
    (Category::Insurance, 1000.0, 5000.0),
    (Category::Miscellaneous, 50.0, 1000.0),
];

// Miscellaneous has no phrases and gets a random sentence instead.
const DESCRIPTIONS: &[(Category, &[&str])] = &[
    (Category::Groceries, &["Supermarket run", "Daily essentials", "Weekly groceries", "Vegetables & fruits"]),
    (Category::FoodAndDining, &["Restaurant dinner", "Cafe latte", "Lunch with colleagues", "Takeaway food", "Snacks"]),
    (Category::Transportation, &["Bus fare", "Fuel refill", "Train ticket", "Cab ride", "Metro travel"]),
    (Category::Bills, &["Electricity bill", "Internet bill", "Phone bill", "Water bill"]),
    (Category::Subscriptions, &["Netflix subscription", "Spotify premium", "Gym membership", "Software license"]),
    (Category::PersonalCare, &["Haircut", "Salon visit", "Cosmetics", "Pharmacy purchase"]),
    (Category::Entertainment, &["Movie tickets", "Concert entry", "Gaming purchase", "Books"]),
    (Category::Shopping, &["Clothes shopping", "Electronics", "Home decor", "Online purchase"]),
    (Category::Health, &["Doctor visit", "Medicines", "Health check-up"]),
    (Category::Education, &["Course fees", "Books for study", "Tuition"]),
    (Category::Travel, &["Flight ticket", "Hotel booking", "Local sight-seeing", "Travel insurance"]),
    (Category::Gifts, &["Birthday gift", "Anniversary present", "Festival gift"]),
    (Category::Rent, &["Monthly rent payment"]),
    (Category::Utilities, &["Gas bill", "Sewage bill"]),
    (Category::Insurance, &["Health insurance premium", "Vehicle insurance"]),
];

const FILLER_WORDS: &[&str] = &[
    "local", "market", "order", "misc", "payment", "store", "service", "counter", "small",
    "purchase", "weekend", "repair", "charges", "item", "refill", "visit", "stall", "kiosk",
];

fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

fn amount_range(category: Category) -> (f64, f64) {
    AMOUNT_RANGES
        .iter()
        .find(|(c, _, _)| *c == category)
        .map(|&(_, lo, hi)| (lo, hi))
        .unwrap_or(DEFAULT_AMOUNT_RANGE)
}

fn phrases(category: Category) -> Option<&'static [&'static str]> {
    DESCRIPTIONS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|&(_, p)| p)
}

/// A four-word filler sentence, e.g. "Kiosk order small repair."
fn random_sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    let words: Vec<&str> = (0..4)
        .filter_map(|_| FILLER_WORDS.choose(rng).copied())
        .collect();
    let sentence = words.join(" ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

/// Every calendar day in `months` consecutive months starting January 1 of
/// `start_year`, rolling over into following years as needed.
pub fn calendar_days(months: u32, start_year: i32) -> Result<Vec<NaiveDate>> {
    if months > MAX_MONTHS {
        return Err(TrackerError::Other(format!(
            "cannot generate {months} months (at most {MAX_MONTHS})"
        )));
    }
    let start = NaiveDate::from_ymd_opt(start_year, 1, 1)
        .ok_or_else(|| TrackerError::InvalidDate(format!("start year {start_year}")))?;

    let mut days = Vec::new();
    for i in 0..months {
        let first = start
            .checked_add_months(Months::new(i))
            .ok_or_else(|| TrackerError::InvalidDate(format!("{i} months after {start}")))?;
        let next = first
            .checked_add_months(Months::new(1))
            .ok_or_else(|| TrackerError::InvalidDate(format!("month after {first}")))?;
        let days_in_month = next.signed_duration_since(first).num_days();
        days.extend(first.iter_days().take(days_in_month as usize));
    }
    Ok(days)
}

fn generate_one<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> Expense {
    let category = *Category::ALL.choose(rng).unwrap_or(&Category::Miscellaneous);
    let payment_mode = if rng.gen_bool(ONLINE_SHARE) {
        PaymentMode::Online
    } else {
        PaymentMode::Cash
    };

    let (lo, hi) = amount_range(category);
    let amount_paid = round2(rng.gen_range(lo..=hi));

    let mut description = match phrases(category).and_then(|p| p.choose(rng)) {
        Some(phrase) => phrase.to_string(),
        None => random_sentence(rng),
    };

    let mut cashback = 0.0;
    if payment_mode == PaymentMode::Online && rng.gen_bool(CASHBACK_CHANCE) {
        let rate = rng.gen_range(CASHBACK_RATE.0..=CASHBACK_RATE.1);
        cashback = round2(amount_paid * rate);
        // Whole percent, truncated.
        description.push_str(&format!(" (with {}% cashback offer)", (rate * 100.0) as u32));
    }

    Expense {
        date,
        category,
        payment_mode,
        description: Some(description),
        amount_paid,
        cashback,
    }
}

/// Simulate `months` months of spending starting January 1 of `start_year`.
/// Rows come out in date order, zero to three per day.
pub fn generate_expenses<R: Rng + ?Sized>(
    months: u32,
    start_year: i32,
    rng: &mut R,
) -> Result<Vec<Expense>> {
    let daily_count = WeightedIndex::new(DAILY_COUNT_WEIGHTS)
        .map_err(|e| TrackerError::Other(format!("invalid daily weights: {e}")))?;

    let mut expenses = Vec::new();
    for date in calendar_days(months, start_year)? {
        let count = daily_count.sample(rng);
        for _ in 0..count {
            expenses.push(generate_one(date, rng));
        }
    }
    tracing::debug!(months, start_year, rows = expenses.len(), "generated expenses");
    Ok(expenses)
}
