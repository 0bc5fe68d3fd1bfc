use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// `INV/{year}/{month}/{day}/{sequence}`; `sequence` is the number of orders
/// already paid on `date`.
pub fn invoice_number(date: NaiveDate, sequence: i64) -> String {
    format!(
        "INV/{}/{}/{}/{}",
        date.year(),
        date.month(),
        date.day(),
        sequence
    )
}

/// Half-open UTC bounds `[start, end)` of a calendar day.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}
