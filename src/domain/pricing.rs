use std::collections::HashMap;
use std::path::Path;

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;

use super::errors::DomainError;

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_DAY: i128 = 86_400 * NANOS_PER_SECOND;

/// Fixed-percentage discount, valid up to and including `expires_on`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Promo {
    pub title: String,
    pub discount_percent: u8,
    pub expires_on: NaiveDate,
}

impl Promo {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.expires_on
    }
}

#[derive(Debug, Error)]
pub enum PromoCatalogError {
    #[error("failed to read promo catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed promo catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("promo '{0}' is defined more than once")]
    Duplicate(String),
    #[error("promo '{title}' has a discount of {percent}%, above 100%")]
    DiscountOutOfRange { title: String, percent: u8 },
}

/// Read-only promo table, loaded once at startup and shared by reference.
#[derive(Debug, Clone, Default)]
pub struct PromoCatalog {
    promos: HashMap<String, Promo>,
}

impl PromoCatalog {
    pub fn new(promos: Vec<Promo>) -> Result<Self, PromoCatalogError> {
        let mut by_title = HashMap::with_capacity(promos.len());
        for promo in promos {
            if promo.discount_percent > 100 {
                return Err(PromoCatalogError::DiscountOutOfRange {
                    title: promo.title,
                    percent: promo.discount_percent,
                });
            }
            if by_title.contains_key(&promo.title) {
                return Err(PromoCatalogError::Duplicate(promo.title));
            }
            by_title.insert(promo.title.clone(), promo);
        }
        Ok(Self { promos: by_title })
    }

    /// The promotions shipped with the service.
    pub fn builtin() -> Self {
        let promo = |title: &str, discount_percent: u8, (y, m, d): (i32, u32, u32)| Promo {
            title: title.to_string(),
            discount_percent,
            expires_on: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN),
        };
        let promos = [
            promo("NEWUSER", 25, (2024, 11, 25)),
            promo("SEWASUKASUKA", 15, (2024, 11, 20)),
        ];
        Self {
            promos: promos.into_iter().map(|p| (p.title.clone(), p)).collect(),
        }
    }

    /// Parse a JSON array of `{ "title", "discount_percent", "expires_on" }`.
    pub fn from_json_str(json: &str) -> Result<Self, PromoCatalogError> {
        let promos: Vec<Promo> = serde_json::from_str(json)?;
        Self::new(promos)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PromoCatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn get(&self, title: &str) -> Option<&Promo> {
        self.promos.get(title)
    }

    pub fn len(&self) -> usize {
        self.promos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.promos.is_empty()
    }
}

/// Length of the period in days, exact to the nanosecond.
pub fn rental_days(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> BigDecimal {
    let period = end_time - start_time;
    let nanos = i128::from(period.num_seconds()) * NANOS_PER_SECOND
        + i128::from(period.subsec_nanos());
    BigDecimal::from(nanos) / BigDecimal::from(NANOS_PER_DAY)
}

/// Rental price for the period, charged per day with fractional days
/// charged proportionally, then discounted by at most one promo.
pub fn compute_total(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    daily_rate: &BigDecimal,
    promo_title: Option<&str>,
    catalog: &PromoCatalog,
    today: NaiveDate,
) -> Result<BigDecimal, DomainError> {
    if end_time <= start_time {
        return Err(DomainError::InvalidDuration);
    }
    if *daily_rate < BigDecimal::zero() {
        return Err(DomainError::InvalidInput(format!(
            "daily rate {} is negative",
            daily_rate
        )));
    }

    let mut amount = daily_rate * rental_days(start_time, end_time);

    if let Some(title) = promo_title {
        let promo = catalog
            .get(title)
            .ok_or_else(|| DomainError::PromoNotFound(title.to_string()))?;
        if promo.is_expired(today) {
            return Err(DomainError::PromoExpired(promo.title.clone()));
        }
        amount = amount * BigDecimal::from(100 - u32::from(promo.discount_percent))
            / BigDecimal::from(100);
    }

    Ok(amount.with_scale_round(2, RoundingMode::HalfUp))
}
