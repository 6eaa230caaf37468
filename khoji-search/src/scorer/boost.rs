//! Deterministic domain and recency boosting.
//!
//! Formula: `boost = min(domain * recency, 2.5)` where `domain` is 2.0 for
//! the marketplace and 1.0 otherwise, and `recency` is 1.5 / 1.3 / 1.1 for
//! content at most 7 / 30 / 90 days old (1.0 if older or undated).

use chrono::NaiveDate;

use crate::planner::MARKETPLACE_DOMAIN;
use crate::types::domain_of;

/// Multiplier for marketplace-hosted results.
pub const MARKETPLACE_BOOST: f64 = 2.0;

/// Upper bound on the combined multiplier.
pub const MAX_BOOST: f64 = 2.5;

/// Date format accepted for recency boosting.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Boost multiplier for `url` with an optional `YYYY-MM-DD` date, relative
/// to today's local date.
pub fn boost(url: &str, date: Option<&str>) -> f64 {
    boost_at(url, date, chrono::Local::now().date_naive())
}

/// Boost multiplier relative to a fixed `today`.
///
/// Total: an unparseable date simply contributes no recency multiplier.
pub fn boost_at(url: &str, date: Option<&str>, today: NaiveDate) -> f64 {
    let mut boost = 1.0;

    if is_marketplace(url) {
        boost *= MARKETPLACE_BOOST;
    }

    if let Some(content_date) = date.and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok()) {
        boost *= recency_multiplier((today - content_date).num_days());
    }

    boost.min(MAX_BOOST)
}

/// Whether `url` is hosted on the marketplace or one of its subdomains.
pub fn is_marketplace(url: &str) -> bool {
    let host = domain_of(url);
    host == MARKETPLACE_DOMAIN || host.ends_with(&format!(".{MARKETPLACE_DOMAIN}"))
}

fn recency_multiplier(days_old: i64) -> f64 {
    match days_old {
        d if d <= 7 => 1.5,
        d if d <= 30 => 1.3,
        d if d <= 90 => 1.1,
        _ => 1.0,
    }
}
