//! Site-specific structured field extraction.
//!
//! Each [`SiteAdapter`] knows the markup of one family of sites. The
//! [`AdapterRegistry`] picks an adapter by the page's domain suffix.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Structured fields pulled out of a page, keyed by field name.
pub type DomainFields = BTreeMap<String, String>;

/// Value of the `source` field added to non-empty marketplace results.
pub const MARKETPLACE_SOURCE: &str = "Daraz.com.np";

/// Extracts structured fields from a parsed page of a known site.
pub trait SiteAdapter: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Extract whatever fields are present. Missing fields are omitted.
    fn extract(&self, document: &Html) -> DomainFields;
}

/// Maps domain suffixes to adapters.
///
/// A domain matches a suffix when it equals it or ends with `.{suffix}`.
/// Registration order decides ties.
pub struct AdapterRegistry {
    entries: Vec<(String, Box<dyn SiteAdapter>)>,
}

impl AdapterRegistry {
    /// A registry with no adapters.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `adapter` for `suffix` (lowercased).
    pub fn register(mut self, suffix: &str, adapter: impl SiteAdapter + 'static) -> Self {
        self.entries
            .push((suffix.to_ascii_lowercase(), Box::new(adapter)));
        self
    }

    /// The adapter responsible for `domain`, if any.
    pub fn find(&self, domain: &str) -> Option<&dyn SiteAdapter> {
        let domain = domain.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(suffix, _)| domain == *suffix || domain.ends_with(&format!(".{suffix}")))
            .map(|(_, adapter)| adapter.as_ref())
    }

    /// Run the matching adapter, or return no fields for unknown domains.
    pub fn extract(&self, domain: &str, document: &Html) -> DomainFields {
        match self.find(domain) {
            Some(adapter) => {
                let fields = adapter.extract(document);
                tracing::debug!(adapter = adapter.name(), domain, fields = fields.len(), "site adapter ran");
                fields
            }
            None => DomainFields::new(),
        }
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::empty()
            .register("daraz.com.np", MarketplaceAdapter)
            .register("daraz.com", MarketplaceAdapter)
            .register("hamropatro.com", RatesAdapter)
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(suffix, a)| (suffix, a.name())))
            .finish()
    }
}

// ── Marketplace product pages ───────────────────────────────

const TITLE_SELECTORS: &[&str] = &[
    r#"[class*="pdp-title"]"#,
    r#"[class*="product-title"]"#,
    r#"[class*="item-title"]"#,
    "h1.title",
    "h1",
];
const PRICE_SELECTORS: &[&str] = &[
    r#"[class*="pdp-price"]"#,
    r#"[class*="product-price"]"#,
    r#"[class*="price"]"#,
    "[data-price]",
];
const DISCOUNT_SELECTORS: &[&str] = &[r#"[class*="discount"]"#, r#"[class*="off"]"#, r#"[class*="save"]"#];
const STOCK_SELECTORS: &[&str] = &[r#"[class*="quantity"]"#, r#"[class*="stock"]"#, r#"[class*="inventory"]"#];
const RATING_SELECTORS: &[&str] = &[r#"[class*="rating"]"#, r#"[class*="stars"]"#];
const DATE_SELECTORS: &[&str] = &[r#"[class*="time"]"#, r#"[class*="date"]"#, "time", "[datetime]"];

/// Product pages on the marketplace: title, price, discount, stock,
/// rating and date.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketplaceAdapter;

impl SiteAdapter for MarketplaceAdapter {
    fn name(&self) -> &'static str {
        "marketplace"
    }

    fn extract(&self, document: &Html) -> DomainFields {
        let mut fields = DomainFields::new();

        if let Some(el) = first_match(document, TITLE_SELECTORS) {
            fields.insert("title".into(), element_text(&el));
        }
        if let Some(el) = first_match(document, PRICE_SELECTORS) {
            fields.insert("price".into(), format_price(&element_text(&el)));
        }
        if let Some(el) = first_match(document, DISCOUNT_SELECTORS) {
            fields.insert("discount".into(), element_text(&el));
        }
        if let Some(el) = first_match(document, STOCK_SELECTORS) {
            fields.insert("stock".into(), element_text(&el));
        }
        if let Some(el) = first_match(document, RATING_SELECTORS) {
            fields.insert("rating".into(), element_text(&el));
        }
        if let Some(el) = first_match(document, DATE_SELECTORS) {
            let raw = el
                .value()
                .attr("datetime")
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| element_text(&el));
            fields.insert("date".into(), normalize_date(&raw));
        }

        if !fields.is_empty() {
            fields.insert("source".into(), MARKETPLACE_SOURCE.into());
        }
        fields
    }
}

/// The first element matching any of `selectors`, tried in order.
fn first_match<'a>(document: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| {
        let selector = Selector::parse(s).ok()?;
        document.select(&selector).next()
    })
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_owned()
}

fn non_price_chars() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d.,]").ok()).as_ref()
}

/// Keep only digits, dots and commas, prefixed with the rupee marker.
///
/// Separators left dangling at either end (the dot of a "Rs." prefix) are
/// dropped.
fn format_price(raw: &str) -> String {
    let digits = match non_price_chars() {
        Some(re) => re.replace_all(raw, "").into_owned(),
        None => raw.to_owned(),
    };
    let digits = digits.trim_matches(|c| c == '.' || c == ',');
    format!("Rs. {digits}")
}

/// Normalise an ISO-8601 date or datetime to `YYYY-MM-DD`; anything else
/// is returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return dt.date().format("%Y-%m-%d").to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_owned()
}

// ── Commodity / exchange rate pages ─────────────────────────

/// Commodity keywords that mark a table or text block as rate data.
const RATE_KEYWORDS: &[&str] = &["gold", "silver", "petrol", "diesel", "vegetables"];

fn currency_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:रु|Rs|NPR|price|rate)").ok())
        .as_ref()
}

/// Rate listing pages: key/value rows from commodity tables plus
/// currency-looking text near commodity names.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatesAdapter;

impl SiteAdapter for RatesAdapter {
    fn name(&self) -> &'static str {
        "rates"
    }

    fn extract(&self, document: &Html) -> DomainFields {
        let mut fields = DomainFields::new();
        extract_rate_tables(document, &mut fields);
        extract_rate_text(document, &mut fields);
        fields
    }
}

fn mentions_commodity(text: &str) -> bool {
    let lower = text.to_lowercase();
    RATE_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn extract_rate_tables(document: &Html, fields: &mut DomainFields) {
    let (Ok(table_sel), Ok(row_sel), Ok(cell_sel)) = (
        Selector::parse("table"),
        Selector::parse("tr"),
        Selector::parse("td, th"),
    ) else {
        return;
    };

    for table in document.select(&table_sel) {
        if !mentions_commodity(&table.text().collect::<String>()) {
            continue;
        }
        for row in table.select(&row_sel) {
            let cells: Vec<String> = row.select(&cell_sel).map(|c| element_text(&c)).collect();
            if let [key, value, ..] = cells.as_slice() {
                fields.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Text nodes that look like prices, kept when their parent element
/// mentions a commodity. Key and value are both the parent's full text.
fn extract_rate_text(document: &Html, fields: &mut DomainFields) {
    let Some(pattern) = currency_pattern() else {
        return;
    };

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if !pattern.is_match(text) {
            continue;
        }
        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let value = element_text(&parent);
        if !value.is_empty() && mentions_commodity(&value) {
            fields.insert(value.clone(), value);
        }
    }
}

/// Render domain fields as `Key: value` lines.
///
/// `title`, `price`, `discount`, `stock`, `rating` and `date` come first in
/// that order, remaining keys follow alphabetically. Keys are capitalised.
pub fn format_domain_fields(fields: &DomainFields) -> String {
    const PRIORITY: &[&str] = &["title", "price", "discount", "stock", "rating", "date"];

    let leading = PRIORITY
        .iter()
        .filter_map(|k| fields.get_key_value(*k));
    let rest = fields
        .iter()
        .filter(|(k, _)| !PRIORITY.contains(&k.as_str()));

    leading
        .chain(rest)
        .map(|(k, v)| format!("{}: {v}", capitalise(k)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
