//! Query planning: commerce-intent detection and marketplace scoping.

use crate::types::PlannedQuery;

/// The marketplace whose results are favoured for commerce queries.
pub const MARKETPLACE_DOMAIN: &str = "daraz.com.np";

/// Keywords that mark a query as commerce-related (matched as lowercase
/// substrings).
pub const COMMERCE_KEYWORDS: &[&str] = &[
    "price", "rate", "cost", "deal", "offer", "discount", "purchase",
];

/// Site-scope clause appended to commerce queries.
const SITE_SCOPE: &str = "(site:daraz.com.np OR site:*.com.np)";

/// Whether `query` contains any commerce keyword, case-insensitively.
pub fn has_commerce_intent(query: &str) -> bool {
    let lower = query.to_lowercase();
    COMMERCE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Rewrite a raw query for the search provider.
///
/// Commerce queries get a site-scope clause favouring the marketplace and
/// national-domain sites; everything else passes through unchanged.
pub fn plan(query: &str) -> PlannedQuery {
    if has_commerce_intent(query) {
        PlannedQuery {
            text: format!("{query} {SITE_SCOPE}"),
            commerce_intent: true,
        }
    } else {
        PlannedQuery {
            text: query.to_owned(),
            commerce_intent: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercase_keyword_triggers_rewrite() {
        let planned = plan("What is the PRICE of milk");
        assert!(planned.commerce_intent);
        assert_eq!(
            planned.text,
            "What is the PRICE of milk (site:daraz.com.np OR site:*.com.np)"
        );
    }

    #[test]
    fn non_commerce_query_passes_through() {
        let planned = plan("history of Kathmandu");
        assert!(!planned.commerce_intent);
        assert_eq!(planned.text, "history of Kathmandu");
    }

    #[test]
    fn keyword_matches_as_substring() {
        // "rate" inside "generate" counts, matching plain substring semantics.
        assert!(has_commerce_intent("how to generate reports"));
        assert!(has_commerce_intent("best deals on phones"));
    }

    #[test]
    fn every_keyword_detected() {
        for kw in COMMERCE_KEYWORDS {
            assert!(has_commerce_intent(&format!("some {kw} here")), "{kw}");
        }
    }

    #[test]
    fn empty_query_has_no_intent() {
        let planned = plan("");
        assert!(!planned.commerce_intent);
        assert!(planned.text.is_empty());
    }
}
