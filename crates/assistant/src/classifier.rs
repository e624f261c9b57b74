//! Query classification ahead of retrieval.

/// Reply to a recognised greeting.
pub const GREETING_REPLY: &str = "Hello! Welcome User. How can I help you today? Feel free to ask about our menu items, recommendations, or anything else!";

/// Reply to a query too short to search on.
pub const TOO_SHORT_REPLY: &str = "Could you please ask me something more specific?";

const GREETINGS: &[&str] = &[
    "hi",
    "hii",
    "hey",
    "hello",
    "hello there",
    "hi there",
    "hey there",
    "howdy",
    "good morning",
    "good afternoon",
    "good evening",
];

const DOMAIN_KEYWORDS: &[&str] = &[
    "order",
    "menu",
    "item",
    "dish",
    "food",
    "curry",
    "biryani",
    "naan",
    "papadum",
    "forecast",
    "demand",
    "sale",
    "popular",
    "best-seller",
    "price",
    "cost",
    "week",
    "predict",
    "trend",
    "top items",
    "availability",
    "served",
];

const MIN_QUERY_CHARS: usize = 3;

/// Outcome of classifying one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Answer immediately with fixed text; no retrieval.
    Canned(&'static str),

    /// Continue to retrieval.
    Query {
        /// Trimmed query text
        text: String,
        /// Whether the query is about menu, orders or demand
        is_domain_query: bool,
    },
}

/// Classify a raw guest query.
pub fn classify(query: &str) -> Classification {
    let trimmed = query.trim();
    let normalized: String = trimmed
        .to_lowercase()
        .chars()
        .filter(|c| *c != '!' && *c != '?')
        .collect();

    if GREETINGS.contains(&normalized.trim()) {
        return Classification::Canned(GREETING_REPLY);
    }

    if trimmed.chars().count() < MIN_QUERY_CHARS {
        return Classification::Canned(TOO_SHORT_REPLY);
    }

    Classification::Query {
        text: trimmed.to_string(),
        is_domain_query: is_domain_query(trimmed),
    }
}

/// Whether any domain keyword occurs in the query.
pub fn is_domain_query(query: &str) -> bool {
    let lower = query.to_lowercase();
    DOMAIN_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greetings() {
        for input in ["Hello!", "hi", "  Hey there?  ", "GOOD MORNING!!", "howdy"] {
            assert_eq!(
                classify(input),
                Classification::Canned(GREETING_REPLY),
                "{input}"
            );
        }
    }

    #[test]
    fn test_greeting_with_more_words_is_a_query() {
        assert!(matches!(
            classify("hello, what curries do you have"),
            Classification::Query { is_domain_query: true, .. }
        ));
    }

    #[test]
    fn test_too_short() {
        assert_eq!(classify(""), Classification::Canned(TOO_SHORT_REPLY));
        assert_eq!(classify("  ok "), Classification::Canned(TOO_SHORT_REPLY));
        assert!(matches!(classify("veg"), Classification::Query { .. }));
    }

    #[test]
    fn test_domain_flag() {
        assert_eq!(
            classify("  What's on the menu?"),
            Classification::Query {
                text: "What's on the menu?".to_string(),
                is_domain_query: true,
            }
        );
        assert!(is_domain_query("Which items are POPULAR this week"));
        assert!(is_domain_query("any top items?"));
        assert!(!is_domain_query("what vegetarian options do you have"));
        assert!(!is_domain_query("where do you park"));
    }
}
