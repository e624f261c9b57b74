//! Deterministic leakage repair for generated answers.
//!
//! Every candidate answer passes through the same ordered stages:
//!
//! 1. contamination detection
//! 2. recovery filter (contaminated text only)
//! 3. field-label cleanup
//! 4. verbosity compression
//! 5. sentence and character caps
//! 6. tone normalization
//!
//! The pipeline is total: it never fails and never returns empty text. If
//! the patterns cannot be compiled, stages 1 to 4 are skipped and the caps
//! and tone stages still run.

mod patterns;
mod sentences;

use crate::generator::CandidateAnswer;
use patterns::{patterns, Patterns};
use sentences::{fit, split_sentences};
use tableside_core::config::AnswerSettings;
use tracing::{debug, warn};

/// Last-resort reply.
pub const GENERIC_APOLOGY: &str =
    "Sorry, I'm having trouble retrieving that info. Please ask our staff for details!";

const ALLERGY_TEMPLATE: &str = "I'd recommend dishes like Cauliflower Bhajee, Chapati, or mild curries on request. Always tell our staff about your allergy so we can prepare it safely!";

const RECOMMENDATION_TEMPLATE: &str =
    "Let me know what cuisine you prefer and I can suggest mild, vegetarian, or other options!";

/// Openers an answer may start with; anything else gets a prefix.
pub const ALLOWED_OPENERS: &[&str] = &[
    "got it",
    "perfect",
    "great",
    "sure",
    "here",
    "i'd",
    "based",
    "absolutely",
    "hello",
    "let me",
    "sorry",
];

/// More than this many indicators marks an answer as contaminated.
const CONTAMINATION_THRESHOLD: usize = 2;

/// More than this many bullets triggers compression.
const BULLET_THRESHOLD: usize = 5;

/// Sentences kept by verbosity compression.
const COMPRESSED_SENTENCES: usize = 2;

/// What the guest seems to be asking for, from the query wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Allergy,
    Recommendation,
    Neutral,
}

impl Intent {
    pub fn detect(query: &str) -> Self {
        let lower = query.to_lowercase();
        if ["allerg", "intoleran", "avoid", "spic", "chilli"]
            .iter()
            .any(|k| lower.contains(k))
        {
            Self::Allergy
        } else if ["suggest", "recommend"].iter().any(|k| lower.contains(k)) {
            Self::Recommendation
        } else {
            Self::Neutral
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Allergy => "Perfect! For your allergy: ",
            Self::Recommendation => "Here are some great options: ",
            Self::Neutral => "Here's what I found: ",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::Allergy => ALLERGY_TEMPLATE,
            Self::Recommendation => RECOMMENDATION_TEMPLATE,
            Self::Neutral => GENERIC_APOLOGY,
        }
    }
}

/// Applies the repair pipeline with configured output caps.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    max_sentences: usize,
    max_chars: usize,
}

impl Sanitizer {
    pub fn new(settings: &AnswerSettings) -> Self {
        Self {
            max_sentences: settings.max_sentences.max(1),
            max_chars: settings.max_chars.max(1),
        }
    }

    /// Repair a candidate answer. Always returns non-empty text.
    pub fn sanitize(&self, candidate: &CandidateAnswer) -> String {
        self.sanitize_text(&candidate.text, &candidate.query)
    }

    pub fn sanitize_text(&self, text: &str, query: &str) -> String {
        let intent = Intent::detect(query);

        let repaired = match patterns() {
            Ok(p) => repair(p, text, intent),
            Err(e) => {
                warn!(error = %e, "Sanitizer patterns unavailable, applying caps only");
                text.trim().to_string()
            }
        };

        let capped = fit(&repaired, self.max_sentences, self.max_chars);
        let toned = self.normalize_tone(&capped, intent);

        if toned.trim().is_empty() {
            intent.template().to_string()
        } else {
            toned
        }
    }

    /// Stage 6: prefix an opener, keeping the result within the caps.
    fn normalize_tone(&self, text: &str, intent: Intent) -> String {
        if text.is_empty() || starts_with_opener(text) {
            return text.to_string();
        }

        let prefix = intent.prefix();
        let prefix_sentences = split_sentences(prefix).len().saturating_sub(1);
        let body = fit(
            text,
            self.max_sentences.saturating_sub(prefix_sentences).max(1),
            self.max_chars.saturating_sub(prefix.chars().count()),
        );

        if body.is_empty() {
            return String::new();
        }
        format!("{}{}", prefix, body)
    }
}

/// Stages 1 to 4.
fn repair(p: &Patterns, text: &str, intent: Intent) -> String {
    let hits = p.contamination_hits(text);
    let contaminated = hits > CONTAMINATION_THRESHOLD;
    debug!(hits, contaminated, "Contamination scan");

    let text = if contaminated {
        recover(p, text, intent)
    } else {
        text.to_string()
    };

    let text = clean_labels(p, &text);
    compress(&text)
}

/// Stage 2: keep only lines that carry no raw data.
fn recover(p: &Patterns, text: &str, intent: Intent) -> String {
    let kept: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > 3 && !p.is_leaky_line(line))
        .map(|line| {
            let line = p.list_number.replace(line, "");
            p.spaces.replace_all(&line, " ").trim().to_string()
        })
        .filter(|line| !line.is_empty())
        .collect();

    if kept.is_empty() {
        debug!(?intent, "Nothing survived recovery, using template");
        return intent.template().to_string();
    }

    kept.join(" ")
}

/// Stage 3: strip field labels and section markers, tidy whitespace.
fn clean_labels(p: &Patterns, text: &str) -> String {
    let text = p.field_labels.replace_all(text, "");
    let text = p.section_markers.replace_all(&text, "");
    let text = p.inline_spaces.replace_all(&text, " ");
    let text = p.blank_lines.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Stage 4: cut repetitive explanations down to two sentences.
fn compress(text: &str) -> String {
    let verbose = text.matches("This dish").count() > 3
        || text.matches("which means").count() > 2
        || text.matches("typically consists").count() > 2
        || text.matches("The item").count() > 2
        || text.matches('•').count() > BULLET_THRESHOLD;

    if !verbose {
        return text.to_string();
    }

    debug!("Compressing verbose answer");
    split_sentences(text)
        .into_iter()
        .take(COMPRESSED_SENTENCES)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `text` opens with one of `ALLOWED_OPENERS` as a whole word.
pub fn starts_with_opener(text: &str) -> bool {
    let lower = text.trim_start().to_lowercase().replace('\u{2019}', "'");
    ALLOWED_OPENERS.iter().any(|opener| {
        lower.starts_with(opener)
            && lower[opener.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitizer() -> Sanitizer {
        Sanitizer::new(&AnswerSettings::default())
    }

    fn sentence_count(text: &str) -> usize {
        split_sentences(text).len()
    }

    #[test]
    fn test_clean_answer_only_gets_opener() {
        let out = sanitizer().sanitize_text(
            "We have a lovely Cauliflower Bhajee.",
            "what vegetarian options do you have",
        );
        assert_eq!(out, "Here's what I found: We have a lovely Cauliflower Bhajee.");
    }

    #[test]
    fn test_allowed_opener_kept() {
        let out = sanitizer().sanitize_text("Sure! The naan is freshly baked.", "naan?");
        assert_eq!(out, "Sure! The naan is freshly baked.");
    }

    #[test]
    fn test_dense_dates_and_bullets() {
        let input = "2024-01-01\n\
                     Chicken Curry • Lamb Biryani • Garlic Naan • Papadum • Pilau Rice • Bhajee • Lassi\n\
                     2024-01-02\n\
                     2024-01-03\n\
                     Main - Curry\n\
                     12\n\
                     This dish is popular. It is mild. It is cheap. It is quick.";
        let out = sanitizer().sanitize_text(input, "what is popular this week");

        assert!(!out.contains("2024-"));
        assert!(!out.contains("Main - Curry"));
        assert!(sentence_count(&out) <= 3);
        assert!(out.chars().count() <= 250);
        assert!(starts_with_opener(&out));
    }

    #[test]
    fn test_slash_dates_and_bullets() {
        let input = "01/03/2024\n\
                     02/03/2024\n\
                     03/03/2024\n\
                     Chicken Curry • Lamb Biryani • Garlic Naan • Papadum • Pilau Rice • Bhajee • Lassi";
        let out = sanitizer().sanitize_text(input, "what sold well this month");

        assert!(!out.contains("/2024"), "{}", out);
        assert!(out.contains("Chicken Curry"));
        assert!(out.chars().count() <= 250);
        assert!(starts_with_opener(&out));
    }

    #[test]
    fn test_adversarial_inputs_stay_within_caps() {
        let long_line = "Our chef's signature dish is cooked slowly with whole spices ".repeat(10);
        let many_sentences = "Try it. Love it. Share it. Order it. Repeat it. ".repeat(5);
        let bullets = "• Naan ".repeat(40);
        let cases = [
            "",
            "   \n\t  ",
            "01/03/2024\n02/03/2024\n03/03/2024",
            "Phone: 0161 496 0000\nEmail: orders@example.com\nAddress: 1 High St",
            "Tel: 0161 496 0000\n2024-01-01\n7\nThe korma is mild.",
            "Drink - Mango Lassi\nSide - Raita\nMain - Curry\n12.50\n3",
            "According to the context data in sales.xlsx, naan is popular.",
            "[Read as CSV]\n=== Sheet: Orders ===\nItem Name, Quantity: Naan, 4",
            "!!!???...",
            long_line.as_str(),
            many_sentences.as_str(),
            bullets.as_str(),
        ];
        let queries = [
            "what's popular",
            "anything without nuts? allergy",
            "can you recommend a curry",
        ];

        for input in cases {
            for query in queries {
                let out = sanitizer().sanitize_text(input, query);
                assert!(!out.trim().is_empty(), "empty for {:?} / {:?}", input, query);
                assert!(out.chars().count() <= 250, "too long: {:?}", out);
                assert!(sentence_count(&out) <= 3, "too many sentences: {:?}", out);
                assert!(starts_with_opener(&out), "no opener: {:?}", out);
            }
        }
    }

    #[test]
    fn test_recovery_template_when_nothing_survives() {
        let input = "2024-01-01\n2024-01-02\n2024-01-03\n42";
        assert_eq!(
            sanitizer().sanitize_text(input, "anything with nuts? I have an allergy"),
            ALLERGY_TEMPLATE
        );
        assert_eq!(
            sanitizer().sanitize_text(input, "can you recommend something"),
            RECOMMENDATION_TEMPLATE
        );
        assert_eq!(sanitizer().sanitize_text(input, "sales"), GENERIC_APOLOGY);
    }

    #[test]
    fn test_recovery_strips_numbering() {
        let input =
            "2024-01-01\n2024-01-02\n2024-01-03\n1. Chicken Curry is mild\n2.  Garlic   Naan is fresh";
        let out = sanitizer().sanitize_text(input, "what do people order");
        assert_eq!(
            out,
            "Here's what I found: Chicken Curry is mild Garlic Naan is fresh"
        );
    }

    #[test]
    fn test_field_labels_removed() {
        let input = "[Read as CSV]\n=== Sheet: Orders ===\n\n\nTitle: Bhajee\nItem Name, Quantity: Onion Bhajee is crispy.";
        let out = sanitizer().sanitize_text(input, "tell me about bhajee");

        assert!(!out.contains("[Read as CSV]"));
        assert!(!out.contains("==="));
        assert!(!out.contains("Title:"));
        assert!(!out.contains("Quantity:"));
        assert!(out.contains("Onion Bhajee is crispy."));
    }

    #[test]
    fn test_verbose_answer_compressed() {
        let input = "The item is great. The item is hot. The item is red. The item is big.";
        let out = sanitizer().sanitize_text(input, "describe it");
        assert_eq!(out, "Here's what I found: The item is great. The item is hot.");
    }

    #[test]
    fn test_caps() {
        let long = "Our Lamb Biryani is slow cooked with saffron rice and tender lamb pieces. ".repeat(6);
        let out = sanitizer().sanitize_text(&long, "biryani");
        assert!(out.chars().count() <= 250);
        assert!(sentence_count(&out) <= 3);
        assert!(out.ends_with('.'));
    }

    #[test]
    fn test_allergy_prefix_respects_sentence_cap() {
        let input = "Avoid the korma. Try the tikka. Ask about the dal. Enjoy.";
        let out = sanitizer().sanitize_text(input, "I am allergic to nuts");

        assert!(out.starts_with("Perfect! For your allergy: "));
        assert!(sentence_count(&out) <= 3);
    }

    #[test]
    fn test_total_on_empty_and_whitespace() {
        for input in ["", "   \n\n  ", "=== ===", "?"] {
            let out = sanitizer().sanitize_text(input, "");
            assert!(!out.trim().is_empty(), "empty output for {:?}", input);
        }
    }

    #[test]
    fn test_intent_detection() {
        assert_eq!(Intent::detect("Is it too SPICY?"), Intent::Allergy);
        assert_eq!(Intent::detect("gluten intolerance"), Intent::Allergy);
        assert_eq!(Intent::detect("what do you suggest"), Intent::Recommendation);
        assert_eq!(Intent::detect("opening hours"), Intent::Neutral);
    }

    #[test]
    fn test_opener_needs_word_boundary() {
        assert!(starts_with_opener("Here's a tip"));
        assert!(starts_with_opener("I\u{2019}d suggest the naan"));
        assert!(!starts_with_opener("Hereford beef is off the menu"));
        assert!(!starts_with_opener("We have naan"));
    }
}
