//! Compiled leakage patterns, built once per process.

use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) struct Patterns {
    /// Tokens typical of raw tabular rows
    pub raw_data: Regex,
    pub date: Regex,
    pub numeric_line: Regex,
    pub category_line: Regex,
    pub contact: Regex,
    pub self_reference: Regex,
    pub list_number: Regex,
    pub spaces: Regex,
    pub field_labels: Regex,
    pub section_markers: Regex,
    pub inline_spaces: Regex,
    pub blank_lines: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, String> {
        let re = |pattern: &str| Regex::new(pattern).map_err(|e| e.to_string());

        Ok(Self {
            raw_data: re(r"(?m)Main\s*-\s*(?:Curry|Biryani)|^\d+\.\d+")?,
            date: re(r"\d{4}-\d{2}-\d{2}|\b\d{1,2}/\d{1,2}/\d{2,4}\b")?,
            numeric_line: re(r"(?m)^\s*[\d.,]+\s*$")?,
            category_line: re(r"(?m)^\s*(?:Main|Drink|Other|Side|Starter|Dessert)\s*-.*$")?,
            contact: re(
                r"(?i)\b(?:tel|phone|email|e-mail|address)\s*[:#]|\b[\w.+-]+@[\w-]+\.[\w.]+\b|\+?\d{2,4}[ \-]?\d{3,4}[ \-]?\d{3,4}\b",
            )?,
            self_reference: re(
                r"(?i)\b(?:provided context|context data|according to the (?:data|context)|csv|database|metadata|dataset|file path)\b|\.(?:csv|xlsx?|jsonl)\b",
            )?,
            list_number: re(r"^\d+\.\s*")?,
            spaces: re(r"\s{2,}")?,
            field_labels: re(r"(?m)Item Name,\s*Quantity:\s*|^\s*Title:\s*|\b(?:Item Name|Quantity|Category):\s*")?,
            section_markers: re(r"\[Read as (?:CSV|text)\]|===.*?===")?,
            inline_spaces: re(r"[ \t]{2,}")?,
            blank_lines: re(r"\n\s*\n+")?,
        })
    }

    /// Number of leakage indicators in `text`.
    pub fn contamination_hits(&self, text: &str) -> usize {
        self.raw_data.find_iter(text).count()
            + self.date.find_iter(text).count()
            + self.numeric_line.find_iter(text).count()
            + self.category_line.find_iter(text).count()
            + self.contact.find_iter(text).count()
    }

    /// Whether a single line should be dropped during recovery.
    pub fn is_leaky_line(&self, line: &str) -> bool {
        self.date.is_match(line)
            || self.numeric_line.is_match(line)
            || self.category_line.is_match(line)
            || self.contact.is_match(line)
            || self.self_reference.is_match(line)
    }
}

static PATTERNS: Lazy<Result<Patterns, String>> = Lazy::new(Patterns::compile);

pub(crate) fn patterns() -> Result<&'static Patterns, &'static str> {
    PATTERNS.as_ref().map_err(String::as_str)
}
