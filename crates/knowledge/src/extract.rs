//! Corpus file extraction.
//!
//! Turns tabular, spreadsheet and line-delimited JSON files into plain text.
//! File paths are never copied into the extracted text.

use crate::types::DocumentUnit;
use calamine::{open_workbook_auto, Reader};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tableside_core::{AppError, AppResult};

/// Corpus source classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Spreadsheet,
    JsonLines,
}

impl SourceKind {
    /// Detect source kind from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xls" | "xlsx" => Some(Self::Spreadsheet),
            "jsonl" => Some(Self::JsonLines),
            _ => None,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "spreadsheet",
            Self::JsonLines => "jsonl",
        }
    }
}

/// Extract the text of one corpus file.
///
/// Returns `AppError::Extraction` when the file cannot be read or yields no
/// text; callers skip the file and continue.
pub fn extract(path: &Path) -> AppResult<DocumentUnit> {
    let kind = SourceKind::from_path(path).ok_or_else(|| {
        AppError::Extraction(format!("Unsupported file type: {:?}", path.file_name()))
    })?;

    let text = match kind {
        SourceKind::Csv => read_text(path)?,
        SourceKind::Spreadsheet => extract_spreadsheet(path)?,
        SourceKind::JsonLines => extract_jsonl(&read_text(path)?),
    };

    if text.trim().is_empty() {
        return Err(AppError::Extraction(format!(
            "No text extracted from {:?}",
            path.file_name()
        )));
    }

    Ok(DocumentUnit::new(text, Some(kind.as_str())))
}

/// Read a file as UTF-8, replacing invalid sequences.
fn read_text(path: &Path) -> AppResult<String> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::Extraction(format!("Failed to read {:?}: {}", path, e)))?;
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}

/// Render every sheet as a titled block of comma-separated rows.
fn extract_spreadsheet(path: &Path) -> AppResult<String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::Extraction(format!("Failed to open workbook {:?}: {}", path, e)))?;

    let mut parts = Vec::new();
    for (name, range) in workbook.worksheets() {
        let rows: Vec<String> = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .filter(|line| line.chars().any(|c| c != ',' && !c.is_whitespace()))
            .collect();

        if rows.is_empty() {
            continue;
        }

        parts.push(format!("=== Sheet: {} ===\n{}", name, rows.join("\n")));
    }

    Ok(parts.join("\n\n"))
}

/// Render JSONL records as text blocks separated by blank lines.
///
/// Objects with `title` and `content` become `Title: ...` followed by the
/// content; objects with only `content` contribute the content; anything else
/// is kept as raw JSON. Lines that are not JSON are kept verbatim.
pub fn extract_jsonl(raw: &str) -> String {
    let mut blocks = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let block = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(obj)) => {
                let title = obj.get("title").filter(|v| truthy(v));
                let content = obj.get("content").filter(|v| truthy(v));
                match (title, content) {
                    (Some(title), Some(content)) => {
                        format!("Title: {}\n{}", plain(title), plain(content))
                    }
                    (None, Some(content)) => plain(content),
                    _ => serde_json::to_string(&obj).unwrap_or_else(|_| line.to_string()),
                }
            }
            Ok(other) => plain(&other),
            Err(_) => line.to_string(),
        };

        blocks.push(block);
    }

    blocks.join("\n\n")
}

/// Strings without quotes, everything else as JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_source_kind_detection() {
        assert_eq!(SourceKind::from_path(Path::new("menu.CSV")), Some(SourceKind::Csv));
        assert_eq!(
            SourceKind::from_path(Path::new("sales.xlsx")),
            Some(SourceKind::Spreadsheet)
        );
        assert_eq!(SourceKind::from_path(Path::new("old.xls")), Some(SourceKind::Spreadsheet));
        assert_eq!(SourceKind::from_path(Path::new("notes.jsonl")), Some(SourceKind::JsonLines));
        assert_eq!(SourceKind::from_path(Path::new("readme.md")), None);
        assert_eq!(SourceKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_jsonl_title_and_content() {
        let raw = r#"{"title": "Bhajee", "content": "Crispy onion fritters"}"#;
        assert_eq!(extract_jsonl(raw), "Title: Bhajee\nCrispy onion fritters");
    }

    #[test]
    fn test_jsonl_content_only_and_raw() {
        let raw = concat!(
            r#"{"content": "Open daily"}"#,
            "\n\n",
            r#"{"dish": "Naan", "price": 2.5}"#,
            "\n",
            "not json at all\n",
            r#""a bare string""#,
        );
        let text = extract_jsonl(raw);
        let blocks: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0], "Open daily");
        assert!(blocks[1].contains("\"dish\":\"Naan\""));
        assert_eq!(blocks[2], "not json at all");
        assert_eq!(blocks[3], "a bare string");
    }

    #[test]
    fn test_jsonl_empty_title_uses_content() {
        let raw = r#"{"title": "", "content": "Chef's special"}"#;
        assert_eq!(extract_jsonl(raw), "Chef's special");
    }

    #[test]
    fn test_extract_csv() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("menu.csv");
        std::fs::write(&path, "Item Name,Quantity\nCauliflower Bhajee,12\n").unwrap();

        let doc = extract(&path).unwrap();
        assert!(doc.text.contains("Cauliflower Bhajee,12"));
        assert_eq!(doc.provenance.as_deref(), Some("csv"));
        assert!(!doc.text.contains(temp.path().to_str().unwrap()));
    }

    #[test]
    fn test_extract_empty_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.csv");
        std::fs::write(&path, "  \n").unwrap();

        assert!(matches!(extract(&path), Err(AppError::Extraction(_))));
    }

    #[test]
    fn test_extract_broken_spreadsheet_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.xlsx");
        std::fs::write(&path, "this is not a zip archive").unwrap();

        assert!(matches!(extract(&path), Err(AppError::Extraction(_))));
    }

    #[test]
    fn test_extract_unsupported() {
        assert!(matches!(
            extract(Path::new("notes.txt")),
            Err(AppError::Extraction(_))
        ));
    }
}
