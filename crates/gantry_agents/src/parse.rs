//! Extraction of structure from generated text.
//!
//! All pattern matching on model output lives here so the stages only deal
//! with typed results:
//!
//! - an optional output path declared on the first line (`// FILE: <path>`)
//! - the persistence-model fragment following the `/* SCHEMA */` marker
//! - code fences wrapped around generated files

use regex::Regex;
use thiserror::Error;

/// Token separating the interface definition from the persistence fragment.
pub const SCHEMA_MARKER: &str = "/* SCHEMA */";

/// Errors produced while parsing generated text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("schema marker '{}' not found", SCHEMA_MARKER)]
    MissingMarker,

    #[error("no '// FILE: <path>' header on the first line")]
    MissingPathHeader,

    #[error("malformed schema fragment: {0}")]
    MalformedFragment(String),
}

/// A `model <Name> { ... }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFragment {
    pub model_name: String,
    pub text: String,
}

/// A contract response split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDocument {
    /// Declared output path, if the header was present
    pub path: Option<String>,
    /// Interface definition with header, marker and fragment removed
    pub body: String,
    /// Persistence fragment, or why there is none
    pub fragment: Result<SchemaFragment, ParseError>,
}

fn header_regex() -> Option<Regex> {
    Regex::new(r"^\s*(?://|#)\s*FILE:\s*(\S+)\s*$").ok()
}

fn model_regex() -> Option<Regex> {
    Regex::new(r"\bmodel\s+(\w+)\s*\{").ok()
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Remove markdown code fence lines.
pub fn strip_code_fences(text: &str) -> String {
    let kept: Vec<&str> = text.lines().filter(|l| !is_fence(l)).collect();
    let mut out = kept.join("\n").trim().to_string();
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Read the declared output path from the first meaningful line.
///
/// Returns the path and the text with the header line removed.
pub fn parse_path_header(text: &str) -> Result<(String, String), ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let first = lines
        .iter()
        .position(|l| !l.trim().is_empty() && !is_fence(l))
        .ok_or(ParseError::MissingPathHeader)?;

    let captures = header_regex()
        .and_then(|re| re.captures(lines[first]))
        .ok_or(ParseError::MissingPathHeader)?;
    let path = captures
        .get(1)
        .map(|m| m.as_str().to_string())
        .ok_or(ParseError::MissingPathHeader)?;

    let rest: Vec<&str> = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != first)
        .map(|(_, l)| *l)
        .collect();
    Ok((path, rest.join("\n")))
}

/// Find the end (exclusive byte offset) of the block opened at `open`.
fn balanced_end(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Locate the first `model <Name> { ... }` block at or after `from`.
///
/// Returns (start, end, name) as byte offsets into `text`.
fn find_model(text: &str, from: usize) -> Result<(usize, usize, String), ParseError> {
    let no_block = || ParseError::MalformedFragment("no model block after marker".to_string());
    let re = model_regex().ok_or_else(no_block)?;
    let captures = re.captures(&text[from..]).ok_or_else(no_block)?;
    let whole = captures.get(0).ok_or_else(no_block)?;
    let name = captures
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let start = from + whole.start();
    let open = from + whole.end() - 1;
    let end = balanced_end(text, open).ok_or_else(|| {
        ParseError::MalformedFragment(format!("unbalanced braces in model {}", name))
    })?;
    Ok((start, end, name))
}

/// Extract the persistence fragment after the first marker occurrence.
pub fn extract_schema_fragment(text: &str) -> Result<SchemaFragment, ParseError> {
    let marker = text.find(SCHEMA_MARKER).ok_or(ParseError::MissingMarker)?;
    let (start, end, model_name) = find_model(text, marker + SCHEMA_MARKER.len())?;
    Ok(SchemaFragment {
        model_name,
        text: text[start..end].to_string(),
    })
}

/// Byte range of an existing `model <name> { ... }` block, if any.
pub fn find_model_block(text: &str, name: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while from < text.len() {
        let (start, end, found) = find_model(text, from).ok()?;
        if found == name {
            return Some((start, end));
        }
        from = end;
    }
    None
}

/// Split a contract response into path, interface body and fragment.
///
/// A malformed fragment is an error; a missing header or marker is not.
pub fn parse_contract(text: &str) -> Result<ContractDocument, ParseError> {
    let (path, without_header) = match parse_path_header(text) {
        Ok((path, rest)) => (Some(path), rest),
        Err(_) => (None, text.to_string()),
    };

    let (body, fragment) = match without_header.find(SCHEMA_MARKER) {
        Some(marker) => {
            let (start, end, model_name) =
                find_model(&without_header, marker + SCHEMA_MARKER.len())?;
            let fragment_text = without_header[start..end].to_string();
            let body = format!("{}{}", &without_header[..marker], &without_header[end..]);
            (
                body,
                Ok(SchemaFragment {
                    model_name,
                    text: fragment_text,
                }),
            )
        }
        None => (without_header, Err(ParseError::MissingMarker)),
    };

    Ok(ContractDocument {
        path,
        body: strip_code_fences(&body),
        fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "```ts\n// FILE: types/x.ts\nexport interface X {\n  id: string;\n}\n\nexport interface XView {\n  label: string;\n}\n\n/* SCHEMA */\nmodel X {\n  id String @id\n  meta Json @default(\"{}\")\n}\n```\n";

    #[test]
    fn test_parse_path_header() {
        let (path, rest) = parse_path_header(RESPONSE).unwrap();
        assert_eq!(path, "types/x.ts");
        assert!(!rest.contains("FILE:"));
    }

    #[test]
    fn test_missing_path_header() {
        assert_eq!(
            parse_path_header("export interface X {}"),
            Err(ParseError::MissingPathHeader)
        );
        assert_eq!(parse_path_header("   \n"), Err(ParseError::MissingPathHeader));
    }

    #[test]
    fn test_extract_fragment_stops_at_balanced_brace() {
        let fragment = extract_schema_fragment(RESPONSE).unwrap();
        assert_eq!(fragment.model_name, "X");
        assert!(fragment.text.starts_with("model X {"));
        assert!(fragment.text.ends_with('}'));
        assert!(fragment.text.contains("@default(\"{}\")"));
        assert!(!fragment.text.contains("```"));
    }

    #[test]
    fn test_extract_uses_first_marker() {
        let text = "/* SCHEMA */\nmodel A { a Int }\n/* SCHEMA */\nmodel B { b Int }";
        assert_eq!(extract_schema_fragment(text).unwrap().model_name, "A");
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(
            extract_schema_fragment("model X { id Int }"),
            Err(ParseError::MissingMarker)
        );
    }

    #[test]
    fn test_malformed_fragment() {
        assert!(matches!(
            extract_schema_fragment("/* SCHEMA */\nmodel X {\n  id Int\n"),
            Err(ParseError::MalformedFragment(_))
        ));
        assert!(matches!(
            extract_schema_fragment("/* SCHEMA */\nnothing here"),
            Err(ParseError::MalformedFragment(_))
        ));
    }

    #[test]
    fn test_parse_contract_removes_header_marker_and_fragment() {
        let doc = parse_contract(RESPONSE).unwrap();

        assert_eq!(doc.path.as_deref(), Some("types/x.ts"));
        assert!(doc.body.contains("export interface X {"));
        assert!(doc.body.contains("export interface XView {"));
        assert!(!doc.body.contains("FILE:"));
        assert!(!doc.body.contains(SCHEMA_MARKER));
        assert!(!doc.body.contains("model X"));
        assert!(!doc.body.contains("```"));
        assert_eq!(doc.fragment.unwrap().model_name, "X");
    }

    #[test]
    fn test_parse_contract_without_header_or_marker() {
        let doc = parse_contract("export type Y = { id: string };").unwrap();
        assert_eq!(doc.path, None);
        assert_eq!(doc.body, "export type Y = { id: string };\n");
        assert_eq!(doc.fragment, Err(ParseError::MissingMarker));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```tsx\nconst a = 1;\n```"), "const a = 1;\n");
        assert_eq!(strip_code_fences("plain"), "plain\n");
    }

    #[test]
    fn test_find_model_block() {
        let schema = "model A {\n  a Int\n}\n\nmodel B {\n  b Int\n}\n";
        let (start, end) = find_model_block(schema, "B").unwrap();
        assert_eq!(&schema[start..end], "model B {\n  b Int\n}");
        assert!(find_model_block(schema, "C").is_none());
    }

    #[test]
    fn test_model_keyword_needs_word_boundary() {
        let text = "datamodel Foo {\n  a Int\n}\n\nmodel Foo {\n  id Int\n}\n";
        let (start, end) = find_model_block(text, "Foo").unwrap();
        assert_eq!(&text[start..end], "model Foo {\n  id Int\n}");

        let fragment =
            extract_schema_fragment("/* SCHEMA */\ndatamodel Bar {}\nmodel X {\n  id Int\n}").unwrap();
        assert_eq!(fragment.model_name, "X");
        assert_eq!(fragment.text, "model X {\n  id Int\n}");
    }
}
