//! OCR reply normalization.
//!
//! OCR services answer in many shapes. Each shape has one matcher; the
//! matchers run in order and the first hit decides how the reply is shown.

use providers::error::error_detail;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum OcrShape {
    /// A single text field.
    Text(String),
    /// Block / line / paragraph arrays.
    Lines(Vec<String>),
    /// A non-empty object with no recognizable text field.
    Opaque(Value),
    Empty,
}

type Matcher = fn(&Value) -> Option<OcrShape>;

const MATCHERS: &[Matcher] = &[direct_text, structured_lines, field_scan, opaque];

const DIRECT_FIELDS: [&str; 4] = ["text", "extracted_text", "result", "content"];
const ARRAY_FIELDS: [&str; 3] = ["blocks", "lines", "paragraphs"];
const ITEM_FIELDS: [&str; 3] = ["text", "content", "value"];
const SCAN_FIELDS: [&str; 6] = ["text", "content", "result", "extracted_text", "ocr_text", "data"];

pub fn classify(body: &Value) -> OcrShape {
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(body))
        .unwrap_or(OcrShape::Empty)
}

/// Display text for a successful OCR response body.
pub fn normalize(body: &Value) -> String {
    if let Some(detail) = reported_error(body) {
        return format!("**Error:** {}", detail);
    }
    render(&classify(body))
}

pub fn render(shape: &OcrShape) -> String {
    match shape {
        OcrShape::Text(text) => extracted(text),
        OcrShape::Lines(lines) => {
            let joined = lines.join("\n");
            if joined.is_empty() {
                extracted("No text found in image.")
            } else {
                extracted(&joined)
            }
        }
        OcrShape::Opaque(value) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            format!("📝 **OCR Result:**\n\n```json\n{}\n```", pretty)
        }
        OcrShape::Empty => "📝 No text found in the image.".to_string(),
    }
}

/// Error reported inside a body that otherwise came back successfully.
pub fn reported_error(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    if !truthy(error) {
        return None;
    }
    Some(error_detail(body).unwrap_or_else(|| error.to_string()))
}

fn extracted(text: &str) -> String {
    format!("📝 **Extracted Text:**\n\n{}", text)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_empty_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn direct_text(body: &Value) -> Option<OcrShape> {
    DIRECT_FIELDS
        .iter()
        .find_map(|f| non_empty_str(body, f))
        .map(|s| OcrShape::Text(s.to_string()))
}

fn structured_lines(body: &Value) -> Option<OcrShape> {
    let items = ARRAY_FIELDS
        .iter()
        .find_map(|f| body.get(*f).and_then(Value::as_array))?;
    let lines = items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => ITEM_FIELDS
                .iter()
                .find_map(|f| non_empty_str(other, f))
                .unwrap_or_default()
                .to_string(),
        })
        .collect();
    Some(OcrShape::Lines(lines))
}

fn field_scan(body: &Value) -> Option<OcrShape> {
    SCAN_FIELDS
        .iter()
        .find_map(|f| non_empty_str(body, f))
        .map(|s| OcrShape::Text(s.to_string()))
}

fn opaque(body: &Value) -> Option<OcrShape> {
    let non_empty = match body {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    };
    non_empty.then(|| OcrShape::Opaque(body.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_text() {
        assert_eq!(classify(&json!({"text": "hello"})), OcrShape::Text("hello".into()));
        assert_eq!(
            normalize(&json!({"text": "hello"})),
            "📝 **Extracted Text:**\n\nhello"
        );
    }

    #[test]
    fn test_alternate_direct_fields_in_order() {
        let body = json!({"content": "second", "extracted_text": "first"});
        assert_eq!(classify(&body), OcrShape::Text("first".into()));
    }

    #[test]
    fn test_blocks_join_with_newlines() {
        let body = json!({"blocks": [{"text": "a"}, {"text": "b"}]});
        assert_eq!(classify(&body), OcrShape::Lines(vec!["a".into(), "b".into()]));
        assert_eq!(normalize(&body), "📝 **Extracted Text:**\n\na\nb");
    }

    #[test]
    fn test_lines_use_fallback_item_fields() {
        let body = json!({"lines": [{"content": "x"}, {"value": "y"}, {"other": 1}]});
        assert_eq!(render(&classify(&body)), "📝 **Extracted Text:**\n\nx\ny\n");
    }

    #[test]
    fn test_empty_structured_array() {
        let body = json!({"paragraphs": []});
        assert_eq!(
            normalize(&body),
            "📝 **Extracted Text:**\n\nNo text found in image."
        );
    }

    #[test]
    fn test_scan_finds_ocr_text() {
        assert_eq!(
            classify(&json!({"ocr_text": "scanned", "pages": 1})),
            OcrShape::Text("scanned".into())
        );
    }

    #[test]
    fn test_unrecognized_object_is_dumped() {
        let body = json!({"foo": "bar"});
        assert_eq!(classify(&body), OcrShape::Opaque(body.clone()));
        assert_eq!(
            normalize(&body),
            "📝 **OCR Result:**\n\n```json\n{\n  \"foo\": \"bar\"\n}\n```"
        );
    }

    #[test]
    fn test_empty_bodies() {
        assert_eq!(classify(&json!({})), OcrShape::Empty);
        assert_eq!(classify(&json!(null)), OcrShape::Empty);
        assert_eq!(normalize(&json!({})), "📝 No text found in the image.");
    }

    #[test]
    fn test_error_in_body() {
        let body = json!({"error": "Failed to extract text", "details": {"error": "blurry"}});
        assert_eq!(normalize(&body), "**Error:** blurry");
        assert!(reported_error(&json!({"error": null, "text": "ok"})).is_none());
    }
}
