//! Object-detection reply formatting.

use providers::wire::{Detection, SegmentResponse};
use shared::conversation::EncodedImage;

/// Comma-separated search terms, trimmed. Empty input searches for everything.
pub fn prompts(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// "2 cats, 1 dog" in first-seen order. Nameless detections are skipped.
pub fn summarize(results: &[Detection]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let names = results
        .iter()
        .filter_map(|d| d.name.as_deref())
        .filter(|n| !n.is_empty());
    for detection in names {
        match counts.iter_mut().find(|(name, _)| *name == detection) {
            Some((_, count)) => *count += 1,
            None => counts.push((detection, 1)),
        }
    }
    counts
        .iter()
        .map(|(name, count)| {
            let plural = if *count > 1 { "s" } else { "" };
            format!("{} {}{}", count, name, plural)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display text and optional annotated image for a detection reply.
pub fn render(response: &SegmentResponse, input: &str) -> (String, Option<EncodedImage>) {
    let image = response
        .annotated_image
        .as_deref()
        .filter(|b64| !b64.is_empty())
        .map(|b64| EncodedImage::from_base64("image/png", b64));

    let summary = summarize(&response.results);
    let text = if let Some(detail) = response.reported_error() {
        error_text(&detail)
    } else if !summary.is_empty() {
        format!("✅ Detected: {}", summary)
    } else {
        let mut text = "No objects detected.".to_string();
        let searched = input.trim();
        if !searched.is_empty() {
            text.push_str(&format!(" Searched for: {}", searched));
        }
        text
    };
    (text, image)
}

pub fn error_text(detail: &str) -> String {
    format!("**Error:** {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> SegmentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_summary_counts_and_pluralizes() {
        let resp = response(json!({"results": [{"name": "cat"}, {"name": "cat"}, {"name": "dog"}]}));
        assert_eq!(summarize(&resp.results), "2 cats, 1 dog");
        assert_eq!(render(&resp, "").0, "✅ Detected: 2 cats, 1 dog");
    }

    #[test]
    fn test_no_detections() {
        let resp = response(json!({"results": []}));
        assert_eq!(render(&resp, "").0, "No objects detected.");
        assert_eq!(
            render(&resp, " cat, dog ").0,
            "No objects detected. Searched for: cat, dog"
        );
    }

    #[test]
    fn test_annotated_image_attached() {
        let resp = response(json!({"results": [{"name": "cup"}], "annotated_image": "iVBORw0"}));
        let (_, image) = render(&resp, "");
        assert_eq!(image.unwrap().data_url(), "data:image/png;base64,iVBORw0");
    }

    #[test]
    fn test_error_body() {
        let resp = response(json!({"error": "Invalid file type", "detail": "Supported: jpeg, png"}));
        assert_eq!(render(&resp, "").0, "**Error:** Supported: jpeg, png");
    }

    #[test]
    fn test_null_results_mean_nothing_detected() {
        let resp = response(json!({"results": null}));
        assert_eq!(render(&resp, "cat").0, "No objects detected. Searched for: cat");
    }

    #[test]
    fn test_nameless_detections_are_skipped() {
        let resp = response(json!({"results": [{"label": "cat"}, {"score": 0.3}, {"name": "cat"}]}));
        assert_eq!(render(&resp, "").0, "✅ Detected: 2 cats");

        let unnamed = response(json!({"results": [{"score": 0.3}]}));
        assert_eq!(render(&unnamed, "").0, "No objects detected.");
    }

    #[test]
    fn test_prompts_split() {
        assert_eq!(prompts(" cat , dog,,"), vec!["cat".to_string(), "dog".to_string()]);
        assert!(prompts("   ").is_empty());
    }
}
