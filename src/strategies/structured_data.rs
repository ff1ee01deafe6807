//! JSON-LD search for transcripts attached to a video
//!
//! Pages embedding a player often describe the video in `application/ld+json`
//! blocks, sometimes with the full `transcript` or a long `description`. The
//! blocks come in many shapes (bare objects, arrays, `@graph` wrappers, videos
//! nested under articles or courses), so the search is a depth-limited walk.
use super::FallbackChain;
use crate::page::DocumentView;
use serde_json::{Map, Value};
use tracing::debug;

const JSON_LD_SELECTOR: &str = "script[type=\"application/ld+json\"]";

/// Recursion limit for pathological nesting
pub const MAX_DEPTH: usize = 32;

/// A description at least this long is treated as a transcript
pub const LONG_DESCRIPTION_CHARS: usize = 200;

/// Fields that may carry the video id
const ID_FIELDS: [&str; 6] = ["embedUrl", "contentUrl", "url", "@id", "identifier", "thumbnailUrl"];

/// Keys the walk descends into
const NESTED_FIELDS: [&str; 3] = ["@graph", "video", "hasPart"];

fn belongs_to_video(object: &Map<String, Value>, video_id: Option<&str>) -> bool {
    let Some(video_id) = video_id else {
        return true;
    };
    ID_FIELDS.iter().any(|field| match object.get(*field) {
        Some(Value::String(value)) => value.contains(video_id),
        Some(Value::Array(values)) => values
            .iter()
            .any(|v| v.as_str().is_some_and(|s| s.contains(video_id))),
        _ => false,
    })
}

/// `@type` naming `VideoObject`, bare or as a schema.org IRI, alone or in a list
fn is_video_object(object: &Map<String, Value>) -> bool {
    let names_video = |ty: &str| ty.rsplit(['/', ':']).next() == Some("VideoObject");
    match object.get("@type") {
        Some(Value::String(ty)) => names_video(ty),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(names_video),
        _ => false,
    }
}

fn transcript_field(object: &Map<String, Value>, video_id: Option<&str>) -> Option<String> {
    if let Some(transcript) = object.get("transcript").and_then(Value::as_str) {
        if !transcript.trim().is_empty() {
            return Some(transcript.to_string());
        }
    }
    // Without an id to tie it to the player, only a video's own description counts
    if video_id.is_none() && !is_video_object(object) {
        return None;
    }
    object
        .get("description")
        .and_then(Value::as_str)
        .filter(|description| description.chars().count() >= LONG_DESCRIPTION_CHARS)
        .map(str::to_string)
}

fn walk(value: &Value, video_id: Option<&str>, depth: usize) -> Option<String> {
    if depth > MAX_DEPTH {
        debug!("Structured data nested deeper than {}, giving up on branch", MAX_DEPTH);
        return None;
    }

    match value {
        Value::Array(items) => items.iter().find_map(|item| walk(item, video_id, depth + 1)),
        Value::Object(object) => {
            if belongs_to_video(object, video_id) {
                if let Some(found) = transcript_field(object, video_id) {
                    return Some(found);
                }
            }
            NESTED_FIELDS
                .iter()
                .filter_map(|field| object.get(*field))
                .find_map(|child| walk(child, video_id, depth + 1))
        }
        _ => None,
    }
}

/// Find a `transcript`, or a long `description`, on an object belonging to
/// `video_id` anywhere in `value`. Without an id any object's `transcript`
/// qualifies, but a description only counts on a `VideoObject`.
pub fn find_transcript_in_value(value: &Value, video_id: Option<&str>) -> Option<String> {
    walk(value, video_id, 0)
}

/// Scan every JSON-LD block in the document; malformed blocks are skipped
pub(crate) fn scan_document(
    doc: &dyn DocumentView,
    video_id: Option<&str>,
    chain: &mut FallbackChain,
) -> Option<String> {
    for script in doc.query_all(JSON_LD_SELECTOR) {
        let raw = doc.text_content(script);
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => {
                if let Some(found) = find_transcript_in_value(&value, video_id) {
                    debug!("Structured data carries transcript text ({} chars)", found.len());
                    return Some(found);
                }
            }
            Err(e) => chain.record_malformed("JSON-LD block", &e),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transcript_on_matching_video() {
        let value = json!({
            "@type": "VideoObject",
            "embedUrl": "https://fast.wistia.net/embed/iframe/abc123defg",
            "transcript": "Full lesson text"
        });
        assert_eq!(
            find_transcript_in_value(&value, Some("abc123defg")).as_deref(),
            Some("Full lesson text")
        );
        assert!(find_transcript_in_value(&value, Some("zzz999yyyx")).is_none());
    }

    #[test]
    fn test_graph_and_nested_video() {
        let value = json!({
            "@context": "https://schema.org",
            "@graph": [
                { "@type": "WebPage", "description": "short" },
                {
                    "@type": "Course",
                    "hasPart": [{
                        "@type": "LearningResource",
                        "video": {
                            "@type": "VideoObject",
                            "contentUrl": ["https://embed.example/medias/abc123defg.m3u8"],
                            "transcript": "Nested transcript"
                        }
                    }]
                }
            ]
        });
        assert_eq!(
            find_transcript_in_value(&value, Some("abc123defg")).as_deref(),
            Some("Nested transcript")
        );
    }

    #[test]
    fn test_long_description_counts_short_does_not() {
        let long = "word ".repeat(60);
        let value = json!([
            { "@type": "VideoObject", "description": "too short" },
            { "@type": "VideoObject", "description": long }
        ]);
        assert_eq!(find_transcript_in_value(&value, None), Some("word ".repeat(60)));

        let short_only = json!({ "description": "too short" });
        assert!(find_transcript_in_value(&short_only, None).is_none());
    }

    #[test]
    fn test_long_description_without_id_needs_video_object() {
        let about = "The academy teaches grappling fundamentals to students worldwide. ".repeat(5);
        let lesson = "In this lesson we break down the knee slice pass step by step. ".repeat(5);
        let site = json!({
            "@graph": [
                { "@type": "Organization", "description": about },
                { "@type": "WebPage", "description": about }
            ]
        });
        assert!(find_transcript_in_value(&site, None).is_none());

        let with_video = json!({
            "@graph": [
                { "@type": "Organization", "description": about },
                { "@type": ["LearningResource", "https://schema.org/VideoObject"], "description": lesson }
            ]
        });
        assert_eq!(find_transcript_in_value(&with_video, None), Some(lesson.clone()));

        // An explicit transcript still counts on any object
        let plain = json!({ "@type": "WebPage", "transcript": "Spoken words" });
        assert_eq!(find_transcript_in_value(&plain, None).as_deref(), Some("Spoken words"));

        // With an id, the id match is what ties the description to the video
        let tied = json!({ "@type": "LearningResource", "url": "https://v.example/abc123defg", "description": lesson });
        assert_eq!(find_transcript_in_value(&tied, Some("abc123defg")), Some(lesson));
    }

    #[test]
    fn test_depth_limit_stops_runaway_nesting() {
        let mut value = json!({ "transcript": "deep" });
        for _ in 0..(MAX_DEPTH + 5) {
            value = json!({ "video": value });
        }
        assert!(find_transcript_in_value(&value, None).is_none());

        let mut shallow = json!({ "transcript": "reachable" });
        for _ in 0..5 {
            shallow = json!({ "video": shallow });
        }
        assert_eq!(find_transcript_in_value(&shallow, None).as_deref(), Some("reachable"));
    }
}
