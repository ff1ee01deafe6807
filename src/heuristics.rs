//! Generic DOM heuristics shared by the strategies
//!
//! Finding the element most likely to hold a transcript, the control most likely
//! to reveal one, clicking through custom-element wrappers, and ranking elements
//! by how prominently they sit in the viewport.
use crate::page::{DocumentView, NodeRef, Rect, Viewport};
use crate::transcript::normalize::TIMESTAMP;
use tracing::debug;

/// Transcript toggle labels, matched case-insensitively as substrings
pub const TRANSCRIPT_BUTTON_PATTERNS: [&str; 4] = [
    "show transcript",
    "view transcript",
    "open transcript",
    "transcript",
];

/// Likely transcript containers, most specific first
pub const GENERIC_CONTAINER_SELECTORS: [&str; 10] = [
    "[class*=\"transcript\"]",
    "[class*=\"caption\"]",
    "[class*=\"subtitle\"]",
    "[data-transcript]",
    ".lesson-content",
    ".video-transcript",
    ".course-content",
    "article",
    ".content",
    "main",
];

const BLOCK_FALLBACK_SELECTOR: &str = "div, section";
const CLICKABLE_SELECTOR: &str =
    "a, button, [role=\"button\"], [class*=\"btn\"], [class*=\"button\"]";
const INTERACTIVE_DESCENDANT_SELECTOR: &str = "button, a, [role=\"button\"]";

/// Below this count the block-level fallback scan also runs
const STRONG_TIMESTAMP_COUNT: usize = 5;
/// Minimum timestamps for a container to count as a transcript
const MIN_TIMESTAMP_COUNT: usize = 3;

const VISIBLE_AREA_WEIGHT: f64 = 0.6;
const CENTER_DISTANCE_WEIGHT: f64 = 0.4;

/// Element chosen by `find_best_container`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMatch {
    pub node: NodeRef,
    pub text: String,
    pub timestamp_count: usize,
}

pub fn count_timestamps(text: &str) -> usize {
    TIMESTAMP.find_iter(text).count()
}

/// Click the real control inside a custom-element wrapper.
///
/// Clicks the first `button`, `a` or `role=button` descendant, or the node itself
/// when there is none. Returns whether a node was supplied.
pub fn deep_click(doc: &dyn DocumentView, node: Option<NodeRef>) -> bool {
    let Some(node) = node else {
        return false;
    };

    let target = doc
        .query_first_within(node, INTERACTIVE_DESCENDANT_SELECTOR)
        .unwrap_or(node);
    debug!("Deep click on {:?} via {:?}", node, target);
    doc.click(target);
    true
}

fn visible_text(doc: &dyn DocumentView, node: NodeRef) -> String {
    let text = doc.inner_text(node);
    if text.trim().is_empty() {
        doc.text_content(node)
    } else {
        text
    }
}

fn scan_for_timestamps(
    doc: &dyn DocumentView,
    selector: &str,
    best: &mut Option<ContainerMatch>,
) {
    for node in doc.query_all(selector) {
        let text = visible_text(doc, node);
        let count = count_timestamps(&text);
        let best_count = best.as_ref().map_or(0, |m| m.timestamp_count);
        // Strictly greater, so the first element to reach the maximum wins
        if count > best_count {
            *best = Some(ContainerMatch {
                node,
                text,
                timestamp_count: count,
            });
        }
    }
}

/// Find the element whose text is densest in timestamps.
///
/// Scans `selectors` in priority order; if the best count stays under 5 it also
/// scans every `div` and `section`. The winner must carry at least 3 timestamps.
pub fn find_best_container(doc: &dyn DocumentView, selectors: &[&str]) -> Option<ContainerMatch> {
    let mut best: Option<ContainerMatch> = None;

    for selector in selectors {
        scan_for_timestamps(doc, selector, &mut best);
    }

    if best.as_ref().map_or(0, |m| m.timestamp_count) < STRONG_TIMESTAMP_COUNT {
        scan_for_timestamps(doc, BLOCK_FALLBACK_SELECTOR, &mut best);
    }

    match best {
        Some(found) if found.timestamp_count >= MIN_TIMESTAMP_COUNT => {
            debug!(
                "Best container {:?} has {} timestamps",
                found.node, found.timestamp_count
            );
            Some(found)
        }
        _ => None,
    }
}

/// Find the first visible, enabled clickable whose text, `aria-label` or `title`
/// mentions one of `patterns`
pub fn find_toggle_button(doc: &dyn DocumentView, patterns: &[&str]) -> Option<NodeRef> {
    let matches_any = |value: &str| {
        let value = value.trim().to_lowercase();
        !value.is_empty() && patterns.iter().any(|pattern| value.contains(pattern))
    };

    doc.query_all(CLICKABLE_SELECTOR).into_iter().find(|&node| {
        let labelled = matches_any(&doc.text_content(node))
            || doc.attribute(node, "aria-label").is_some_and(|v| matches_any(&v))
            || doc.attribute(node, "title").is_some_and(|v| matches_any(&v));

        labelled && doc.is_rendered(node) && !doc.is_disabled(node)
    })
}

/// Score how prominently `rect` sits in the viewport, from 0.0 to 1.0.
///
/// Zero when it does not intersect the viewport at all; otherwise 60% visible
/// fraction plus 40% closeness of its center to the viewport center.
pub fn visibility_score(rect: Rect, viewport: Viewport) -> f64 {
    let total_area = rect.area();
    if total_area <= 0.0 || viewport.width <= 0.0 || viewport.height <= 0.0 {
        return 0.0;
    }

    let visible_width = rect.right().min(viewport.width) - rect.x.max(0.0);
    let visible_height = rect.bottom().min(viewport.height) - rect.y.max(0.0);
    if visible_width <= 0.0 || visible_height <= 0.0 {
        return 0.0;
    }

    let visible_ratio = (visible_width * visible_height) / total_area;

    let (cx, cy) = rect.center();
    let (vx, vy) = viewport.as_rect().center();
    let max_distance = vx.hypot(vy);
    let distance = (cx - vx).hypot(cy - vy);
    let normalized_distance = (distance / max_distance).min(1.0);

    let score = VISIBLE_AREA_WEIGHT * visible_ratio
        + CENTER_DISTANCE_WEIGHT * (1.0 - normalized_distance);
    score.clamp(0.0, 1.0)
}

/// `visibility_score` for an element; elements without layout score 0
pub fn element_visibility(doc: &dyn DocumentView, node: NodeRef) -> f64 {
    doc.bounding_box(node)
        .map_or(0.0, |rect| visibility_score(rect, doc.viewport()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::HtmlDocument;

    #[test]
    fn test_visibility_outside_viewport_is_zero() {
        let viewport = Viewport::new(1000.0, 800.0);
        assert_eq!(visibility_score(Rect::new(0.0, 900.0, 400.0, 300.0), viewport), 0.0);
        assert_eq!(visibility_score(Rect::new(-500.0, 0.0, 400.0, 300.0), viewport), 0.0);
        // Touching the edge is not intersecting
        assert_eq!(visibility_score(Rect::new(1000.0, 0.0, 100.0, 100.0), viewport), 0.0);
    }

    #[test]
    fn test_visibility_centered_full_is_one() {
        let viewport = Viewport::new(1000.0, 800.0);
        assert_eq!(visibility_score(Rect::new(0.0, 0.0, 1000.0, 800.0), viewport), 1.0);
        assert_eq!(visibility_score(Rect::new(300.0, 250.0, 400.0, 300.0), viewport), 1.0);
    }

    #[test]
    fn test_visibility_prefers_centered() {
        let viewport = Viewport::new(1000.0, 800.0);
        let centered = visibility_score(Rect::new(300.0, 250.0, 400.0, 300.0), viewport);
        let corner = visibility_score(Rect::new(0.0, 0.0, 400.0, 300.0), viewport);
        let half_off = visibility_score(Rect::new(0.0, 650.0, 400.0, 300.0), viewport);
        assert!(centered > corner);
        assert!(corner > half_off);
        assert!(half_off > 0.0);
    }

    #[test]
    fn test_degenerate_rect_scores_zero() {
        let viewport = Viewport::new(1000.0, 800.0);
        assert_eq!(visibility_score(Rect::new(10.0, 10.0, 0.0, 50.0), viewport), 0.0);
    }

    #[test]
    fn test_best_container_with_six_timestamps() {
        let doc = HtmlDocument::parse(
            r#"<html><body>
            <nav><div>Home 1:00 about</div></nav>
            <div class="lesson-transcript">
                <p>0:01 Welcome</p><p>0:10 Grips</p><p>0:20 Posture</p>
                <p>0:30 Angle</p><p>0:40 Finish</p><p>0:50 Recap</p>
            </div>
            <div class="sidebar">Chapter 2:00 and 3:00</div>
            </body></html>"#,
        );

        let found = find_best_container(&doc, &GENERIC_CONTAINER_SELECTORS).unwrap();
        assert_eq!(found.timestamp_count, 6);
        assert_eq!(found.node, doc.query_first(".lesson-transcript").unwrap());
        assert!(found.text.contains("Welcome"));
    }

    #[test]
    fn test_block_fallback_and_threshold() {
        let doc = HtmlDocument::parse(
            r#"<html><body><section>0:01 a 0:02 b 0:03 c 0:04 d</section></body></html>"#,
        );
        let found = find_best_container(&doc, &[".missing"]).unwrap();
        assert_eq!(doc.tag_name(found.node), "section");

        let sparse = HtmlDocument::parse(r#"<html><body><div>0:01 a 0:02 b</div></body></html>"#);
        assert!(find_best_container(&sparse, &GENERIC_CONTAINER_SELECTORS).is_none());
    }

    #[test]
    fn test_toggle_button_matching() {
        let doc = HtmlDocument::parse(
            r#"<html><body>
            <button hidden>Show transcript</button>
            <button disabled>View Transcript</button>
            <a href="/notes">Notes</a>
            <span class="icon-button" aria-label="Open TRANSCRIPT panel"></span>
            <button>Transcript</button>
            </body></html>"#,
        );
        let found = find_toggle_button(&doc, &TRANSCRIPT_BUTTON_PATTERNS).unwrap();
        assert_eq!(doc.tag_name(found), "span");
    }

    #[test]
    fn test_toggle_button_by_title() {
        let doc = HtmlDocument::parse(
            r#"<html><body><div role="button" title="Transcript"></div></body></html>"#,
        );
        assert!(find_toggle_button(&doc, &TRANSCRIPT_BUTTON_PATTERNS).is_some());
        assert!(find_toggle_button(&doc, &["captions"]).is_none());
    }

    #[test]
    fn test_deep_click_targets_inner_control() {
        let doc = HtmlDocument::parse(
            r#"<html><body><ytd-button-renderer id="w"><div><button id="inner">Go</button></div></ytd-button-renderer>
            <span id="plain">x</span></body></html>"#,
        );
        assert!(deep_click(&doc, doc.query_first("#w")));
        assert!(deep_click(&doc, doc.query_first("#plain")));
        assert!(!deep_click(&doc, None));
        assert_eq!(doc.clicks(), vec!["button#inner".to_string(), "span#plain".to_string()]);
    }
}
