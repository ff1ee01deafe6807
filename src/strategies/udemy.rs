//! Udemy lecture transcript: a sidebar panel opened by a single toggle
use super::{join_node_text, Platform, Strategy};
use crate::context::ExtractionContext;
use crate::heuristics::{deep_click, find_toggle_button, TRANSCRIPT_BUTTON_PATTERNS};
use crate::outcome::{ErrorReason, Outcome, StatusEvent};
use crate::page::DocumentView;
use crate::transcript::normalize;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Wait after clicking the toggle before the first re-check
pub const TOGGLE_DELAY: Duration = Duration::from_millis(400);

/// Extra wait before the single retry
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

const TOGGLE_SELECTOR: &str = "button[data-purpose=\"transcript-toggle\"]";
const PANEL_SELECTOR: &str = "[data-purpose=\"transcript-panel\"]";
const CUE_SELECTOR: &str = "[data-purpose=\"cue-text\"]";

#[derive(Debug, Clone, Copy, Default)]
pub struct UdemyStrategy;

impl UdemyStrategy {
    /// Joined cue text, scoped to the transcript panel when one exists
    pub fn read_cues(doc: &dyn DocumentView) -> Option<String> {
        let cues = match doc.query_first(PANEL_SELECTOR) {
            Some(panel) => doc.query_within(panel, CUE_SELECTOR),
            None => doc.query_all(CUE_SELECTOR),
        };
        join_node_text(doc, &cues)
    }

    fn processed_cues(doc: &dyn DocumentView) -> Option<String> {
        Self::read_cues(doc).and_then(|raw| normalize(&raw))
    }
}

#[async_trait(?Send)]
impl Strategy for UdemyStrategy {
    fn platform(&self) -> Platform {
        Platform::Udemy
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> Outcome {
        let doc = ctx.document();

        if let Some(text) = Self::processed_cues(doc) {
            info!("📜 Transcript panel already open");
            return Outcome::Transcript(text);
        }

        let toggle = doc
            .query_first(TOGGLE_SELECTOR)
            .or_else(|| find_toggle_button(doc, &TRANSCRIPT_BUTTON_PATTERNS));
        let Some(toggle) = toggle else {
            info!("❌ No transcript toggle on this lecture");
            return Outcome::failure(ErrorReason::NotFound, "no transcript toggle found");
        };

        let expanded = doc
            .attribute(toggle, "aria-expanded")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        let clicked = if expanded {
            debug!("Transcript toggle already expanded");
            false
        } else {
            deep_click(doc, Some(toggle))
        };

        ctx.clock().sleep(TOGGLE_DELAY).await;
        if let Some(text) = Self::processed_cues(doc) {
            return Outcome::Transcript(text);
        }

        if clicked {
            debug!("Captions not rendered yet, retrying once");
            ctx.clock().sleep(RETRY_DELAY).await;
            if let Some(text) = Self::processed_cues(doc) {
                return Outcome::Transcript(text);
            }
        }

        if Self::read_cues(doc).is_some() {
            ctx.emit_status(StatusEvent::APPEARS_EMPTY);
        }
        info!("❌ No captions after retry");
        Outcome::failure(ErrorReason::EmptyOrRestricted, "no captions after retry")
    }
}
