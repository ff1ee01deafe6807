//! YouTube transcript panel scraper
use super::{FallbackChain, Platform, Strategy};
use crate::context::ExtractionContext;
use crate::heuristics::deep_click;
use crate::outcome::Outcome;
use crate::page::{DocumentView, NodeRef};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hard ceiling on waiting for the transcript panel to populate
pub const OBSERVER_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Pause between opening the overflow menu and picking its item
pub const MENU_DELAY: Duration = Duration::from_millis(200);

const PANEL_SELECTOR: &str = "ytd-engagement-panel-section-list-renderer[target-id=\"engagement-panel-searchable-transcript\"], ytd-transcript-renderer";
const SEGMENT_SELECTOR: &str = "ytd-transcript-segment-renderer";
const SEGMENT_TEXT_SELECTOR: &str = ".segment-text, yt-formatted-string:not(.segment-timestamp)";
const DESCRIPTION_BUTTON_SELECTOR: &str =
    "ytd-video-description-transcript-section-renderer ytd-button-renderer";
const EXPAND_SELECTOR: &str = "#expand, tp-yt-paper-button#expand";
const MORE_ACTIONS_SELECTOR: &str = "ytd-menu-renderer button[aria-label=\"More actions\"], #button-shape button[aria-label=\"More actions\"]";
const MENU_ITEM_SELECTOR: &str = "ytd-menu-service-item-renderer, tp-yt-paper-item";
const ANY_BUTTON_SELECTOR: &str = "button, ytd-button-renderer, tp-yt-paper-button";

/// Which control ended up being used to open the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealMethod {
    DescriptionButton,
    ExpandedDescription,
    OverflowMenu,
    DirectButton,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YouTubeStrategy;

impl YouTubeStrategy {
    /// Text of every rendered transcript segment, joined with spaces
    pub fn read_segments(doc: &dyn DocumentView) -> Option<String> {
        let panel = doc.query_first(PANEL_SELECTOR)?;
        let segments = doc.query_within(panel, SEGMENT_SELECTOR);
        if segments.is_empty() {
            return None;
        }

        let lines: Vec<String> = segments
            .into_iter()
            .filter_map(|segment| doc.query_first_within(segment, SEGMENT_TEXT_SELECTOR))
            .map(|text_node| doc.text_content(text_node).trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        (!lines.is_empty()).then(|| lines.join(" "))
    }

    fn find_description_button(doc: &dyn DocumentView) -> Option<NodeRef> {
        doc.query_all(DESCRIPTION_BUTTON_SELECTOR)
            .into_iter()
            .find(|&button| doc.text_content(button).to_lowercase().contains("transcript"))
    }

    /// Try each way of opening the transcript panel, most direct first
    async fn reveal(&self, ctx: &ExtractionContext<'_>) -> Option<RevealMethod> {
        let doc = ctx.document();

        // Method 1: button in the description panel
        if let Some(button) = Self::find_description_button(doc) {
            deep_click(doc, Some(button));
            return Some(RevealMethod::DescriptionButton);
        }

        // Method 2: expand a collapsed description, which exposes method 1
        if let Some(expand) = doc.query_first(EXPAND_SELECTOR) {
            if doc.is_rendered(expand) {
                debug!("Expanding video description");
                deep_click(doc, Some(expand));
                if let Some(button) = Self::find_description_button(doc) {
                    deep_click(doc, Some(button));
                    return Some(RevealMethod::ExpandedDescription);
                }
            }
        }

        // Method 3: "More actions" overflow menu
        if let Some(more_actions) = doc.query_first(MORE_ACTIONS_SELECTOR) {
            deep_click(doc, Some(more_actions));
            ctx.clock().sleep(MENU_DELAY).await;

            let item = doc
                .query_all(MENU_ITEM_SELECTOR)
                .into_iter()
                .find(|&item| doc.text_content(item).to_lowercase().contains("transcript"));
            match item {
                Some(item) => {
                    deep_click(doc, Some(item));
                }
                None => debug!("Overflow menu has no transcript item"),
            }
            return Some(RevealMethod::OverflowMenu);
        }

        // Method 4: any button labelled as the transcript
        let direct = doc.query_all(ANY_BUTTON_SELECTOR).into_iter().find(|&button| {
            let text = doc.text_content(button).trim().to_lowercase();
            text.contains("show transcript") || text == "transcript"
        });
        if let Some(button) = direct {
            deep_click(doc, Some(button));
            return Some(RevealMethod::DirectButton);
        }

        None
    }

    /// Wait for segments to appear, bounded by `OBSERVER_TIMEOUT`
    async fn observe(&self, ctx: &ExtractionContext<'_>) -> Outcome {
        let doc = ctx.document();
        let mut chain = FallbackChain::default();
        let mut deadline = ctx.clock().sleep(OBSERVER_TIMEOUT);

        // The click may already have rendered the panel
        if let Some(raw) = Self::read_segments(doc) {
            return self.finish(ctx, &mut chain, &raw);
        }

        loop {
            tokio::select! {
                biased;
                _ = doc.mutated() => {
                    if let Some(raw) = Self::read_segments(doc) {
                        return self.finish(ctx, &mut chain, &raw);
                    }
                }
                _ = &mut deadline => {
                    warn!("⏰ Transcript panel did not appear within {:?}", OBSERVER_TIMEOUT);
                    return chain.into_outcome("transcript panel did not appear before timeout");
                }
            }
        }
    }

    fn finish(&self, ctx: &ExtractionContext<'_>, chain: &mut FallbackChain, raw: &str) -> Outcome {
        match chain.accept(ctx, "transcript panel", raw) {
            Some(text) => Outcome::Transcript(text),
            None => std::mem::take(chain).into_outcome("transcript panel is empty"),
        }
    }
}

#[async_trait(?Send)]
impl Strategy for YouTubeStrategy {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> Outcome {
        let doc = ctx.document();

        if let Some(existing) = Self::read_segments(doc) {
            if let Some(text) = crate::transcript::normalize(&existing) {
                info!("📜 Transcript panel already open");
                return Outcome::Transcript(text);
            }
        }

        match self.reveal(ctx).await {
            Some(method) => info!("🖱️ Opened transcript panel via {:?}", method),
            None => debug!("No transcript control found, waiting for the panel anyway"),
        }

        self.observe(ctx).await
    }
}
