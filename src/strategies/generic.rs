//! Fallback for unrecognized sites: timestamp-dense containers and transcript toggles
use super::{FallbackChain, Platform, Strategy};
use crate::context::ExtractionContext;
use crate::heuristics::{
    deep_click, find_best_container, find_toggle_button, GENERIC_CONTAINER_SELECTORS,
    TRANSCRIPT_BUTTON_PATTERNS,
};
use crate::outcome::Outcome;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Wait after clicking a toggle before scanning again
pub const WAIT_AFTER_CLICK: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericStrategy;

impl GenericStrategy {
    fn scan(ctx: &ExtractionContext<'_>, chain: &mut FallbackChain, stage: &str) -> Option<String> {
        let found = find_best_container(ctx.document(), &GENERIC_CONTAINER_SELECTORS)?;
        info!(
            "🔎 Container with {} timestamps ({})",
            found.timestamp_count, stage
        );
        chain.accept(ctx, stage, &found.text)
    }
}

#[async_trait(?Send)]
impl Strategy for GenericStrategy {
    fn platform(&self) -> Platform {
        Platform::Generic
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> Outcome {
        let doc = ctx.document();
        let mut chain = FallbackChain::default();

        if let Some(text) = Self::scan(ctx, &mut chain, "transcript container") {
            return Outcome::Transcript(text);
        }

        match find_toggle_button(doc, &TRANSCRIPT_BUTTON_PATTERNS) {
            Some(toggle) => {
                info!("🖱️ Clicking transcript toggle");
                deep_click(doc, Some(toggle));
                ctx.clock().sleep(WAIT_AFTER_CLICK).await;
                if let Some(text) = Self::scan(ctx, &mut chain, "revealed container") {
                    return Outcome::Transcript(text);
                }
            }
            None => debug!("No transcript toggle on the page"),
        }

        chain.into_outcome("no transcript container or toggle found")
    }
}
