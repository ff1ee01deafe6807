//! Per-platform transcript extraction strategies
//!
//! Each strategy is a short-lived state machine: check whether the transcript is
//! already rendered, trigger whatever UI reveals it, wait for it to appear, then
//! normalize. Every failure is folded into one `Outcome` at the strategy boundary.

pub mod coursera;
pub mod generic;
pub mod structured_data;
pub mod udemy;
pub mod wistia;
pub mod youtube;

pub use coursera::{CaptionTrackDescriptor, CourseraStrategy};
pub use generic::GenericStrategy;
pub use udemy::UdemyStrategy;
pub use wistia::{VisibilityCandidate, WistiaStrategy};
pub use youtube::YouTubeStrategy;

use crate::context::ExtractionContext;
use crate::fetch::FetchError;
use crate::outcome::{ErrorReason, Outcome, StatusEvent};
use crate::transcript::normalize;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Supported platforms, in dispatch priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    Udemy,
    Coursera,
    Wistia,
    Generic,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::YouTube => "YouTube",
            Platform::Udemy => "Udemy",
            Platform::Coursera => "Coursera",
            Platform::Wistia => "Wistia",
            Platform::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Trait for platform extraction strategies
#[async_trait(?Send)]
pub trait Strategy {
    fn platform(&self) -> Platform;

    /// Run the strategy to completion. Never panics and never returns early
    /// with side effects still pending.
    async fn extract(&self, ctx: &ExtractionContext<'_>) -> Outcome;
}

/// Create the strategy for a platform
pub fn create_strategy(platform: Platform) -> Box<dyn Strategy> {
    match platform {
        Platform::YouTube => Box::new(YouTubeStrategy),
        Platform::Udemy => Box::new(UdemyStrategy),
        Platform::Coursera => Box::new(CourseraStrategy),
        Platform::Wistia => Box::new(WistiaStrategy),
        Platform::Generic => Box::new(GenericStrategy),
    }
}

/// What went wrong in the stages tried so far
#[derive(Debug, Default)]
pub(crate) struct FallbackChain {
    empty_sources: Vec<String>,
    network_failures: Vec<String>,
}

impl FallbackChain {
    /// A source was found but its text is too short
    pub(crate) fn record_empty(&mut self, ctx: &ExtractionContext<'_>, stage: &str) {
        warn!("⚠️ {} found but too short to be a transcript", stage);
        if self.empty_sources.is_empty() {
            ctx.emit_status(StatusEvent::APPEARS_EMPTY);
        }
        self.empty_sources.push(stage.to_string());
    }

    pub(crate) fn record_network(&mut self, stage: &str, error: &FetchError) {
        warn!("🌐 {} unavailable: {}", stage, error);
        self.network_failures.push(format!("{}: {}", stage, error));
    }

    /// Malformed structured data is skipped, never reported as the final reason
    pub(crate) fn record_malformed(&mut self, stage: &str, error: &serde_json::Error) {
        warn!("Skipping malformed {} ({:?}): {}", stage, ErrorReason::MalformedData, error);
    }

    /// Normalize `raw`; a too-short result is recorded against `stage`
    pub(crate) fn accept(
        &mut self,
        ctx: &ExtractionContext<'_>,
        stage: &str,
        raw: &str,
    ) -> Option<String> {
        match normalize(raw) {
            Some(text) => {
                debug!("{} produced {} chars of transcript", stage, text.len());
                Some(text)
            }
            None => {
                self.record_empty(ctx, stage);
                None
            }
        }
    }

    /// Final failure once every stage is exhausted
    pub(crate) fn into_outcome(self, not_found_detail: &str) -> Outcome {
        if !self.empty_sources.is_empty() {
            return Outcome::failure(
                ErrorReason::EmptyOrRestricted,
                format!("{} found but empty", self.empty_sources.join(", ")),
            );
        }
        if !self.network_failures.is_empty() {
            return Outcome::failure(ErrorReason::NetworkFailure, self.network_failures.join("; "));
        }
        Outcome::failure(ErrorReason::NotFound, not_found_detail)
    }
}

/// Trimmed text of each node, empty ones dropped, joined with spaces
pub(crate) fn join_node_text(
    doc: &dyn crate::page::DocumentView,
    nodes: &[crate::page::NodeRef],
) -> Option<String> {
    let joined = nodes
        .iter()
        .map(|&node| doc.text_content(node).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_matches_platform() {
        for platform in [
            Platform::YouTube,
            Platform::Udemy,
            Platform::Coursera,
            Platform::Wistia,
            Platform::Generic,
        ] {
            assert_eq!(create_strategy(platform).platform(), platform);
        }
    }

    #[test]
    fn test_chain_precedence() {
        let chain = FallbackChain::default();
        assert_eq!(chain.into_outcome("nothing").reason(), Some(ErrorReason::NotFound));

        let mut chain = FallbackChain::default();
        chain.record_network(
            "captions",
            &FetchError::Status {
                url: "https://x/y.vtt".into(),
                status: 404,
            },
        );
        assert_eq!(chain.into_outcome("nothing").reason(), Some(ErrorReason::NetworkFailure));
    }

    #[test]
    fn test_platform_serde_names() {
        assert_eq!(serde_json::to_string(&Platform::YouTube).unwrap(), "\"youtube\"");
        assert_eq!(Platform::Generic.to_string(), "generic");
    }
}
