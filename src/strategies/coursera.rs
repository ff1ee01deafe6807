//! Coursera lectures: caption tracks on the video element, sidebar transcript as backup
use super::{FallbackChain, Platform, Strategy};
use crate::context::ExtractionContext;
use crate::fetch::fetch_text;
use crate::outcome::{Outcome, StatusEvent};
use crate::page::{DocumentView, NodeRef};
use crate::transcript::parse_vtt;
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

const TRACK_SELECTOR: &str = "track";

/// Sidebar transcript containers, most specific first
const SIDEBAR_SELECTORS: [&str; 4] = [
    ".rc-Transcript",
    "[data-testid=\"interactive-transcript\"]",
    ".transcript-container",
    "[class*=\"transcript\"]",
];

const PHRASE_SELECTOR: &str = ".rc-Phrase, [data-testid=\"phrase\"]";

/// A caption track discovered in the page markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrackDescriptor {
    pub src: Url,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CourseraStrategy;

impl CourseraStrategy {
    fn is_text_track(doc: &dyn DocumentView, node: NodeRef) -> bool {
        match doc.attribute(node, "kind") {
            Some(kind) => {
                let kind = kind.to_ascii_lowercase();
                kind == "captions" || kind == "subtitles"
            }
            None => true,
        }
    }

    /// Pick a track: `en-US`, then `en`, then a default or labelled one, then the first
    pub fn select_track(ctx: &ExtractionContext<'_>) -> Option<CaptionTrackDescriptor> {
        let doc = ctx.document();
        let tracks: Vec<NodeRef> = doc
            .query_all(TRACK_SELECTOR)
            .into_iter()
            .filter(|&node| Self::is_text_track(doc, node))
            .filter(|&node| doc.attribute(node, "src").is_some_and(|s| !s.trim().is_empty()))
            .collect();

        let with_lang = |lang: &str| {
            tracks.iter().copied().find(|&node| {
                doc.attribute(node, "srclang")
                    .is_some_and(|value| value.eq_ignore_ascii_case(lang))
            })
        };

        let chosen = with_lang("en-US")
            .or_else(|| with_lang("en"))
            .or_else(|| {
                tracks.iter().copied().find(|&node| {
                    doc.attribute(node, "default").is_some() || doc.attribute(node, "label").is_some()
                })
            })
            .or_else(|| tracks.first().copied())?;

        let src = doc.attribute(chosen, "src")?;
        let src = ctx.resolve(src.trim())?;
        Some(CaptionTrackDescriptor {
            src,
            language: doc.attribute(chosen, "srclang"),
        })
    }

    /// Longest sidebar text from the first selector that matches anything with text
    fn read_sidebar(doc: &dyn DocumentView) -> Option<String> {
        for selector in SIDEBAR_SELECTORS {
            let best = doc
                .query_all(selector)
                .into_iter()
                .map(|node| {
                    let phrases = doc.query_within(node, PHRASE_SELECTOR);
                    if phrases.is_empty() {
                        doc.inner_text(node)
                    } else {
                        super::join_node_text(doc, &phrases).unwrap_or_default()
                    }
                })
                .filter(|text| !text.trim().is_empty())
                .max_by_key(|text| text.len());

            if best.is_some() {
                debug!("Sidebar transcript matched {}", selector);
                return best;
            }
        }
        None
    }
}

#[async_trait(?Send)]
impl Strategy for CourseraStrategy {
    fn platform(&self) -> Platform {
        Platform::Coursera
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> Outcome {
        let doc = ctx.document();
        let mut chain = FallbackChain::default();

        // Stage 1: caption track
        match Self::select_track(ctx) {
            Some(track) => {
                info!("🎞️ Caption track {} ({:?})", track.src, track.language);
                ctx.emit_status(StatusEvent::FETCHING_CAPTIONS);
                match fetch_text(ctx.fetcher(), &track.src).await {
                    Ok(body) => {
                        let captions = parse_vtt(&body);
                        if let Some(text) = chain.accept(ctx, "caption track", &captions) {
                            info!("✅ Transcript from caption track");
                            return Outcome::Transcript(text);
                        }
                    }
                    Err(e) => chain.record_network("caption track", &e),
                }
            }
            None => debug!("No caption track on the page"),
        }

        // Stage 2: visible sidebar transcript
        if let Some(raw) = Self::read_sidebar(doc) {
            if let Some(text) = chain.accept(ctx, "sidebar transcript", &raw) {
                info!("✅ Transcript from sidebar");
                return Outcome::Transcript(text);
            }
        }

        chain.into_outcome("no caption track or sidebar transcript found")
    }
}
