//! Wistia embeds, which course hosts drop into otherwise unrelated pages
//!
//! There is no UI to drive. The strategy works out which embed the learner is
//! watching, then tries each place a transcript can live: page structured data,
//! the public captions endpoint, rendered transcript widgets, and finally the
//! player's shadow tree.
use super::{structured_data, FallbackChain, Platform, Strategy};
use crate::context::ExtractionContext;
use crate::fetch::fetch_text;
use crate::heuristics::element_visibility;
use crate::outcome::{Outcome, StatusEvent};
use crate::page::{DocumentView, NodeRef};
use crate::transcript::parse_vtt;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

/// Any of these anywhere in the DOM means a Wistia player is embedded
pub const WIDGET_SIGNATURE: &str = "iframe[src*=\"wistia\"], [class*=\"wistia_async_\"], [class*=\"wistia_embed\"], wistia-player, script[src*=\"wistia\"]";

/// Public captions endpoint, templated by media id
pub const CAPTIONS_ENDPOINT: &str = "https://fast.wistia.net/embed/captions/";

const EMBED_SELECTOR: &str = "iframe[src*=\"wistia\"], [class*=\"wistia_async_\"], [class*=\"wistia_embed_\"], wistia-player[media-id]";

const DOM_TRANSCRIPT_SELECTORS: [&str; 5] = [
    ".w-transcript",
    ".wistia-transcript",
    "[class*=\"wistia_transcript\"]",
    "[data-wistia-transcript]",
    "[class*=\"w-transcript\"]",
];

const SHADOW_HOST_SELECTOR: &str = "wistia-player, .wistia_embed, [class*=\"wistia_async_\"]";
const SHADOW_TRANSCRIPT_SELECTOR: &str =
    "[class*=\"transcript\"], [part*=\"transcript\"], [class*=\"w-caption\"]";

/// Media ids are exactly ten alphanumerics
static IFRAME_MEDIA_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"wistia\.(?:com|net)/embed/(?:iframe|medias)/([A-Za-z0-9]{10})(?:[^A-Za-z0-9]|$)")
        .expect("IFRAME_MEDIA_ID regex")
});

static CLASS_MEDIA_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"wistia_(?:async|embed)_([A-Za-z0-9]{10})(?:[^A-Za-z0-9]|$)")
        .expect("CLASS_MEDIA_ID regex")
});

static BARE_MEDIA_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{10}$").expect("BARE_MEDIA_ID regex"));

/// One embed found on the page, scored for on-screen prominence
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityCandidate {
    pub node: NodeRef,
    pub id: String,
    pub score: f64,
}

/// Pull the media id out of an iframe URL, a container class or a player attribute
pub fn media_id(doc: &dyn DocumentView, node: NodeRef) -> Option<String> {
    if let Some(src) = doc.attribute(node, "src") {
        if let Some(caps) = IFRAME_MEDIA_ID.captures(&src) {
            return Some(caps[1].to_string());
        }
    }
    if let Some(caps) = CLASS_MEDIA_ID.captures(&doc.class_name(node)) {
        return Some(caps[1].to_string());
    }
    doc.attribute(node, "media-id")
        .map(|id| id.trim().to_string())
        .filter(|id| BARE_MEDIA_ID.is_match(id))
}

/// Every embed with a recognizable media id, in document order
pub fn find_embed_candidates(doc: &dyn DocumentView) -> Vec<VisibilityCandidate> {
    doc.query_all(EMBED_SELECTOR)
        .into_iter()
        .filter_map(|node| {
            let id = media_id(doc, node)?;
            Some(VisibilityCandidate {
                node,
                score: element_visibility(doc, node),
                id,
            })
        })
        .collect()
}

/// Highest score wins; on a tie the earlier embed is kept
pub fn pick_active_embed(candidates: &[VisibilityCandidate]) -> Option<&VisibilityCandidate> {
    candidates.iter().fold(None, |best: Option<&VisibilityCandidate>, candidate| match best {
        Some(current) if candidate.score <= current.score => Some(current),
        _ => Some(candidate),
    })
}

pub fn captions_url(media_id: &str) -> Option<Url> {
    Url::parse(&format!(
        "{}{}.vtt",
        CAPTIONS_ENDPOINT,
        urlencoding::encode(media_id)
    ))
    .ok()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WistiaStrategy;

impl WistiaStrategy {
    fn scan_transcript_widgets(
        ctx: &ExtractionContext<'_>,
        chain: &mut FallbackChain,
    ) -> Option<String> {
        let doc = ctx.document();
        for selector in DOM_TRANSCRIPT_SELECTORS {
            for node in doc.query_all(selector) {
                let raw = doc.inner_text(node);
                if raw.trim().is_empty() {
                    continue;
                }
                if let Some(text) = chain.accept(ctx, "transcript widget", &raw) {
                    return Some(text);
                }
            }
        }
        None
    }

    fn scan_shadow_trees(ctx: &ExtractionContext<'_>, chain: &mut FallbackChain) -> Option<String> {
        let doc = ctx.document();
        for host in doc.query_all(SHADOW_HOST_SELECTOR) {
            let nodes = doc.query_shadow(host, SHADOW_TRANSCRIPT_SELECTOR);
            if nodes.is_empty() {
                continue;
            }
            let raw = super::join_node_text(doc, &nodes).unwrap_or_default();
            if raw.is_empty() {
                continue;
            }
            if let Some(text) = chain.accept(ctx, "player shadow tree", &raw) {
                return Some(text);
            }
        }
        None
    }
}

#[async_trait(?Send)]
impl Strategy for WistiaStrategy {
    fn platform(&self) -> Platform {
        Platform::Wistia
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> Outcome {
        let doc = ctx.document();
        let mut chain = FallbackChain::default();

        // Stage 1: which embed is the learner watching
        let candidates = find_embed_candidates(doc);
        let video_id = pick_active_embed(&candidates).map(|c| c.id.clone());
        info!(
            "🎬 Found {} Wistia embeds, active media: {}",
            candidates.len(),
            video_id.as_deref().unwrap_or("unknown")
        );

        // Stage 2: structured data
        ctx.emit_status(StatusEvent::CHECKING_STRUCTURED_DATA);
        if let Some(raw) = structured_data::scan_document(doc, video_id.as_deref(), &mut chain) {
            if let Some(text) = chain.accept(ctx, "structured data", &raw) {
                info!("✅ Transcript from structured data");
                return Outcome::Transcript(text);
            }
        }

        // Stage 3: public captions endpoint
        if let Some(url) = video_id.as_deref().and_then(captions_url) {
            ctx.emit_status(StatusEvent::FETCHING_CAPTIONS);
            match fetch_text(ctx.fetcher(), &url).await {
                Ok(body) => {
                    let captions = parse_vtt(&body);
                    if let Some(text) = chain.accept(ctx, "caption file", &captions) {
                        info!("✅ Transcript from captions endpoint");
                        return Outcome::Transcript(text);
                    }
                }
                Err(e) => chain.record_network("caption file", &e),
            }
        } else {
            debug!("No media id, skipping captions endpoint");
        }

        // Stage 4: rendered transcript widgets
        if let Some(text) = Self::scan_transcript_widgets(ctx, &mut chain) {
            info!("✅ Transcript from rendered widget");
            return Outcome::Transcript(text);
        }

        // Stage 5: inside the player's shadow tree
        if let Some(text) = Self::scan_shadow_trees(ctx, &mut chain) {
            info!("✅ Transcript from player shadow tree");
            return Outcome::Transcript(text);
        }

        chain.into_outcome("no Wistia transcript source found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{HtmlDocument, Rect, Viewport};

    #[test]
    fn test_media_id_sources() {
        let doc = HtmlDocument::parse(
            r#"<html><body>
            <iframe id="a" src="https://fast.wistia.net/embed/iframe/abc123defg?videoFoam=true"></iframe>
            <div id="b" class="wistia_embed wistia_async_xyz789uvwq videoFoam=true"></div>
            <wistia-player id="c" media-id="lmn456opqr"></wistia-player>
            <iframe id="d" src="https://fast.wistia.net/embed/iframe/tooshort"></iframe>
            </body></html>"#,
        );
        let id = |sel: &str| media_id(&doc, doc.query_first(sel).unwrap());
        assert_eq!(id("#a").as_deref(), Some("abc123defg"));
        assert_eq!(id("#b").as_deref(), Some("xyz789uvwq"));
        assert_eq!(id("#c").as_deref(), Some("lmn456opqr"));
        assert_eq!(id("#d"), None);
    }

    #[test]
    fn test_most_visible_embed_wins() {
        let doc = HtmlDocument::parse(
            r#"<html><body>
            <div id="top" class="wistia_embed wistia_async_aaaaaaaaa1"></div>
            <div id="mid" class="wistia_embed wistia_async_bbbbbbbbb2"></div>
            <div id="off" class="wistia_embed wistia_async_ccccccccc3"></div>
            </body></html>"#,
        )
        .with_viewport(Viewport::new(1000.0, 800.0))
        .with_layout("#top", Rect::new(0.0, -250.0, 600.0, 300.0))
        .with_layout("#mid", Rect::new(200.0, 250.0, 600.0, 300.0))
        .with_layout("#off", Rect::new(200.0, 1200.0, 600.0, 300.0));

        let candidates = find_embed_candidates(&doc);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[2].score, 0.0);
        assert_eq!(pick_active_embed(&candidates).unwrap().id, "bbbbbbbbb2");
    }

    #[test]
    fn test_tie_keeps_first() {
        let candidates = vec![
            VisibilityCandidate { node: NodeRef(1), id: "first00001".into(), score: 0.0 },
            VisibilityCandidate { node: NodeRef(2), id: "second0002".into(), score: 0.0 },
        ];
        assert_eq!(pick_active_embed(&candidates).unwrap().id, "first00001");
        assert!(pick_active_embed(&[]).is_none());
    }

    #[test]
    fn test_captions_url_template() {
        assert_eq!(
            captions_url("abc123defg").unwrap().as_str(),
            "https://fast.wistia.net/embed/captions/abc123defg.vtt"
        );
    }
}
