//! Platform detection and the single extraction entry point
use crate::context::ExtractionContext;
use crate::outcome::Outcome;
use crate::strategies::{create_strategy, wistia::WIDGET_SIGNATURE, Platform};
use tracing::{debug, info};

/// Hostname fragments, checked in priority order
const HOST_SIGNATURES: [(&str, Platform); 3] = [
    ("youtube.com", Platform::YouTube),
    ("udemy.com", Platform::Udemy),
    ("coursera.org", Platform::Coursera),
];

/// Pick the strategy for the current page.
///
/// Hostname wins over DOM signature, so a YouTube page that happens to embed a
/// Wistia player is still handled as YouTube.
pub fn detect_platform(ctx: &ExtractionContext<'_>) -> Platform {
    let hostname = ctx.hostname();
    if let Some((_, platform)) = HOST_SIGNATURES
        .iter()
        .find(|(signature, _)| hostname.contains(signature))
    {
        return *platform;
    }

    if ctx.document().query_first(WIDGET_SIGNATURE).is_some() {
        debug!("Wistia widget signature present on {}", hostname);
        return Platform::Wistia;
    }

    Platform::Generic
}

/// Run the matching strategy to completion. Always yields an `Outcome`.
pub async fn extract(ctx: &ExtractionContext<'_>) -> Outcome {
    let platform = detect_platform(ctx);
    info!("🎯 Using {} strategy for {}", platform, ctx.page_url());

    let strategy = create_strategy(platform);
    let outcome = strategy.extract(ctx).await;

    match &outcome {
        Outcome::Transcript(text) => info!("✅ {} transcript: {} chars", platform, text.len()),
        Outcome::Error(failure) => info!("❌ {} extraction failed: {}", platform, failure),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, FetchResponse, HttpFetcher};
    use crate::page::{HtmlDocument, RecordingClock};
    use async_trait::async_trait;
    use url::Url;

    struct NoNetwork;

    #[async_trait(?Send)]
    impl HttpFetcher for NoNetwork {
        async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
            Err(FetchError::Transport {
                url: url.to_string(),
                message: "offline".into(),
            })
        }
    }

    fn detect(url: &str, html: &str) -> Platform {
        let doc = HtmlDocument::parse(html);
        let clock = RecordingClock::new();
        let ctx = ExtractionContext::new(Url::parse(url).unwrap(), &doc, &NoNetwork, &clock);
        detect_platform(&ctx)
    }

    #[test]
    fn test_hostnames() {
        let empty = "<html><body></body></html>";
        assert_eq!(detect("https://www.youtube.com/watch?v=x", empty), Platform::YouTube);
        assert_eq!(detect("https://www.udemy.com/course/x/learn", empty), Platform::Udemy);
        assert_eq!(detect("https://www.coursera.org/learn/x", empty), Platform::Coursera);
        assert_eq!(detect("https://WWW.YOUTUBE.COM/watch", empty), Platform::YouTube);
        assert_eq!(detect("https://blog.example.com/post", empty), Platform::Generic);
    }

    #[test]
    fn test_widget_signature_and_priority() {
        let embed = r#"<html><body><iframe src="https://fast.wistia.net/embed/iframe/abc123defg"></iframe></body></html>"#;
        assert_eq!(detect("https://academy.example.com/lesson", embed), Platform::Wistia);
        assert_eq!(detect("https://www.youtube.com/watch?v=x", embed), Platform::YouTube);

        let player = "<html><body><wistia-player media-id=\"abc123defg\"></wistia-player></body></html>";
        assert_eq!(detect("https://academy.example.com/lesson", player), Platform::Wistia);
    }
}
