//! Per-invocation view of the hosting page
use crate::fetch::HttpFetcher;
use crate::outcome::StatusEvent;
use crate::page::{Clock, DocumentView};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use url::Url;

/// Everything a strategy may read or use while extracting.
///
/// Supplied by the host for one extraction and borrowed, never owned, by the core.
pub struct ExtractionContext<'a> {
    page_url: Url,
    document: &'a dyn DocumentView,
    fetcher: &'a dyn HttpFetcher,
    clock: &'a dyn Clock,
    status: Option<UnboundedSender<StatusEvent>>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(
        page_url: Url,
        document: &'a dyn DocumentView,
        fetcher: &'a dyn HttpFetcher,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            page_url,
            document,
            fetcher,
            clock,
            status: None,
        }
    }

    /// Attach a progress channel
    pub fn with_status(mut self, sender: UnboundedSender<StatusEvent>) -> Self {
        self.status = Some(sender);
        self
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    /// Lower-case hostname, empty for host-less URLs
    pub fn hostname(&self) -> String {
        self.page_url
            .host_str()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }

    pub fn document(&self) -> &'a dyn DocumentView {
        self.document
    }

    pub fn fetcher(&self) -> &'a dyn HttpFetcher {
        self.fetcher
    }

    pub fn clock(&self) -> &'a dyn Clock {
        self.clock
    }

    /// Resolve a possibly relative reference against the page URL
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        self.page_url.join(reference).ok()
    }

    /// Fire-and-forget progress notification
    pub fn emit_status(&self, message: &str) {
        debug!("Status: {}", message);
        if let Some(sender) = &self.status {
            // A closed channel just means nobody is listening
            let _ = sender.send(StatusEvent::new(message));
        }
    }
}
