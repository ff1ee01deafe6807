//! Host-provided page capabilities
//!
//! Strategies never touch a browser directly. They query the page through
//! `DocumentView`, wait through `Clock` and fetch through `fetch::HttpFetcher`,
//! so the same logic runs against a live page driver, a saved snapshot or a
//! scripted test fixture.

pub mod html;

pub use html::HtmlDocument;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::time::Duration;

/// Opaque handle to an element, valid until the document next mutates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub usize);

/// Element bounding box in viewport coordinates (CSS pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Visible area of the page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Read access to the page's document tree plus the few interactions strategies need.
///
/// Invalid selectors match nothing. Handles from before a mutation must be
/// re-queried.
#[async_trait(?Send)]
pub trait DocumentView {
    /// All elements matching `selector`, in document order
    fn query_all(&self, selector: &str) -> Vec<NodeRef>;

    /// Descendants of `scope` (not `scope` itself) matching `selector`
    fn query_within(&self, scope: NodeRef, selector: &str) -> Vec<NodeRef>;

    /// Elements matching `selector` inside shadow trees attached under `host`
    fn query_shadow(&self, host: NodeRef, selector: &str) -> Vec<NodeRef>;

    /// Raw text of every descendant text node, like `textContent`
    fn text_content(&self, node: NodeRef) -> String;

    /// Rendered text with line breaks around block elements, like `innerText`
    fn inner_text(&self, node: NodeRef) -> String;

    fn attribute(&self, node: NodeRef, name: &str) -> Option<String>;

    /// Lower-case tag name
    fn tag_name(&self, node: NodeRef) -> String;

    /// Whether the element takes part in layout (the `offsetParent !== null` check)
    fn is_rendered(&self, node: NodeRef) -> bool;

    /// Layout box, if the host knows one
    fn bounding_box(&self, node: NodeRef) -> Option<Rect>;

    fn viewport(&self) -> Viewport;

    /// Dispatch a click on the element
    fn click(&self, node: NodeRef);

    /// Resolves at the next change to the document tree
    async fn mutated(&self);

    fn query_first(&self, selector: &str) -> Option<NodeRef> {
        self.query_all(selector).into_iter().next()
    }

    fn query_first_within(&self, scope: NodeRef, selector: &str) -> Option<NodeRef> {
        self.query_within(scope, selector).into_iter().next()
    }

    fn class_name(&self, node: NodeRef) -> String {
        self.attribute(node, "class").unwrap_or_default()
    }

    fn is_disabled(&self, node: NodeRef) -> bool {
        self.attribute(node, "disabled").is_some()
            || self
                .attribute(node, "aria-disabled")
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

/// Timer capability
#[async_trait(?Send)]
pub trait Clock {
    async fn sleep(&self, duration: Duration);
}

/// Real timers backed by the tokio runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait(?Send)]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock that returns immediately and remembers every requested delay
#[derive(Debug, Default)]
pub struct RecordingClock {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    /// Total virtual time elapsed
    pub fn elapsed(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

#[async_trait(?Send)]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        tokio::task::yield_now().await;
    }
}
