//! Transcript Grabber - lesson transcripts from video pages
//!
//! Detects which video platform a page belongs to, drives that platform's
//! transcript UI or caption sources, and returns cleaned, paragraphed text.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod heuristics;
pub mod host;
pub mod outcome;
pub mod page;
pub mod strategies;
pub mod transcript;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::context::ExtractionContext;
pub use crate::dispatch::{detect_platform, extract};
pub use crate::error::{GrabberError, Result};
pub use crate::fetch::{FetchError, FetchResponse, HttpFetcher, ReqwestFetcher};
pub use crate::outcome::{ErrorReason, Failure, Outcome, StatusEvent};
pub use crate::page::{
    Clock, DocumentView, HtmlDocument, NodeRef, RecordingClock, Rect, TokioClock, Viewport,
};
pub use crate::strategies::{create_strategy, Platform, Strategy};
pub use crate::transcript::{normalize, parse_vtt};
