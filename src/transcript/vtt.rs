//! WebVTT caption parsing into plain prose
use regex::Regex;
use std::sync::LazyLock;

/// Cue timing line, e.g. `00:00:01.000 --> 00:00:02.000 align:start`
static CUE_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,2}:)?\d{2}:\d{2}[.,]\d{3}\s+-->\s+(?:\d{1,2}:)?\d{2}:\d{2}[.,]\d{3}")
        .expect("CUE_TIMING regex")
});

/// Bare cue identifier such as `1` or `cue-12`
static CUE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("CUE_IDENTIFIER regex"));

static INLINE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("INLINE_TAG regex"));

const BLOCK_KEYWORDS: [&str; 4] = ["WEBVTT", "NOTE", "STYLE", "REGION"];

const MAX_IDENTIFIER_CHARS: usize = 20;

/// Fold state threaded through the line pass
#[derive(Debug, Default)]
struct VttFold {
    skip_next: bool,
    lines: Vec<String>,
}

impl VttFold {
    fn push_line(mut self, raw: &str) -> Self {
        let line = raw.trim();

        if line.is_empty() {
            self.skip_next = false;
            return self;
        }

        if is_block_header(line) {
            self.skip_next = true;
            return self;
        }

        // Only lines up to the next blank line are suppressed
        if self.skip_next {
            return self;
        }

        if CUE_TIMING.is_match(line) || is_cue_identifier(line) {
            return self;
        }

        let text = decode_entities(&INLINE_TAG.replace_all(line, ""));
        let text = text.trim();
        if !text.is_empty() {
            self.lines.push(text.to_string());
        }
        self
    }
}

/// A keyword only opens a block when it stands alone or is followed by whitespace
fn is_block_header(line: &str) -> bool {
    BLOCK_KEYWORDS.iter().any(|kw| {
        line.strip_prefix(kw)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

fn is_cue_identifier(line: &str) -> bool {
    line.chars().count() < MAX_IDENTIFIER_CHARS
        && CUE_IDENTIFIER.is_match(line)
        && line.chars().any(|c| c.is_ascii_digit())
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Convert a WebVTT payload into caption text joined by single spaces.
///
/// Headers, `NOTE`/`STYLE`/`REGION` blocks, cue identifiers, timing lines and
/// inline markup are dropped. Malformed input never fails; it just yields
/// whatever text lines survive.
pub fn parse_vtt(contents: &str) -> String {
    contents
        .lines()
        .fold(VttFold::default(), VttFold::push_line)
        .lines
        .join(" ")
}
