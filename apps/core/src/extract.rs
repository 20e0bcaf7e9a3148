//! Turns raw clipboard text into a [`SearchToken`].
//!
//! The pipeline runs in a fixed order: first-line cut, host blocklist, host
//! specific rules (first marker hit wins), trailing slash, URL segment
//! isolation, extension stripping. Each stage works on the output of the
//! previous one.

use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::model::SearchToken;

pub const MAX_CLIPBOARD_CHARS: usize = 200;
pub const MIN_TOKEN_CHARS: usize = 4;

const BLOCKED_HOSTS: [&str; 1] = ["mega.nz"];

const KNOWN_EXTENSIONS: [&str; 12] = [
    "mp4", "webm", "avi", "mov", "mkv", "zip", "rar", "7z", "gif", "jpeg", "jpg", "png",
];

struct HostRule {
    name: &'static str,
    marker: &'static str,
    apply: fn(&str) -> Option<String>,
}

static HOST_RULES: [HostRule; 3] = [
    HostRule {
        name: "twimg-media",
        marker: "twimg.com/media",
        apply: twimg_media_id,
    },
    HostRule {
        name: "tumblr-redirect",
        marker: "t.umblr.com/redirect",
        apply: tumblr_redirect_target,
    },
    HostRule {
        name: "tumblr",
        marker: "tumblr",
        apply: tumblr_file_prefix,
    },
];

/// Returns the search token for `raw`, or `None` when the text is rejected.
pub fn extract(raw: &str) -> Option<SearchToken> {
    if raw.chars().count() > MAX_CLIPBOARD_CHARS {
        return None;
    }

    let line = first_line(raw);
    if char_len(line) < MIN_TOKEN_CHARS {
        return None;
    }

    let lowered = line.to_ascii_lowercase();
    if BLOCKED_HOSTS.iter().any(|host| lowered.contains(host)) {
        return None;
    }

    let mut working = apply_host_rules(line, &lowered);

    if working.ends_with('/') {
        working.pop();
    }

    if has_http_scheme(&working) {
        working = url_subject(&working);
    }

    let mut token = final_segment(&working).to_string();
    while let Some(stem) = strip_known_extension(&token) {
        token = final_segment(&percent_decode(stem)).to_string();
    }

    if char_len(&token) < MIN_TOKEN_CHARS {
        return None;
    }
    Some(SearchToken::new(token))
}

fn first_line(raw: &str) -> &str {
    let line = raw.split('\n').next().unwrap_or_default();
    line.strip_suffix('\r').unwrap_or(line)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn apply_host_rules(line: &str, lowered: &str) -> String {
    let Some(rule) = HOST_RULES.iter().find(|rule| lowered.contains(rule.marker)) else {
        return line.to_string();
    };

    match (rule.apply)(line) {
        Some(captured) => {
            tracing::trace!(rule = rule.name, %captured, "host rule matched");
            captured
        }
        None => line.to_string(),
    }
}

fn has_http_scheme(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    lowered.contains("http://") || lowered.contains("https://")
}

/// Last path segment of a URL, narrowed to its `?image=` value when present.
fn url_subject(url: &str) -> String {
    let segment = final_segment(url);
    let segment = match segment.rsplit_once("?image=") {
        Some((_, image)) => image,
        None => segment,
    };
    percent_decode_plus(segment)
}

fn final_segment(value: &str) -> &str {
    value.rsplit('/').next().unwrap_or(value)
}

fn strip_known_extension(value: &str) -> Option<&str> {
    let (stem, extension) = value.rsplit_once('.')?;
    KNOWN_EXTENSIONS
        .iter()
        .any(|known| extension.eq_ignore_ascii_case(known))
        .then_some(stem)
}

fn percent_decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

fn percent_decode_plus(value: &str) -> String {
    percent_decode(&value.replace('+', " "))
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("built-in pattern should compile"))
}

fn twimg_media_id(line: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = compiled(&PATTERN, r"(?i)https?://pbs\.twimg\.com/media/(.{15})\?");
    capture(pattern, line)
}

fn tumblr_redirect_target(line: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = compiled(&PATTERN, r"(?i)t\.umblr\.com/redirect\?z=(.*)&t=");
    capture(pattern, line).map(|target| percent_decode(&target))
}

fn tumblr_file_prefix(line: &str) -> Option<String> {
    static FULL_SIZE: OnceLock<Regex> = OnceLock::new();
    static INLINE: OnceLock<Regex> = OnceLock::new();
    // e.g. (tumblr_abcdeo)1_1280.jpg
    let full_size = compiled(&FULL_SIZE, r"(?i)(tumblr_.*o)[1-9]+_.*\.");
    // e.g. (tumblr_inline_abcde)_540.jpg
    let inline = compiled(&INLINE, r"(?i)(tumblr_inline_.+?)_\d{3,4}(?:\.|$)");
    capture(full_size, line).or_else(|| capture(inline, line))
}

fn capture(pattern: &Regex, line: &str) -> Option<String> {
    pattern
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}
