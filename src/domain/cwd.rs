use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static CWD_LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Current working directory:\s*(.+)").expect("valid cwd line pattern")
});

static CWD_TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<cwd>(.*?)</cwd>").expect("valid cwd tag pattern"));

/// Where a working-directory value was observed. Decides whether it may replace the primary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CwdOrigin {
    /// A `cwd` key somewhere in a record.
    Structural,
    /// A `<cwd>…</cwd>` mention inside message text.
    Tagged,
}

/// Accepts absolute POSIX paths, `~`-relative paths and drive-letter paths (`C:`).
pub fn is_plausible_cwd(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    if value.starts_with('/') || value.starts_with('~') {
        return true;
    }
    let mut chars = value.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TextCwds {
    /// Every plausible candidate from both passes, in match order.
    pub candidates: Vec<String>,
    /// Last plausible `<cwd>` mention in the text.
    pub last_tagged: Option<String>,
}

pub fn extract_text_cwds(text: &str) -> TextCwds {
    let mut out = TextCwds::default();

    for captures in CWD_LINE_PATTERN.captures_iter(text) {
        let Some(found) = captures.get(1) else {
            continue;
        };
        let value = found.as_str().trim();
        if is_plausible_cwd(value) {
            out.candidates.push(value.to_string());
        }
    }

    for captures in CWD_TAG_PATTERN.captures_iter(text) {
        let Some(found) = captures.get(1) else {
            continue;
        };
        let value = found.as_str().trim();
        if is_plausible_cwd(value) {
            out.candidates.push(value.to_string());
            out.last_tagged = Some(value.to_string());
        }
    }

    out
}

/// Collects values of any `cwd` key (case-insensitive) in document order.
///
/// A `cwd` key whose value is not a plausible path is searched like any other value.
pub fn extract_structural_cwds(record: &Map<String, Value>) -> Vec<String> {
    let mut out = Vec::new();
    visit_object(record, &mut out);
    out
}

fn visit_object(map: &Map<String, Value>, out: &mut Vec<String>) {
    for (key, nested) in map {
        if !key.eq_ignore_ascii_case("cwd") {
            visit_value(nested, out);
            continue;
        }
        match nested.as_str().map(str::trim) {
            Some(cleaned) if is_plausible_cwd(cleaned) => out.push(cleaned.to_string()),
            _ => visit_value(nested, out),
        }
    }
}

fn visit_value(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => visit_object(map, out),
        Value::Array(items) => {
            for item in items {
                visit_value(item, out);
            }
        }
        _ => {}
    }
}
