//! Normalization of text fields coming from the remote question source.
//!
//! Trivia records arrive percent-encoded. Decoding never
//! fails from the caller's point of view: malformed input is passed through.

use std::borrow::Cow;

/// Label used when a record carries no category.
pub const DEFAULT_CATEGORY: &str = "General";

const ENTERTAINMENT_PREFIX: &str = "entertainment:";

/// Percent-decode `text`, returning it unchanged if any escape is malformed
/// or the decoded bytes are not valid UTF-8.
#[must_use]
pub fn decode(text: &str) -> String {
    match try_decode(text) {
        Some(decoded) => decoded.into_owned(),
        None => {
            log::warn!("failed to decode text field, keeping raw value: {text:?}");
            text.to_owned()
        }
    }
}

fn try_decode(text: &str) -> Option<Cow<'_, str>> {
    if !has_well_formed_escapes(text) {
        return None;
    }
    urlencoding::decode(text).ok()
}

// Every `%` must start a `%XX` hex escape.
fn has_well_formed_escapes(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Build the display label for a category.
///
/// Absent or empty input yields [`DEFAULT_CATEGORY`]. Otherwise the value is
/// decoded and a leading `Entertainment:` (any case, plus following
/// whitespace) is removed. A decode failure also yields the default label.
#[must_use]
pub fn format_category(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|value| !value.is_empty()) else {
        return DEFAULT_CATEGORY.to_owned();
    };

    let Some(decoded) = try_decode(raw) else {
        log::warn!("failed to decode category {raw:?}");
        return DEFAULT_CATEGORY.to_owned();
    };

    strip_entertainment_prefix(&decoded).to_owned()
}

fn strip_entertainment_prefix(label: &str) -> &str {
    match label.get(..ENTERTAINMENT_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(ENTERTAINMENT_PREFIX) => {
            label[ENTERTAINMENT_PREFIX.len()..].trim_start()
        }
        _ => label,
    }
}
