//! Mention text normalization.
//!
//! Canonicalizes raw mention strings into comparable form: Unicode NFC
//! composition, invisible-character stripping, whitespace collapsing,
//! lowercasing, and trailing-noise trimming. Everything here is pure and
//! deterministic: identical input always yields identical output,
//! independent of call order.

use unicode_normalization::UnicodeNormalization;

/// Zero-width and directional format characters that never carry meaning
/// in a mention. Stripped before any other processing.
fn is_invisible(ch: char) -> bool {
    matches!(
        ch,
        '\u{200B}' // zero width space
            | '\u{200C}' // zero width non-joiner
            | '\u{200D}' // zero width joiner
            | '\u{200E}' // left-to-right mark
            | '\u{200F}' // right-to-left mark
            | '\u{2060}' // word joiner
            | '\u{FEFF}' // byte order mark
            | '\u{00AD}' // soft hyphen
    ) || ch.is_control()
}

/// Punctuation and symbols that are noise at the end of a mention.
///
/// Internal punctuation is never touched; hyphenated compounds like
/// "Ward-1" keep their hyphen because trimming only runs at the tail.
fn is_trailing_noise(ch: char) -> bool {
    ch.is_ascii_punctuation()
        || matches!(
            ch,
            '।' | '॥'
                | '…'
                | '—'
                | '–'
                | '·'
                | '•'
                | '«'
                | '»'
                | '“'
                | '”'
                | '‘'
                | '’'
                | '‚'
                | '„'
                | '‹'
                | '›'
                | '¡'
                | '¿'
                | '؟'
                | '،'
                | '。'
                | '、'
                | '，'
                | '！'
                | '？'
                | '：'
                | '；'
                | '～'
                | '＊'
                | '＃'
        )
}

/// Normalize a raw mention string into canonical comparable form.
///
/// Steps, in order:
/// 1. Unicode NFC composition (equivalent sequences compare equal)
/// 2. Strip zero-width/control characters
/// 3. Map all whitespace to plain spaces and collapse runs
/// 4. Unicode lowercase
/// 5. Trim trailing punctuation/symbol noise
///
/// Empty and all-whitespace input normalize to the empty string, which
/// downstream treats as "no mention".
///
/// # Examples
///
/// ```
/// use kosh_core::normalize::normalize;
///
/// assert_eq!(normalize("  Raigarh\u{200B} District!!! "), "raigarh district");
/// assert_eq!(normalize("Ward-1"), "ward-1");
/// assert_eq!(normalize("   "), "");
/// ```
pub fn normalize(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for ch in raw.nfc() {
        if is_invisible(ch) {
            continue;
        }
        if ch.is_whitespace() {
            cleaned.push(' ');
            continue;
        }
        for lower in ch.to_lowercase() {
            cleaned.push(lower);
        }
    }

    let mut collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    while let Some(last) = collapsed.chars().next_back() {
        if is_trailing_noise(last) || last == ' ' {
            collapsed.truncate(collapsed.len() - last.len_utf8());
        } else {
            break;
        }
    }

    collapsed
}

/// Normalize a single token into its matching-key form.
///
/// Stricter than [`normalize`]: every non-alphanumeric character becomes a
/// space before collapsing, so "Ward-1" and "ward 1" produce the same key.
/// Display text keeps the original token; only matching and deduplication
/// use this form.
///
/// # Examples
///
/// ```
/// use kosh_core::normalize::normalize_token;
///
/// assert_eq!(normalize_token("Ward-1"), "ward 1");
/// assert_eq!(normalize_token("ward 1"), "ward 1");
/// ```
pub fn normalize_token(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for ch in raw.nfc() {
        if is_invisible(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                cleaned.push(lower);
            }
        } else {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when a string normalizes to nothing — i.e. carries no mention.
pub fn is_blank(raw: &str) -> bool {
    raw.chars().all(|ch| ch.is_whitespace() || is_invisible(ch))
}
