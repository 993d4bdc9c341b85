/// Light punctuation canonicalization used as a lookup fallback.
use once_cell::sync::Lazy;
use regex::Regex;

static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+([,.;:!?])").unwrap());
static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}\u{3000}]+").unwrap());

/// Fold typographic punctuation to ASCII and normalize spacing.
///
/// Smart quotes become straight quotes, the ellipsis character becomes
/// three dots, and whitespace before `, . ; : ! ?` is removed.
pub fn canonical_punctuation(text: &str) -> String {
    let mut s = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => s.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => s.push('"'),
            '\u{2026}' => s.push_str("..."),
            '\u{2013}' | '\u{2014}' => s.push('-'),
            other => s.push(other),
        }
    }

    let s = RE_HORIZONTAL_WS.replace_all(&s, " ");
    let s = RE_SPACE_BEFORE_PUNCT.replace_all(&s, "$1");
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_quotes_and_ellipsis() {
        assert_eq!(
            canonical_punctuation("\u{201C}It\u{2019}s fine\u{2026}\u{201D}"),
            "\"It's fine...\""
        );
    }

    #[test]
    fn space_before_punctuation() {
        assert_eq!(canonical_punctuation("Bonjour !  Ça va ?"), "Bonjour! Ça va?");
    }

    #[test]
    fn newline_preserved() {
        assert_eq!(canonical_punctuation("Hi .\nBye !"), "Hi.\nBye!");
    }

    #[test]
    fn already_canonical_is_unchanged() {
        let text = "Well... I don't know.";
        assert_eq!(canonical_punctuation(text), text);
    }
}
