//! Text normalization and HTML escaping.
//!
//! Every function here is total: it reads the whole buffer and returns a new
//! whole buffer, never failing on any input.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// VARIATION SELECTOR-16 (emoji presentation).
pub const VS16: char = '\u{FE0F}';
/// COMBINING ENCLOSING KEYCAP.
pub const KEYCAP: char = '\u{20E3}';

fn legacy_keycap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9])\x{20E3}").expect("valid legacy keycap regex"))
}

fn list_digit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `^` is start-of-buffer only; later lines are anchored on the newline.
    RE.get_or_init(|| {
        Regex::new(r"(^|\n)([1-9])[.\-、)]?[\s\x{FEFF}]").expect("valid list digit regex")
    })
}

/// Insert U+FE0F between a digit and a bare U+20E3.
///
/// `1⃣` becomes `1️⃣`; sequences that already carry the selector are left
/// alone, so applying this twice is the same as applying it once.
pub fn fix_legacy_keycaps(input: &str) -> String {
    legacy_keycap_re()
        .replace_all(input, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps[1], VS16, KEYCAP)
        })
        .into_owned()
}

/// Turn list-style line prefixes (`1. `, `2、`, `3- `, `4) `, `5 `) into keycaps.
///
/// Only a single digit 1-9 at the start of the buffer or right after a newline
/// is converted; the separator is optional but one whitespace character must
/// follow. The prefix becomes `digit U+FE0F U+20E3` plus a single space.
pub fn list_digits_to_keycap(input: &str) -> String {
    list_digit_re()
        .replace_all(input, |caps: &Captures<'_>| {
            format!("{}{}{}{} ", &caps[1], &caps[2], VS16, KEYCAP)
        })
        .into_owned()
}

/// Escape `&`, `<`, `>` and `"` to named entities; nothing else changes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`escape_html`] on its output.
///
/// Only the four entities produced by the escaper are decoded; any other
/// `&...;` sequence is copied through untouched.
pub fn unescape_html(input: &str) -> String {
    const ENTITIES: [(&str, char); 4] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
    ];
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ENTITIES
            .iter()
            .find(|(entity, _)| tail.starts_with(entity))
        {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_keycap_gains_selector() {
        assert_eq!(fix_legacy_keycaps("1\u{20E3} go"), "1\u{FE0F}\u{20E3} go");
        assert_eq!(
            fix_legacy_keycaps("a0\u{20E3}b9\u{20E3}"),
            "a0\u{FE0F}\u{20E3}b9\u{FE0F}\u{20E3}"
        );
    }

    #[test]
    fn legacy_keycap_repair_is_idempotent() {
        let inputs = [
            "1\u{20E3} go",
            "already 2\u{FE0F}\u{20E3} fine",
            "mixed 3\u{20E3}4\u{FE0F}\u{20E3}\n5\u{20E3}",
            "# and * keycaps stay: #\u{20E3} *\u{20E3}",
            "",
        ];
        for input in inputs {
            let once = fix_legacy_keycaps(input);
            assert_eq!(fix_legacy_keycaps(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn legacy_keycap_ignores_non_digits_and_bare_marks() {
        assert_eq!(fix_legacy_keycaps("#\u{20E3}"), "#\u{20E3}");
        assert_eq!(fix_legacy_keycaps("\u{20E3} alone"), "\u{20E3} alone");
        assert_eq!(fix_legacy_keycaps("plain 123"), "plain 123");
    }

    #[test]
    fn list_prefix_with_each_separator_becomes_keycap() {
        for sep in [".", "-", "、", ")", ""] {
            let input = format!("1{} First", sep);
            assert_eq!(
                list_digits_to_keycap(&input),
                "1\u{FE0F}\u{20E3} First",
                "separator: {:?}",
                sep
            );
        }
    }

    #[test]
    fn list_conversion_applies_per_line() {
        let input = "Intro\n1. One\n2、Two\n3) Three\n4-\tFour";
        // `2、Two` has no whitespace after the separator, so it is left alone.
        let expected =
            "Intro\n1\u{FE0F}\u{20E3} One\n2、Two\n3\u{FE0F}\u{20E3} Three\n4\u{FE0F}\u{20E3} Four";
        assert_eq!(list_digits_to_keycap(input), expected);
    }

    #[test]
    fn list_conversion_skips_zero_and_multi_digit_numbers() {
        assert_eq!(list_digits_to_keycap("0. zero"), "0. zero");
        assert_eq!(list_digits_to_keycap("10. ten"), "10. ten");
        assert_eq!(list_digits_to_keycap("x\n12 dozen"), "x\n12 dozen");
    }

    #[test]
    fn list_conversion_only_touches_line_start() {
        assert_eq!(list_digits_to_keycap("see 1. here"), "see 1. here");
        assert_eq!(
            list_digits_to_keycap("1. a 2. b"),
            "1\u{FE0F}\u{20E3} a 2. b"
        );
    }

    #[test]
    fn list_conversion_consumes_newline_whitespace() {
        // The newline after `1.` is the matched whitespace, so line two has
        // no anchoring newline left and stays as-is.
        assert_eq!(
            list_digits_to_keycap("1.\n2. b"),
            "1\u{FE0F}\u{20E3} 2. b"
        );
    }

    #[test]
    fn escape_replaces_only_the_four_characters() {
        assert_eq!(escape_html("<b>&hi</b>"), "&lt;b&gt;&amp;hi&lt;/b&gt;");
        assert_eq!(escape_html("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape_html("it's 😀 fine"), "it's 😀 fine");
    }

    #[test]
    fn unescape_recovers_escaped_text() {
        let samples = [
            "<b>&hi</b>",
            "&amp; literally",
            "quote \" and 1\u{FE0F}\u{20E3}",
            "&lt;already&gt;",
        ];
        for sample in samples {
            assert_eq!(unescape_html(&escape_html(sample)), sample);
        }
        assert_eq!(unescape_html("&nbsp;&"), "&nbsp;&");
    }
}
