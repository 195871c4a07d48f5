//! Stripping of `<think>…</think>` reasoning spans from assistant output

use once_cell::sync::Lazy;
use regex::Regex;

static THINK_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-span regex"));

/// Remove every complete `<think>…</think>` span and trim the result.
///
/// Applied to the whole accumulated response on every update, so a span whose
/// closing tag arrives in a later delta disappears retroactively. An opener
/// without its closing tag is left in place; it gets stripped once the close
/// streams in.
pub fn strip_think_tags(text: &str) -> String {
    THINK_SPAN.replace_all(text, "").trim().to_string()
}

/// The prefix of `text` before any unclosed `<think>` opener.
///
/// After [`strip_think_tags`] the only reasoning markup left is an unclosed
/// trailing span; cutting it off gives a display string that only ever grows,
/// which is what append-only renderers (e.g. a terminal) need.
pub fn visible_prefix(text: &str) -> &str {
    match text.find("<think>") {
        Some(pos) => &text[..pos],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_span_is_removed() {
        assert_eq!(strip_think_tags("<think>ignore me</think>visible"), "visible");
    }

    #[test]
    fn stripping_is_retroactive_across_deltas() {
        // Two deltas land as one accumulated string; the result matches the
        // single-delta case exactly.
        let mut accumulated = String::new();
        accumulated.push_str("<think>ignore");
        assert_eq!(strip_think_tags(&accumulated), "<think>ignore");
        accumulated.push_str("me</think>visible");
        assert_eq!(strip_think_tags(&accumulated), "visible");
        assert_eq!(
            strip_think_tags(&accumulated),
            strip_think_tags("<think>ignoreme</think>visible")
        );
    }

    #[test]
    fn stripping_is_idempotent() {
        let once = strip_think_tags("<think>a</think>b<think>c</think>d");
        assert_eq!(once, strip_think_tags(&once));
        assert_eq!(once, "bd");
    }

    #[test]
    fn spans_may_contain_newlines() {
        assert_eq!(strip_think_tags("<think>line one\nline two</think>ok"), "ok");
    }

    #[test]
    fn result_is_trimmed() {
        assert_eq!(strip_think_tags("<think>x</think>\n\nanswer\n"), "answer");
    }

    #[test]
    fn text_without_tags_passes_through() {
        assert_eq!(strip_think_tags("plain answer"), "plain answer");
    }

    #[test]
    fn visible_prefix_cuts_unclosed_opener() {
        assert_eq!(visible_prefix("before<think>reasoning"), "before");
        assert_eq!(visible_prefix("no tags here"), "no tags here");
        assert_eq!(visible_prefix("<think>all hidden"), "");
    }
}
