//! Strips markdown and markup from assistant replies before speech.
//!
//! Output is plain prose: no fences, no inline code, no emphasis markers,
//! no link targets, no tags, newline runs collapsed to one space.

use std::sync::LazyLock;

use regex::Regex;

// Reasoning blocks wrapped in long backtick runs are dropped whole, body
// included. Ordinary triple-backtick reasoning fences fall to FENCE below.
static THINKING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)`{5,}vis-thinking.*?`{5,}").unwrap_or_else(|e| panic!("{e}")));

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap_or_else(|e| panic!("{e}")));

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]*`").unwrap_or_else(|e| panic!("{e}")));

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap_or_else(|e| panic!("{e}")));

static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap_or_else(|e| panic!("{e}")));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap_or_else(|e| panic!("{e}")));

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap_or_else(|e| panic!("{e}")));

// Only newline runs collapse; interior spaces and tabs are kept as-is.
static NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").unwrap_or_else(|e| panic!("{e}")));

/// Reduce a markdown reply to speakable plain text.
///
/// May return an empty string when the input is markup-only; callers skip
/// speech in that case.
pub fn sanitize_for_speech(raw: &str) -> String {
    let text = THINKING_FENCE.replace_all(raw, "");
    let text = FENCE.replace_all(&text, "");
    let text = INLINE_CODE.replace_all(&text, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = TAG.replace_all(&text, "");
    let text = NEWLINES.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(sanitize_for_speech("hello there"), "hello there");
    }

    #[test]
    fn test_emphasis_and_link_keep_display_text() {
        assert_eq!(
            sanitize_for_speech("**Hi** there\n\n\n[link](http://x)"),
            "Hi there link"
        );
    }

    #[test]
    fn test_code_fence_dropped_whole() {
        assert_eq!(
            sanitize_for_speech("before\n```rust\nfn main() {}\n```\nafter"),
            "before after"
        );
    }

    #[test]
    fn test_inline_code_dropped() {
        assert_eq!(sanitize_for_speech("run `cargo doc` now"), "run  now");
    }

    #[test]
    fn test_interior_spaces_and_tabs_are_kept() {
        assert_eq!(sanitize_for_speech("a  b"), "a  b");
        assert_eq!(sanitize_for_speech("a\tb"), "a\tb");
    }

    #[test]
    fn test_empty_link_target_is_left_intact() {
        assert_eq!(sanitize_for_speech("[x]() stays"), "[x]() stays");
    }

    #[test]
    fn test_reasoning_block_dropped_with_body() {
        let raw = "`````vis-thinking\nsecret chain of thought\n`````\nFinal answer";
        assert_eq!(sanitize_for_speech(raw), "Final answer");
    }

    #[test]
    fn test_short_fenced_reasoning_block_also_dropped() {
        let raw = "```vis-thinking\nhidden\n```visible tail";
        assert_eq!(sanitize_for_speech(raw), "visible tail");
    }

    #[test]
    fn test_html_tags_stripped() {
        assert_eq!(sanitize_for_speech("a <b>bold</b> claim"), "a bold claim");
    }

    #[test]
    fn test_italic_keeps_inner_text() {
        assert_eq!(sanitize_for_speech("so *very* nice"), "so very nice");
    }

    #[test]
    fn test_newlines_collapse_to_single_space() {
        assert_eq!(sanitize_for_speech("one\ntwo\n\nthree"), "one two three");
    }

    #[test]
    fn test_markup_only_input_yields_empty() {
        assert_eq!(sanitize_for_speech("```\ncode\n```"), "");
        assert_eq!(sanitize_for_speech("  \n\t "), "");
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let raw = "**Hi** `x` [a](http://b)\n\n<i>c</i>";
        let once = sanitize_for_speech(raw);
        assert_eq!(sanitize_for_speech(&once), once);
    }
}
