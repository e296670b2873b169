//! Markdown stripping for CSV-friendly descriptions.
//!
//! Removes markup while keeping the readable text: link labels, image alt
//! text, code block contents and emphasized words survive.

use regex::Regex;
use std::sync::OnceLock;

/// Ordered `(pattern, replacement)` rules. Order matters: rules and code
/// fences are removed before list bullets and emphasis are handled.
const RULES: &[(&str, &str)] = &[
    // HTML tags
    (r"<[^>\n]+>", ""),
    // Fenced code block delimiters
    (r"(?m)^[ \t]*(?:```|~~~).*\n?", ""),
    // Horizontal rules
    (r"(?m)^[ \t]*(?:[-*_][ \t]*){3,}$", ""),
    // Setext heading underlines
    (r"(?m)^[ \t]*=+[ \t]*$", ""),
    // Reference-style link definitions
    (r"(?m)^[ \t]*\[[^\]\n]*\]:[ \t]*\S.*$", ""),
    // Images
    (r"!\[([^\]\n]*)\]\([^)\n]*\)", "${1}"),
    // Inline links
    (r"\[([^\]\n]*)\]\([^)\n]*\)", "${1}"),
    // ATX headings
    (r"(?m)^[ \t]*#{1,6}[ \t]+", ""),
    (r"(?m)[ \t]+#+[ \t]*$", ""),
    // Blockquotes
    (r"(?m)^[ \t]*(?:>[ \t]?)+", ""),
    // Unordered list bullets
    (r"(?m)^([ \t]*)[*+-][ \t]+", "${1}"),
    // Strong, emphasis, strikethrough
    (r"\*\*([^\n]+?)\*\*", "${1}"),
    (r"__([^\n]+?)__", "${1}"),
    (r"\*([^*\n]+)\*", "${1}"),
    (r"\b_([^_\n]+)_\b", "${1}"),
    (r"~~([^\n]+?)~~", "${1}"),
    // Inline code
    (r"`([^`\n]+)`", "${1}"),
    // Excess blank lines
    (r"\n{3,}", "\n\n"),
];

fn compiled_rules() -> &'static [(Regex, &'static str)] {
    static COMPILED: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|(pattern, replacement)| {
                (
                    Regex::new(pattern).expect("valid markdown rule"),
                    *replacement,
                )
            })
            .collect()
    })
}

/// Strip markdown markup from `text`, returning plain text.
pub fn strip_markdown(text: &str) -> String {
    let mut output = text.replace("\r\n", "\n");
    for (re, replacement) in compiled_rules() {
        output = re.replace_all(&output, *replacement).into_owned();
    }
    output.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_rules_compile() {
        assert_eq!(compiled_rules().len(), RULES.len());
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(
            strip_markdown("Login fails on mobile"),
            "Login fails on mobile"
        );
        assert_eq!(strip_markdown("snake_case_name stays"), "snake_case_name stays");
    }

    #[test]
    fn test_headings() {
        assert_eq!(strip_markdown("# Title\n\n## Section ##\nBody"), "Title\n\nSection\nBody");
        assert_eq!(strip_markdown("Title\n=====\nBody"), "Title\n\nBody");
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(
            strip_markdown("This is **bold**, *italic*, __strong__, _em_ and ~~gone~~"),
            "This is bold, italic, strong, em and gone"
        );
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            strip_markdown("See [the docs](https://example.com) and ![diagram](img.png)"),
            "See the docs and diagram"
        );
        assert_eq!(
            strip_markdown("Intro\n[docs]: https://example.com"),
            "Intro"
        );
    }

    #[test]
    fn test_lists_and_quotes() {
        assert_eq!(
            strip_markdown("- first\n* second\n+ third\n> quoted"),
            "first\nsecond\nthird\nquoted"
        );
    }

    #[test]
    fn test_code() {
        assert_eq!(
            strip_markdown("Run `cargo test` first\n```rust\nfn main() {}\n```\nDone"),
            "Run cargo test first\nfn main() {}\nDone"
        );
    }

    #[test]
    fn test_html_and_rules() {
        assert_eq!(
            strip_markdown("<b>Note</b>\n\n---\n\n\n\nAfter"),
            "Note\n\nAfter"
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(strip_markdown(""), "");
        assert_eq!(strip_markdown("   \n  "), "");
    }
}
