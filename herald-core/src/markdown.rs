//! MarkdownV2 helpers for composing bot messages.

use teloxide::utils::markdown;

/// Escapes every MarkdownV2 control character in `text`.
pub fn escape(text: &str) -> String {
    markdown::escape(text)
}

/// Bold, with `text` escaped.
pub fn bold(text: &str) -> String {
    markdown::bold(&escape(text))
}

/// Inline link; `label` is escaped, `url` is escaped for the link target.
pub fn link(url: &str, label: &str) -> String {
    markdown::link(url, &escape(label))
}

/// Cuts already-escaped MarkdownV2 to at most `max_chars` characters, ending with an escaped
/// ellipsis. Never leaves a dangling escape backslash at the cut.
pub fn truncate_escaped(text: &str, max_chars: usize) -> String {
    const ELLIPSIS: &str = "\\.\\.\\.";
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.chars().count());
    let mut cut: String = text.chars().take(keep).collect();
    let trailing = cut.chars().rev().take_while(|c| *c == '\\').count();
    if trailing % 2 == 1 {
        cut.pop();
    }
    cut.push_str(ELLIPSIS);
    cut
}
