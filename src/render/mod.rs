//! Turn [`crate::view`] structures into text.
//!
//! - [`terminal`]: ANSI-coloured output for the CLI
//! - [`html`]: a self-contained HTML report of a batch run

pub mod html;
pub mod terminal;

/// Escape the five HTML-significant characters.
pub fn escape_html(unsafe_text: &str) -> String {
    let mut out = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_all_specials() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_html_plain_untouched() {
        assert_eq!(escape_html("plain text 123"), "plain text 123");
    }

    #[test]
    fn test_escape_html_ampersand_first() {
        // An already-escaped entity is escaped again, not passed through.
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }
}
