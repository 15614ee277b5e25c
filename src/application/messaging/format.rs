//! Markdown helpers for bot replies

/// Render `text` as an informational quote block
pub fn quote_info(text: &str) -> String {
    format!("<blockquote class=\"info\">{}</blockquote>", text)
}
