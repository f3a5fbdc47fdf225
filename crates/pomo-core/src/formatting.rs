/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn leaves_usage_placeholders_readable() {
        assert_eq!(
            escape_html("/pomo start <duration> <repeat>"),
            "/pomo start &lt;duration&gt; &lt;repeat&gt;"
        );
    }
}
