//! HTML serialization helpers.

use crate::layout::input::Attribute;

/// Elements that never have children or a closing tag.
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text content is emitted verbatim.
pub const RAW_TEXT_TAGS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_TAGS.contains(&tag)
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for use inside double quotes.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

pub fn open_tag(tag: &str, attrs: &[Attribute]) -> String {
    let mut out = format!("<{tag}");
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(&attr.value));
        out.push('"');
    }
    out.push('>');
    out
}

pub fn close_tag(tag: &str) -> String {
    format!("</{tag}>")
}

/// Serialize JSON for embedding inside a `<script>` element.
pub fn script_safe_json(value: &serde_json::Value) -> String {
    value
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaping() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attribute("say \"hi\" & <go>"), "say &quot;hi&quot; &amp; <go>");
        assert_eq!(
            open_tag("div", &[Attribute::new("class", "a\"b")]),
            "<div class=\"a&quot;b\">"
        );
    }

    #[test]
    fn test_script_safe_json() {
        let json = serde_json::json!({"x": "</script><script>"});
        let out = script_safe_json(&json);
        assert!(!out.contains("</script>"));
        let back: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(back, json);
    }
}
