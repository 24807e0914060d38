//! Minimal HTML emission helpers for the render formats.
//!
//! Copyright (c) 2025 Posit, PBC

/// Escape text for use in HTML content and attribute values.
pub(crate) fn escape_html(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// Build a srcset attribute value from url/descriptor pairs.
pub(crate) fn srcset_value(entries: &[(String, String)]) -> String {
    entries
        .iter()
        .map(|(url, descriptors)| {
            if descriptors.is_empty() {
                url.clone()
            } else {
                format!("{url}{descriptors}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_srcset_value() {
        let entries = vec![
            ("img/a.png".to_string(), " 300w".to_string()),
            ("img/b.png".to_string(), String::new()),
        ];
        assert_eq!(srcset_value(&entries), "img/a.png 300w, img/b.png");
    }
}
