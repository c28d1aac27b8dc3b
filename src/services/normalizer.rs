//! Text normalization.
//!
//! Turns a parsed document into one upper-cased line of visible text, so
//! every keyword and regex heuristic downstream works on the same view.

use scraper::{Html, Node};

/// Elements whose text never reaches the reader.
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Visible page text, whitespace-collapsed and upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    /// Normalize free text (already free of markup).
    pub fn from_text(raw: &str) -> Self {
        Self(collapse_whitespace(raw).to_uppercase())
    }

    /// Collect the visible text of a document.
    pub fn from_document(document: &Html) -> Self {
        let mut raw = String::new();
        for node in document.tree.root().descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
            });
            if !hidden {
                raw.push_str(text);
                raw.push(' ');
            }
        }
        Self::from_text(&raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring test; `needle` must already be upper-case.
    pub fn contains(&self, needle: &str) -> bool {
        !needle.is_empty() && self.0.contains(needle)
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_and_uppercases() {
        let text = NormalizedText::from_text("  Winter \n\t sale  이벤트 ");
        assert_eq!(text.as_str(), "WINTER SALE 이벤트");
    }

    #[test]
    fn test_strips_script_and_style() {
        let html = Html::parse_document(
            r#"<html><head><style>.sale { color: red }</style>
               <script>var promo = "SALE 90%";</script></head>
               <body><p>New <b>arrivals</b></p><noscript>sold out</noscript></body></html>"#,
        );
        let text = NormalizedText::from_document(&html);
        assert_eq!(text.as_str(), "NEW ARRIVALS");
        assert!(!text.contains("SALE"));
    }

    #[test]
    fn test_empty_needle_never_matches() {
        let text = NormalizedText::from_text("anything");
        assert!(!text.contains(""));
    }
}
