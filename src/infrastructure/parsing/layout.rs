//! Page layout detection

use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two table arrangements the listing is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLayout {
    Standard,
    /// Rendered when the remote host web service panel is present, which
    /// pushes extra tables ahead of the listing
    Extended,
}

impl fmt::Display for PageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Extended => f.write_str("extended"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutDetector {
    marker: String,
}

impl LayoutDetector {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_lowercase(),
        }
    }

    /// Extended when the marker appears anywhere in the page's text content
    pub fn detect(&self, html: &Html) -> PageLayout {
        let text = html.root_element().text().collect::<String>().to_lowercase();
        if text.contains(&self.marker) {
            PageLayout::Extended
        } else {
            PageLayout::Standard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_selects_extended_layout() {
        let detector = LayoutDetector::new("Remote host web service");
        let html = Html::parse_document(
            "<html><body><p>Remote host <b>web service</b> online</p></body></html>",
        );
        assert_eq!(detector.detect(&html), PageLayout::Extended);
    }

    #[test]
    fn test_marker_match_ignores_case() {
        let detector = LayoutDetector::new("Remote host web service");
        let html = Html::parse_document("<p>remote host web service</p>");
        assert_eq!(detector.detect(&html), PageLayout::Extended);
    }

    #[test]
    fn test_missing_marker_defaults_to_standard() {
        let detector = LayoutDetector::new("Remote host web service");
        let html = Html::parse_document("<p>Remote host offline</p>");
        assert_eq!(detector.detect(&html), PageLayout::Standard);
    }

    #[test]
    fn test_marker_in_attribute_does_not_count() {
        let detector = LayoutDetector::new("Remote host web service");
        let html = Html::parse_document("<p title=\"Remote host web service\">x</p>");
        assert_eq!(detector.detect(&html), PageLayout::Standard);
    }
}
