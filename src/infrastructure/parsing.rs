//! HTML parsing infrastructure for the remote IP database listing
//!
//! Layout detection and record extraction are split so each can be tested
//! against captured markup without a network.

pub mod config;
pub mod context;
pub mod error;
pub mod layout;
pub mod listing_parser;

pub use config::ListingLayoutConfig;
pub use context::ParseContext;
pub use error::{ParsingError, ParsingResult};
pub use layout::{LayoutDetector, PageLayout};
pub use listing_parser::{ListingParser, ParsedPage};

use scraper::Html;

/// Parser over an already-parsed document with contextual information
pub trait ContextualParser {
    type Output;
    type Context;

    fn parse_with_context(
        &self,
        html: &Html,
        context: &Self::Context,
    ) -> ParsingResult<Self::Output>;
}
