//! Listing page parser
//!
//! Finds the record table through the configured positional path for the
//! detected layout and turns each candidate row into a [`ListingEntry`].
//! When the positional path does not resolve, the parser scans the document
//! for the table whose own rows carry record links and parse cleanly.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::{
    ContextualParser, LayoutDetector, ListingLayoutConfig, PageLayout, ParseContext, ParsingError,
    ParsingResult,
};
use crate::domain::record::ListingEntry;

/// Records of one page plus how they were found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    pub layout: PageLayout,
    pub entries: Vec<ListingEntry>,
    pub used_fallback: bool,
}

impl ParsedPage {
    /// An empty page ends pagination for its category
    pub fn is_terminal(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone)]
pub struct ListingParser {
    config: ListingLayoutConfig,
    detector: LayoutDetector,
    table_selector: Selector,
    row_selector: Selector,
    cell_selector: Selector,
    link_selector: Selector,
}

impl ListingParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(ListingLayoutConfig::default())
    }

    pub fn with_config(config: ListingLayoutConfig) -> ParsingResult<Self> {
        config.validate()?;
        Ok(Self {
            detector: LayoutDetector::new(&config.extended_marker),
            table_selector: Self::compile_selector("table")?,
            row_selector: Self::compile_selector("tr")?,
            cell_selector: Self::compile_selector("td")?,
            link_selector: Self::compile_selector("a")?,
            config,
        })
    }

    fn compile_selector(selector: &str) -> ParsingResult<Selector> {
        Selector::parse(selector).map_err(|e| ParsingError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse raw markup. The DOM never outlives this call, so callers can
    /// hold the result across await points.
    pub fn parse_markup(&self, markup: &str, context: &ParseContext) -> ParsingResult<ParsedPage> {
        let html = Html::parse_document(markup);
        self.parse_with_context(&html, context)
    }

    pub fn detect_layout(&self, html: &Html) -> PageLayout {
        self.detector.detect(html)
    }

    fn table_path(&self, layout: PageLayout) -> &[usize] {
        match layout {
            PageLayout::Extended => &self.config.extended_table_path,
            PageLayout::Standard => &self.config.standard_table_path,
        }
    }

    /// Follow a table path: the first index counts every table in the
    /// document, later indices count tables nested in the previous hit
    fn locate_table<'a>(&self, html: &'a Html, path: &[usize]) -> Option<ElementRef<'a>> {
        let (first, rest) = path.split_first()?;
        let mut table = html.select(&self.table_selector).nth(*first)?;
        for index in rest {
            table = table.select(&self.table_selector).nth(*index)?;
        }
        Some(table)
    }

    /// Every `row_stride`-th row of the table, header and footer removed
    fn candidate_rows<'a>(&self, table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let rows: Vec<ElementRef<'a>> = table
            .select(&self.row_selector)
            .step_by(self.config.row_stride)
            .collect();
        if rows.len() <= 2 {
            return Vec::new();
        }
        rows[1..rows.len() - 1].to_vec()
    }

    fn extract_rows(&self, rows: &[ElementRef<'_>]) -> ParsingResult<Vec<ListingEntry>> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| self.extract_entry(*row, index))
            .collect()
    }

    fn extract_entry(&self, row: ElementRef<'_>, index: usize) -> ParsingResult<ListingEntry> {
        let cells: Vec<ElementRef<'_>> = row.select(&self.cell_selector).collect();
        let required = self.config.required_cells();
        if cells.len() < required {
            return Err(ParsingError::MissingCell {
                row: index,
                expected: required,
                found: cells.len(),
            });
        }

        let ip_address = self.extract_identifier(cells[0], index)?;
        let name = normalize_whitespace(&cell_text(cells[self.config.name_cell]));
        let admin = cell_text(cells[self.config.admin_cell]) == self.config.admin_literal;
        let owned = cell_text(cells[self.config.owned_cell]) == self.config.owned_literal;

        Ok(ListingEntry {
            ip_address,
            name,
            admin,
            owned,
        })
    }

    /// The first cell nests a one-cell table whose link ends in
    /// `...&<param>=<ip>`; the identifier is that segment minus its prefix
    fn extract_identifier(&self, first_cell: ElementRef<'_>, row: usize) -> ParsingResult<String> {
        let inner = first_cell
            .select(&self.cell_selector)
            .next()
            .ok_or_else(|| {
                ParsingError::missing_record_link(row, "first cell has no nested cell")
            })?;
        let link = inner
            .select(&self.link_selector)
            .next()
            .ok_or_else(|| ParsingError::missing_record_link(row, "nested cell has no anchor"))?;
        let href = link
            .value()
            .attr("href")
            .ok_or_else(|| ParsingError::missing_record_link(row, "anchor has no href"))?;

        let segment = href
            .split('&')
            .nth(self.config.identifier_segment)
            .ok_or_else(|| ParsingError::missing_identifier(row, href, "too few query segments"))?;
        let identifier: String = segment.chars().skip(self.config.identifier_prefix_len).collect();

        if identifier.trim().is_empty() {
            return Err(ParsingError::missing_identifier(row, href, "identifier is empty"));
        }
        Ok(identifier)
    }

    fn has_record_link(&self, row: ElementRef<'_>) -> bool {
        row.select(&self.link_selector).any(|link| {
            link.value()
                .attr("href")
                .is_some_and(|href| href.split('&').count() > self.config.identifier_segment)
        })
    }

    /// Rows whose nearest enclosing table is `table` itself
    fn own_rows<'a>(&self, table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        table
            .select(&self.row_selector)
            .filter(|row| nearest_table(*row).is_some_and(|t| t.id() == table.id()))
            .collect()
    }

    /// Tables whose record-link rows all parse; the one with most records wins
    fn semantic_scan(&self, html: &Html) -> Option<Vec<ListingEntry>> {
        html.select(&self.table_selector)
            .filter_map(|table| {
                let rows: Vec<ElementRef<'_>> = self
                    .own_rows(table)
                    .into_iter()
                    .filter(|row| self.has_record_link(*row))
                    .collect();
                if rows.is_empty() {
                    return None;
                }
                self.extract_rows(&rows).ok()
            })
            .max_by_key(Vec::len)
    }

    fn fallback_page(
        &self,
        html: &Html,
        layout: PageLayout,
        context: &ParseContext,
    ) -> Option<ParsedPage> {
        if !self.config.semantic_fallback {
            return None;
        }
        let entries = self.semantic_scan(html)?;
        warn!(
            "Positional {} layout path missed the listing on {} page {}; \
             found {} records by row shape",
            layout,
            context.category,
            context.page,
            entries.len()
        );
        Some(ParsedPage {
            layout,
            entries,
            used_fallback: true,
        })
    }
}

impl ContextualParser for ListingParser {
    type Output = ParsedPage;
    type Context = ParseContext;

    fn parse_with_context(
        &self,
        html: &Html,
        context: &Self::Context,
    ) -> ParsingResult<Self::Output> {
        let layout = self.detect_layout(html);
        let path = self.table_path(layout);
        debug!(
            "Parsing {} page {} with {} layout (table path {:?})",
            context.category, context.page, layout, path
        );

        let Some(table) = self.locate_table(html, path) else {
            let table_count = html.select(&self.table_selector).count();
            return self
                .fallback_page(html, layout, context)
                .ok_or_else(|| ParsingError::table_not_found(layout, path, table_count));
        };

        // Once the table is located its rows are authoritative: a malformed
        // row is an error and zero rows ends the category.
        let entries = self.extract_rows(&self.candidate_rows(table))?;

        debug!(
            "Extracted {} records from {} page {}",
            entries.len(),
            context.category,
            context.page
        );
        Ok(ParsedPage {
            layout,
            entries,
            used_fallback: false,
        })
    }
}

fn nearest_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect()
}

/// Collapse runs of whitespace to single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
