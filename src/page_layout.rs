//! The chain of pages a dataset's metadata and rows are placed onto.
//!
//! Owns every page, the single column-text store, and the page-sequence
//! generator. Every subheader passed to [`PageLayout::add_subheader`] has
//! its page/position frozen at the moment it is placed; callers that need
//! to back-reference it later capture the returned tuple themselves rather
//! than re-querying a separate map.

use crate::error::Result;
use crate::layout::{ColumnTextStoreState, TextRef, VariablesLayout};
use crate::metadata::Value;
use crate::page::Sas7bdatPage;
use crate::sequence::PageSequence;
use crate::subheaders::SubheaderRecord;

pub struct PageLayout {
    variables_layout: VariablesLayout,
    page_size: usize,
    sequence: PageSequence,
    complete_pages: Vec<Sas7bdatPage>,
    current_page: Sas7bdatPage,
    column_text: ColumnTextStoreState,
}

impl PageLayout {
    #[must_use]
    pub fn new(page_size: usize, variables_layout: VariablesLayout) -> Self {
        let sequence = PageSequence::new();
        let current_page = Sas7bdatPage::new(page_size, sequence.current(), variables_layout.row_length());
        Self {
            variables_layout,
            page_size,
            sequence,
            complete_pages: Vec::new(),
            current_page,
            column_text: ColumnTextStoreState::new(),
        }
    }

    #[must_use]
    pub const fn variables_layout(&self) -> &VariablesLayout {
        &self.variables_layout
    }

    #[must_use]
    pub const fn initial_page_sequence(&self) -> u32 {
        self.sequence.initial()
    }

    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.complete_pages.len() as u64 + 1
    }

    #[must_use]
    pub fn column_text_subheader_count(&self) -> u16 {
        self.column_text.sealed_count()
    }

    /// Remaining observation capacity of the page currently being filled,
    /// in whole rows.
    #[must_use]
    pub fn current_page_row_capacity(&self) -> u64 {
        let row_length = self.variables_layout.row_length();
        self.current_page.remaining_rows(row_length)
    }

    fn open_fresh_page(&mut self) -> Result<Sas7bdatPage> {
        let seq = self.sequence.increment()?;
        Ok(Sas7bdatPage::new(self.page_size, seq, self.variables_layout.row_length()))
    }

    /// Places `subheader`, opening a new page first if the current one is
    /// full. Returns the subheader's frozen `(1-based page index, 1-based
    /// position within that page)`.
    pub fn add_subheader(&mut self, subheader: SubheaderRecord) -> Result<(u64, u64)> {
        let mut pending = subheader;
        loop {
            match self.current_page.try_add_subheader(pending)? {
                Ok(()) => {
                    let position = self.current_page.subheader_count() as u64;
                    let page_index = self.complete_pages.len() as u64 + 1;
                    return Ok((page_index, position));
                }
                Err(returned) => {
                    let next_page = self.open_fresh_page()?;
                    let finished = std::mem::replace(&mut self.current_page, next_page);
                    self.complete_pages.push(finished);
                    pending = returned;
                }
            }
        }
    }

    /// Interns `s` into the column-text store, sealing and placing
    /// subheaders as needed until it fits.
    pub fn add_text(&mut self, s: &str) -> Result<TextRef> {
        loop {
            if let Some(text_ref) = self.column_text.try_add(s) {
                return Ok(text_ref);
            }
            let sealed = self.column_text.seal(true);
            self.add_subheader(SubheaderRecord::ColumnText(sealed))?;
        }
    }

    /// Seals whatever `ColumnText` subheader is still in progress and
    /// places it. Must be called exactly once, after the last `add_text`.
    pub fn finalize_text(&mut self) -> Result<()> {
        if let Some(sealed) = self.column_text.finish() {
            self.add_subheader(SubheaderRecord::ColumnText(sealed))?;
        }
        Ok(())
    }

    /// Closes off metadata placement: appends the terminal subheader to the
    /// current page and, if it has no room left for a single row, marks it
    /// as the mixed final metadata page so row placement opens a fresh one.
    pub fn finalize_metadata(&mut self) {
        self.current_page.finalize_subheaders();
        if !self.current_page.has_row_capacity(self.variables_layout.row_length()) {
            self.current_page.set_is_final_metadata_page();
        }
    }

    /// Encodes and places one observation, opening new DATA pages as needed.
    /// Returns the `(1-based page index, 1-based block index within that
    /// page)` the row landed at.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Argument`] if `values` does not match
    /// the dataset's variable layout.
    pub fn add_observation(&mut self, values: &[Value]) -> Result<(u64, u64)> {
        let row_length = self.variables_layout.row_length();
        let mut row = vec![0u8; row_length];
        self.variables_layout.write_observation(&mut row, 0, values)?;
        while !self.current_page.try_add_observation(&row) {
            let next_page = self.open_fresh_page()?;
            let finished = std::mem::replace(&mut self.current_page, next_page);
            self.complete_pages.push(finished);
        }
        let page_index = self.complete_pages.len() as u64 + 1;
        let block_index = self.current_page.subheader_count() as u64 + self.current_page.rows_written() as u64;
        Ok((page_index, block_index))
    }

    /// Visits every subheader across every page, in placement order.
    pub fn for_each_subheader(&self, mut callback: impl FnMut(&SubheaderRecord, u64, u64)) {
        let all_pages = self.complete_pages.iter().chain(std::iter::once(&self.current_page));
        for (page_index, page) in all_pages.enumerate() {
            for (position, subheader) in page.subheaders().enumerate() {
                callback(subheader, page_index as u64 + 1, position as u64 + 1);
            }
        }
    }

    /// Consumes the layout, returning every page in order for serialization.
    #[must_use]
    pub fn into_pages(self) -> Vec<Sas7bdatPage> {
        let mut pages = self.complete_pages;
        pages.push(self.current_page);
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Format, Variable, VariableKind};

    fn layout_with_one_numeric() -> VariablesLayout {
        let variable = Variable::new("v", VariableKind::Numeric, 8, "", Format::UNSPECIFIED, Format::UNSPECIFIED).unwrap();
        VariablesLayout::new(vec![variable]).unwrap()
    }

    #[test]
    fn first_subheader_lands_on_page_one_position_one() {
        let mut layout = PageLayout::new(65536, layout_with_one_numeric());
        let (page_index, position) = layout.add_subheader(SubheaderRecord::Terminal).unwrap();
        assert_eq!(page_index, 1);
        assert_eq!(position, 1);
    }

    #[test]
    fn repeated_text_is_deduplicated_to_the_same_ref() {
        let mut layout = PageLayout::new(65536, layout_with_one_numeric());
        let first = layout.add_text("DATASTEP").unwrap();
        let second = layout.add_text("DATASTEP").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_dataset_yields_a_single_page_after_finalize() {
        let mut layout = PageLayout::new(65536, layout_with_one_numeric());
        layout.add_subheader(SubheaderRecord::Terminal).unwrap();
        layout.finalize_metadata();
        assert_eq!(layout.total_pages(), 1);
    }

    #[test]
    fn observations_overflow_onto_a_new_page() {
        let numeric_layout = layout_with_one_numeric();
        let row_length = numeric_layout.row_length();
        let mut layout = PageLayout::new(65536, numeric_layout);
        layout.finalize_metadata();
        let max_rows = Sas7bdatPage::max_observations_per_data_page(65536, row_length);
        for _ in 0..=max_rows {
            layout.add_observation(&[Value::Integer(1)]).unwrap();
        }
        assert!(layout.total_pages() >= 2);
    }
}
