//! A single fixed-size page: bin-packs subheaders and observation rows into
//! one buffer and serializes the packed result.

use crate::error::{Error, Result};
use crate::primitives::{write_u16, write_u32, write_u64};
use crate::subheaders::SubheaderRecord;

const PAGE_HEADER_LEN: usize = 40;
const SUBHEADER_POINTER_LEN: usize = 24;

const PAGE_TYPE_DATA: u16 = 0x0100;
const PAGE_TYPE_MIX: u16 = 0x0200;
const PAGE_TYPE_META: u16 = 0x0000;

/// One page of the output file: a fixed `page_size`-byte region holding a
/// subheader directory, subheader bodies, and (for MIX/DATA pages) packed
/// observation rows.
#[derive(Debug)]
pub struct Sas7bdatPage {
    page_size: usize,
    sequence: u32,
    row_length: usize,
    subheaders: Vec<SubheaderRecord>,
    row_bytes: Vec<u8>,
    rows_written: u32,
    finalized: bool,
    is_mixed_final_metadata: bool,
    free_bytes_at_finalize: Option<i64>,
}

impl Sas7bdatPage {
    #[must_use]
    pub fn new(page_size: usize, sequence: u32, row_length: usize) -> Self {
        Self {
            page_size,
            sequence,
            row_length,
            subheaders: Vec::new(),
            row_bytes: Vec::new(),
            rows_written: 0,
            finalized: false,
            is_mixed_final_metadata: false,
            free_bytes_at_finalize: None,
        }
    }

    #[must_use]
    pub fn subheader_count(&self) -> usize {
        self.subheaders.len()
    }

    #[must_use]
    pub fn rows_written(&self) -> u32 {
        self.rows_written
    }

    pub fn subheaders(&self) -> impl Iterator<Item = &SubheaderRecord> {
        self.subheaders.iter()
    }

    /// Whether a single more observation would fit without adding one.
    #[must_use]
    pub fn has_row_capacity(&self, row_length: usize) -> bool {
        self.remaining_row_capacity() >= row_length as i64
    }

    /// How many whole observations still fit on this page.
    #[must_use]
    pub fn remaining_rows(&self, row_length: usize) -> u64 {
        let remaining = self.remaining_row_capacity();
        if remaining <= 0 {
            0
        } else {
            remaining as u64 / row_length as u64
        }
    }

    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Bytes available for one more subheader, accounting for its own
    /// pointer and a reserved terminal pointer, before it is actually added.
    #[must_use]
    pub fn total_bytes_remaining_for_new_subheader(&self) -> i64 {
        let used: usize = self.subheaders.iter().map(SubheaderRecord::size).sum();
        self.page_size as i64
            - PAGE_HEADER_LEN as i64
            - SUBHEADER_POINTER_LEN as i64 * (self.subheaders.len() as i64 + 2)
            - used as i64
    }

    /// Attempts to place `subheader` on this page. Returns the subheader
    /// back on failure so the caller can retry it on a fresh page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::State`] if the page has already been finalized.
    pub fn try_add_subheader(
        &mut self,
        subheader: SubheaderRecord,
    ) -> Result<std::result::Result<(), SubheaderRecord>> {
        if self.finalized {
            return Err(Error::state("cannot add a subheader to a finalized page"));
        }
        let remaining = self.total_bytes_remaining_for_new_subheader() - subheader.size() as i64;
        if remaining >= 0 {
            self.subheaders.push(subheader);
            Ok(Ok(()))
        } else {
            Ok(Err(subheader))
        }
    }

    /// Appends the terminal subheader and freezes the subheader list. Rows
    /// may still be added afterward.
    pub fn finalize_subheaders(&mut self) {
        self.free_bytes_at_finalize = Some(self.total_bytes_remaining_for_new_subheader());
        self.subheaders.push(SubheaderRecord::Terminal);
        self.finalized = true;
    }

    /// Marks this page as the mixed final metadata page even if it never
    /// absorbs an observation row.
    pub fn set_is_final_metadata_page(&mut self) {
        self.is_mixed_final_metadata = true;
    }

    fn remaining_row_capacity(&self) -> i64 {
        let used_by_rows = self.rows_written as i64 * self.row_length as i64;
        self.page_size as i64
            - PAGE_HEADER_LEN as i64
            - SUBHEADER_POINTER_LEN as i64 * self.subheaders.len() as i64
            - used_by_rows
    }

    /// Attempts to append one observation's pre-encoded row bytes.
    #[must_use]
    pub fn try_add_observation(&mut self, row: &[u8]) -> bool {
        if self.row_length as i64 > self.remaining_row_capacity() {
            return false;
        }
        self.row_bytes.extend_from_slice(row);
        self.rows_written += 1;
        true
    }

    #[must_use]
    pub fn page_type(&self) -> u16 {
        if self.subheaders.is_empty() {
            PAGE_TYPE_DATA
        } else if self.rows_written > 0 || self.is_mixed_final_metadata {
            PAGE_TYPE_MIX
        } else {
            PAGE_TYPE_META
        }
    }

    /// The largest number of observations that fit on a dedicated DATA page.
    #[must_use]
    pub fn max_observations_per_data_page(page_size: usize, row_length: usize) -> usize {
        (page_size - PAGE_HEADER_LEN) / row_length
    }

    /// The smallest 1024-byte multiple that can host the header, one row,
    /// and at least a byte to spare, never smaller than the 64 KiB default.
    #[must_use]
    pub fn calculate_page_size(row_length: usize) -> usize {
        let minimum = (PAGE_HEADER_LEN + row_length + 1).max(0x1_0000);
        minimum.div_ceil(1024) * 1024
    }

    /// Serializes the page into `buf`, which must be exactly `page_size`
    /// bytes and zero-initialized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::State`] if `buf` is not exactly `page_size` bytes.
    pub fn write(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() != self.page_size {
            return Err(Error::state(format!(
                "page buffer is {} bytes, expected {}",
                buf.len(),
                self.page_size
            )));
        }

        write_u32(buf, 0, self.sequence)?;
        let free_bytes = self
            .free_bytes_at_finalize
            .unwrap_or_else(|| self.remaining_row_capacity())
            .max(0);
        write_u32(buf, 24, u32::try_from(free_bytes).unwrap_or(u32::MAX))?;
        write_u16(buf, 32, self.page_type())?;
        let total_blocks = self.subheaders.len() + self.rows_written as usize;
        write_u16(buf, 34, u16::try_from(total_blocks).unwrap_or(u16::MAX))?;
        write_u16(buf, 36, u16::try_from(self.subheaders.len()).unwrap_or(u16::MAX))?;

        let mut locations = Vec::with_capacity(self.subheaders.len());
        let mut offset_from_end = 0usize;
        for subheader in &self.subheaders {
            let size = subheader.size();
            offset_from_end += size;
            let location = self.page_size - offset_from_end;
            if size > 0 {
                subheader.write(buf, location)?;
            }
            locations.push((location, size));
        }

        for (i, subheader) in self.subheaders.iter().enumerate() {
            let (location, size) = locations[i];
            let entry_offset = PAGE_HEADER_LEN + i * SUBHEADER_POINTER_LEN;
            write_u64(buf, entry_offset, location as u64)?;
            write_u64(buf, entry_offset + 8, size as u64)?;
            buf[entry_offset + 16] = subheader.compression_code();
            buf[entry_offset + 17] = subheader.type_code();
        }

        let row_start = PAGE_HEADER_LEN + SUBHEADER_POINTER_LEN * self.subheaders.len();
        buf[row_start..row_start + self.row_bytes.len()].copy_from_slice(&self.row_bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_is_data_type() {
        let page = Sas7bdatPage::new(65536, 0, 8);
        assert_eq!(page.page_type(), PAGE_TYPE_DATA);
    }

    #[test]
    fn page_with_subheaders_and_no_rows_is_meta() {
        let mut page = Sas7bdatPage::new(65536, 0, 8);
        page.try_add_subheader(SubheaderRecord::Terminal).unwrap().unwrap();
        assert_eq!(page.page_type(), PAGE_TYPE_META);
    }

    #[test]
    fn page_with_subheaders_and_rows_is_mix() {
        let mut page = Sas7bdatPage::new(65536, 0, 8);
        page.try_add_subheader(SubheaderRecord::Terminal).unwrap().unwrap();
        assert!(page.try_add_observation(&[0u8; 8]));
        assert_eq!(page.page_type(), PAGE_TYPE_MIX);
    }

    #[test]
    fn cannot_add_subheader_after_finalize() {
        let mut page = Sas7bdatPage::new(65536, 0, 8);
        page.finalize_subheaders();
        assert!(page.try_add_subheader(SubheaderRecord::Terminal).is_err());
    }

    #[test]
    fn observation_rejected_once_page_is_full() {
        let row_length = 65536 - 40;
        let mut page = Sas7bdatPage::new(65536, 0, row_length);
        assert!(page.try_add_observation(&vec![0u8; row_length]));
        assert!(!page.try_add_observation(&vec![0u8; row_length]));
    }

    #[test]
    fn calculate_page_size_defaults_to_64kib() {
        assert_eq!(Sas7bdatPage::calculate_page_size(8), 65536);
    }

    #[test]
    fn calculate_page_size_enlarges_for_wide_rows() {
        assert_eq!(Sas7bdatPage::calculate_page_size(200_000), 200_704);
    }

    #[test]
    fn write_records_sequence_and_counts() {
        let mut page = Sas7bdatPage::new(65536, 0xAABB_CCDD, 8);
        page.try_add_subheader(SubheaderRecord::Terminal).unwrap().unwrap();
        let mut buf = vec![0u8; 65536];
        page.write(&mut buf).unwrap();
        assert_eq!(u32::from_le_bytes(buf[0..4].try_into().unwrap()), 0xAABB_CCDD);
        assert_eq!(u16::from_le_bytes(buf[36..38].try_into().unwrap()), 1);
    }
}
