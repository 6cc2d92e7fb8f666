//! The row-size subheader: the single record most of the page layout's
//! back-references land in. Most fields are known once the variable list is
//! fixed; the rest (page/position of siblings, final counts) are only known
//! once every page has been placed, so this is held behind a shared handle
//! the page layout patches in place before close.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::layout::TextRef;
use crate::layout::text::write_text_ref;
use crate::primitives::{write_u16, write_u32, write_u64};

pub const SIZE: usize = 808;
pub const SIGNATURE: [u8; 8] = [0xF7, 0xF7, 0xF7, 0xF7, 0, 0, 0, 0];

pub type RowSizeHandle = Rc<RefCell<RowSize>>;

/// Back-referenced and forward-known fields of the row-size subheader.
#[derive(Debug, Default)]
pub struct RowSize {
    pub row_length: u64,
    pub total_observations: u64,
    pub column_formats_on_first_page: u64,
    pub column_formats_on_second_page: u64,
    pub aggregate_variable_name_length: u64,
    pub page_size: u64,
    pub max_obs_on_mixed_page: u64,
    pub initial_page_sequence: u32,
    pub page_index_of_column_size: u64,
    pub position_of_column_size: u64,
    pub page_of_last_subheader: u64,
    pub position_of_last_subheader: u64,
    pub page_of_first_observation: u64,
    pub block_index_of_first_observation: u64,
    pub page_of_last_observation: u64,
    pub block_index_of_last_observation: u64,
    pub page_of_first_column_format: u64,
    pub position_of_first_column_format: u64,
    /// Tolerated garbage field: re-emitted verbatim even though no string
    /// with this exact meaning is ever interned.
    pub compression_algorithm_name: TextRef,
    pub dataset_label: TextRef,
    pub dataset_type: TextRef,
    /// Tolerated garbage field, see `compression_algorithm_name`.
    pub second_entry: TextRef,
    pub creator_proc: TextRef,
    pub column_text_subheader_count: u16,
    pub max_variable_name_length: u16,
    pub max_variable_label_length: u16,
    pub max_obs_per_data_page: u16,
    pub observations_in_dataset: u64,
}

impl RowSize {
    #[must_use]
    pub fn new_handle() -> RowSizeHandle {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn write(&self, buf: &mut [u8], offset: usize) -> Result<()> {
        buf[offset..offset + 8].copy_from_slice(&SIGNATURE);
        write_u64(buf, offset + 40, self.row_length)?;
        write_u64(buf, offset + 48, self.total_observations)?;
        write_u64(buf, offset + 56, 0)?;
        write_u64(buf, offset + 72, self.column_formats_on_first_page)?;
        write_u64(buf, offset + 80, self.column_formats_on_second_page)?;
        write_u64(buf, offset + 96, self.aggregate_variable_name_length)?;
        write_u64(buf, offset + 104, self.page_size)?;
        write_u64(buf, offset + 120, self.max_obs_on_mixed_page)?;
        write_u32(buf, offset + 296, self.initial_page_sequence)?;
        write_u32(buf, offset + 300, 0)?;
        write_u64(buf, offset + 360, self.page_index_of_column_size)?;
        write_u64(buf, offset + 368, self.position_of_column_size)?;
        write_u64(buf, offset + 376, self.page_of_last_subheader)?;
        write_u64(buf, offset + 384, self.position_of_last_subheader)?;
        write_u64(buf, offset + 392, self.page_of_first_observation)?;
        write_u64(buf, offset + 400, self.block_index_of_first_observation)?;
        write_u64(buf, offset + 408, self.page_of_last_observation)?;
        write_u64(buf, offset + 416, self.block_index_of_last_observation)?;
        write_u64(buf, offset + 424, self.page_of_first_column_format)?;
        write_u64(buf, offset + 432, self.position_of_first_column_format)?;
        write_text_ref(buf, offset + 536, self.compression_algorithm_name)?;
        write_text_ref(buf, offset + 542, self.dataset_label)?;
        write_text_ref(buf, offset + 548, self.dataset_type)?;
        write_text_ref(buf, offset + 560, self.second_entry)?;
        write_text_ref(buf, offset + 566, self.creator_proc)?;
        write_u16(buf, offset + 712, self.column_text_subheader_count)?;
        write_u16(buf, offset + 714, self.max_variable_name_length)?;
        write_u16(buf, offset + 716, self.max_variable_label_length)?;
        write_u16(buf, offset + 732, self.max_obs_per_data_page)?;
        write_u64(buf, offset + 734, self.observations_in_dataset)?;
        write_u32(buf, offset + 742, 0x0100_0000)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_handle_starts_zeroed() {
        let handle = RowSize::new_handle();
        let row_size = handle.borrow();
        assert_eq!(row_size.page_index_of_column_size, 0);
        assert_eq!(row_size.row_length, 0);
    }

    #[test]
    fn write_places_row_length_and_observation_count() {
        let handle = RowSize::new_handle();
        {
            let mut row_size = handle.borrow_mut();
            row_size.row_length = 24;
            row_size.total_observations = 3;
        }
        let mut buf = vec![0u8; SIZE];
        handle.borrow().write(&mut buf, 0).unwrap();
        assert_eq!(&buf[0..8], &SIGNATURE);
        assert_eq!(u64::from_le_bytes(buf[40..48].try_into().unwrap()), 24);
        assert_eq!(u64::from_le_bytes(buf[48..56].try_into().unwrap()), 3);
    }
}
