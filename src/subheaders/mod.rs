//! Byte-exact rendering of every metadata record kind.
//!
//! Modeled as a tagged sum rather than a class hierarchy: `SubheaderRecord`
//! dispatches `size`/`type_code`/`compression_code`/`write` by match, and
//! each kind's own module owns its byte layout.

pub mod column_attributes;
pub mod column_format;
pub mod column_list;
pub mod column_name;
pub mod column_size;
pub mod column_text;
pub mod row_size;
pub mod subheader_counts;

pub use column_attributes::ColumnAttributes;
pub use column_format::ColumnFormat;
pub use column_list::ColumnList;
pub use column_name::ColumnName;
pub use column_size::ColumnSize;
pub use row_size::{RowSize, RowSizeHandle};
pub use subheader_counts::SubheaderCounts;

use crate::error::Result;
use crate::layout::text::ColumnTextSubheader;

pub const TYPE_A: u8 = 1;
pub const TYPE_B: u8 = 2;

pub const COMPRESSION_UNCOMPRESSED: u8 = 0;
pub const COMPRESSION_TRUNCATED: u8 = 1;

/// Hard cap on the total byte size of any variable-length subheader: an
/// implementation limit so that `size` always fits in a signed 16-bit field
/// once combined with the fixed trailer every subheader carries.
pub const MAX_VARIABLE_SUBHEADER_SIZE: usize = 32740;

/// One metadata record, in its final (possibly still back-referenced)
/// form. The page packer only needs the uniform `{size, type_code,
/// compression_code, write}` surface; it never inspects a variant directly.
#[derive(Debug)]
pub enum SubheaderRecord {
    RowSize(RowSizeHandle),
    ColumnSize(ColumnSize),
    SubheaderCounts(SubheaderCounts),
    ColumnText(ColumnTextSubheader),
    ColumnAttributes(ColumnAttributes),
    ColumnName(ColumnName),
    ColumnFormat(ColumnFormat),
    ColumnList(ColumnList),
    Terminal,
}

impl SubheaderRecord {
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::RowSize(_) => row_size::SIZE,
            Self::ColumnSize(_) => column_size::SIZE,
            Self::SubheaderCounts(_) => subheader_counts::SIZE,
            Self::ColumnText(subheader) => column_text::size(subheader),
            Self::ColumnAttributes(attrs) => attrs.size(),
            Self::ColumnName(names) => names.size(),
            Self::ColumnFormat(_) => column_format::SIZE,
            Self::ColumnList(list) => list.size(),
            Self::Terminal => 0,
        }
    }

    #[must_use]
    pub const fn type_code(&self) -> u8 {
        match self {
            Self::ColumnText(_) | Self::ColumnAttributes(_) | Self::ColumnName(_) | Self::ColumnList(_) => TYPE_B,
            _ => TYPE_A,
        }
    }

    #[must_use]
    pub const fn compression_code(&self) -> u8 {
        match self {
            Self::Terminal => COMPRESSION_TRUNCATED,
            _ => COMPRESSION_UNCOMPRESSED,
        }
    }

    pub fn write(&self, buf: &mut [u8], offset: usize) -> Result<()> {
        match self {
            Self::RowSize(handle) => handle.borrow().write(buf, offset),
            Self::ColumnSize(column_size) => column_size.write(buf, offset),
            Self::SubheaderCounts(counts) => counts.write(buf, offset),
            Self::ColumnText(subheader) => column_text::write(subheader, buf, offset),
            Self::ColumnAttributes(attrs) => attrs.write(buf, offset),
            Self::ColumnName(names) => names.write(buf, offset),
            Self::ColumnFormat(format) => format.write(buf, offset),
            Self::ColumnList(list) => list.write(buf, offset),
            Self::Terminal => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_is_truncated_and_zero_sized() {
        let terminal = SubheaderRecord::Terminal;
        assert_eq!(terminal.size(), 0);
        assert_eq!(terminal.compression_code(), COMPRESSION_TRUNCATED);
        assert_eq!(terminal.type_code(), TYPE_A);
    }

    #[test]
    fn column_text_and_attributes_are_type_b() {
        let text = SubheaderRecord::ColumnText(ColumnTextSubheader { index: 0, data: Vec::new() });
        assert_eq!(text.type_code(), TYPE_B);
        let attrs = SubheaderRecord::ColumnAttributes(ColumnAttributes::default());
        assert_eq!(attrs.type_code(), TYPE_B);
    }

    #[test]
    fn row_size_is_type_a_with_fixed_size() {
        let row_size = SubheaderRecord::RowSize(RowSize::new_handle());
        assert_eq!(row_size.type_code(), TYPE_A);
        assert_eq!(row_size.size(), row_size::SIZE);
    }
}
