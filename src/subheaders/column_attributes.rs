//! The column-attributes subheader: per-variable physical offset, storage
//! length, and type, 16 bytes per entry.

use crate::error::Result;
use crate::primitives::{write_u32, write_u64};

pub const SIGNATURE: [u8; 8] = [0xFC, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
const HEADER_LEN: usize = 28;
const ENTRY_LEN: usize = 16;

pub const NUMERIC_TYPE_CODE: u8 = 1;
pub const CHARACTER_TYPE_CODE: u8 = 2;

#[derive(Debug, Clone, Copy)]
pub struct ColumnAttributeEntry {
    pub physical_offset: u64,
    pub length: u32,
    /// 1-based index of the variable this entry describes.
    pub variable_number: u16,
    pub column_type: u8,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnAttributes {
    pub entries: Vec<ColumnAttributeEntry>,
}

impl ColumnAttributes {
    /// The largest number of entries that fit in a subheader capped at
    /// `max_bytes` total size.
    #[must_use]
    pub const fn capacity(max_bytes: usize) -> usize {
        if max_bytes < HEADER_LEN {
            0
        } else {
            (max_bytes - HEADER_LEN) / ENTRY_LEN
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        HEADER_LEN + ENTRY_LEN * self.entries.len()
    }

    pub fn write(&self, buf: &mut [u8], offset: usize) -> Result<()> {
        buf[offset..offset + 8].copy_from_slice(&SIGNATURE);
        for (i, entry) in self.entries.iter().enumerate() {
            let entry_offset = offset + HEADER_LEN + i * ENTRY_LEN;
            write_u64(buf, entry_offset, entry.physical_offset)?;
            write_u32(buf, entry_offset + 8, entry.length)?;
            let number = entry.variable_number.to_le_bytes();
            buf[entry_offset + 12] = number[0];
            buf[entry_offset + 13] = number[1];
            buf[entry_offset + 14] = entry.column_type;
            buf[entry_offset + 15] = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_accounts_for_header() {
        assert_eq!(ColumnAttributes::capacity(28 + 16 * 3), 3);
        assert_eq!(ColumnAttributes::capacity(20), 0);
    }

    #[test]
    fn writes_entries_after_header() {
        let attrs = ColumnAttributes {
            entries: vec![ColumnAttributeEntry {
                physical_offset: 0,
                length: 8,
                variable_number: 1,
                column_type: NUMERIC_TYPE_CODE,
            }],
        };
        let mut buf = vec![0u8; attrs.size()];
        attrs.write(&mut buf, 0).unwrap();
        assert_eq!(&buf[0..8], &SIGNATURE);
        assert_eq!(u64::from_le_bytes(buf[28..36].try_into().unwrap()), 0);
        assert_eq!(u32::from_le_bytes(buf[36..40].try_into().unwrap()), 8);
        assert_eq!(buf[40], 1);
        assert_eq!(buf[42], NUMERIC_TYPE_CODE);
    }
}
