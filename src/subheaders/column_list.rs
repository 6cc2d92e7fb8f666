//! The column-list subheader: a 40-byte header of redundant counts followed
//! by the 1-based variable numbers it covers.

use crate::error::Result;
use crate::primitives::write_u16;

pub const SIGNATURE: [u8; 8] = [0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
const HEADER_LEN: usize = 40;
const ENTRY_LEN: usize = 2;

/// A dataset cannot place more variable numbers in one subheader than this,
/// regardless of remaining page space.
pub const MAX_ENTRIES_PER_SUBHEADER: usize = 16345;

#[derive(Debug, Clone, Default)]
pub struct ColumnList {
    pub variable_numbers: Vec<u16>,
}

impl ColumnList {
    #[must_use]
    pub const fn capacity(max_bytes: usize) -> usize {
        let by_bytes = if max_bytes < HEADER_LEN {
            0
        } else {
            (max_bytes - HEADER_LEN) / ENTRY_LEN
        };
        if by_bytes < MAX_ENTRIES_PER_SUBHEADER {
            by_bytes
        } else {
            MAX_ENTRIES_PER_SUBHEADER
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        HEADER_LEN + ENTRY_LEN * self.variable_numbers.len()
    }

    pub fn write(&self, buf: &mut [u8], offset: usize) -> Result<()> {
        buf[offset..offset + 8].copy_from_slice(&SIGNATURE);
        let count = u16::try_from(self.variable_numbers.len()).unwrap_or(u16::MAX);
        let list_length = u16::try_from(self.size()).unwrap_or(u16::MAX);
        write_u16(buf, offset + 8, count)?;
        write_u16(buf, offset + 10, list_length)?;
        write_u16(buf, offset + 12, 1)?;
        write_u16(buf, offset + 14, count)?;
        for (i, &variable_number) in self.variable_numbers.iter().enumerate() {
            write_u16(buf, offset + HEADER_LEN + i * ENTRY_LEN, variable_number)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_redundant_counts_then_entries() {
        let list = ColumnList { variable_numbers: vec![1, 2, 3] };
        let mut buf = vec![0u8; list.size()];
        list.write(&mut buf, 0).unwrap();
        assert_eq!(u16::from_le_bytes(buf[8..10].try_into().unwrap()), 3);
        assert_eq!(u16::from_le_bytes(buf[12..14].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(buf[14..16].try_into().unwrap()), 3);
        assert_eq!(u16::from_le_bytes(buf[40..42].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(buf[42..44].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(buf[44..46].try_into().unwrap()), 3);
    }
}
