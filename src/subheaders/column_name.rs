//! The column-name subheader: per-variable column-text pointer to the
//! variable's name, 8 bytes per entry.

use crate::error::Result;
use crate::layout::TextRef;
use crate::layout::text::write_text_ref;
use crate::primitives::write_u16;

pub const SIGNATURE: [u8; 8] = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
const HEADER_LEN: usize = 28;
const ENTRY_LEN: usize = 8;

/// A dataset cannot place more entries than this in a single subheader
/// regardless of remaining page space.
pub const MAX_ENTRIES_PER_SUBHEADER: usize = 4089;

#[derive(Debug, Clone, Default)]
pub struct ColumnName {
    pub entries: Vec<TextRef>,
}

impl ColumnName {
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
        HEADER_LEN + ENTRY_LEN * self.entries.len()
    }

    pub fn write(&self, buf: &mut [u8], offset: usize) -> Result<()> {
        buf[offset..offset + 8].copy_from_slice(&SIGNATURE);
        for (i, text_ref) in self.entries.iter().enumerate() {
            let entry_offset = offset + HEADER_LEN + i * ENTRY_LEN;
            write_text_ref(buf, entry_offset, *text_ref)?;
            write_u16(buf, entry_offset + 6, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_capped_at_documented_maximum() {
        assert_eq!(ColumnName::capacity(HEADER_LEN + ENTRY_LEN * 10_000), MAX_ENTRIES_PER_SUBHEADER);
    }

    #[test]
    fn writes_text_ref_triples() {
        let name = ColumnName {
            entries: vec![TextRef { index: 0, offset: 4, length: 3 }],
        };
        let mut buf = vec![0u8; name.size()];
        name.write(&mut buf, 0).unwrap();
        assert_eq!(u16::from_le_bytes(buf[28..30].try_into().unwrap()), 0);
        assert_eq!(u16::from_le_bytes(buf[30..32].try_into().unwrap()), 4);
        assert_eq!(u16::from_le_bytes(buf[32..34].try_into().unwrap()), 3);
    }
}
