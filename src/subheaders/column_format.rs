//! The column-format subheader: one fixed 76-byte record per variable,
//! giving display widths/digits and pointers to the format names and label.

use crate::error::Result;
use crate::layout::TextRef;
use crate::layout::text::write_text_ref;
use crate::primitives::write_u16;

pub const SIZE: usize = 76;
pub const SIGNATURE: [u8; 8] = [0xFE, 0xFB, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];

#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnFormat {
    pub output_width: u16,
    pub output_digits: u16,
    pub input_width: u16,
    pub input_digits: u16,
    pub input_format: TextRef,
    pub output_format: TextRef,
    pub label: TextRef,
}

impl ColumnFormat {
    pub fn write(&self, buf: &mut [u8], offset: usize) -> Result<()> {
        buf[offset..offset + 8].copy_from_slice(&SIGNATURE);
        write_u16(buf, offset + 32, self.output_width)?;
        write_u16(buf, offset + 34, self.output_digits)?;
        write_u16(buf, offset + 36, self.input_width)?;
        write_u16(buf, offset + 38, self.input_digits)?;
        write_text_ref(buf, offset + 48, self.input_format)?;
        write_text_ref(buf, offset + 54, self.output_format)?;
        write_text_ref(buf, offset + 60, self.label)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_widths_and_text_refs() {
        let format = ColumnFormat {
            output_width: 8,
            output_digits: 2,
            input_width: 0,
            input_digits: 0,
            input_format: TextRef::EMPTY,
            output_format: TextRef { index: 1, offset: 0, length: 4 },
            label: TextRef::EMPTY,
        };
        let mut buf = vec![0u8; SIZE];
        format.write(&mut buf, 0).unwrap();
        assert_eq!(u16::from_le_bytes(buf[32..34].try_into().unwrap()), 8);
        assert_eq!(u16::from_le_bytes(buf[34..36].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(buf[54..56].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(buf[58..60].try_into().unwrap()), 4);
    }
}
