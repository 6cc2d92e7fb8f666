//! The column-text subheader: a sealed slice of the interned-string table.

use crate::error::Result;
use crate::layout::text::ColumnTextSubheader;
use crate::primitives::write_u16;

pub const SIGNATURE: [u8; 8] = [0xFD, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
const HEADER_LEN: usize = 28;

#[must_use]
pub fn size(subheader: &ColumnTextSubheader) -> usize {
    HEADER_LEN + subheader.data.len()
}

pub fn write(subheader: &ColumnTextSubheader, buf: &mut [u8], offset: usize) -> Result<()> {
    let total = size(subheader);
    buf[offset..offset + 8].copy_from_slice(&SIGNATURE);
    write_u16(buf, offset + 8, u16::try_from(total).unwrap_or(u16::MAX))?;
    let data_start = offset + HEADER_LEN;
    buf[data_start..data_start + subheader.data.len()].copy_from_slice(&subheader.data);
    Ok(())
}
