//! Little-endian byte primitives shared by every on-disk record.
//!
//! All numbers in a 64-bit little-endian sas7bdat file are written with
//! [`byteorder::LittleEndian`]; this module wraps that crate with the
//! bounds-checked helpers the rest of the writer composes.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

fn check_bounds(buf: &[u8], offset: usize, width: usize) -> Result<()> {
    if offset.checked_add(width).is_none_or(|end| end > buf.len()) {
        return Err(Error::state(format!(
            "write of {width} bytes at offset {offset} exceeds buffer length {}",
            buf.len()
        )));
    }
    Ok(())
}

/// Writes a little-endian `i16` at `offset`.
pub fn write2(buf: &mut [u8], offset: usize, value: i16) -> Result<()> {
    check_bounds(buf, offset, 2)?;
    LittleEndian::write_i16(&mut buf[offset..offset + 2], value);
    Ok(())
}

/// Writes a little-endian `u16` at `offset`.
pub fn write_u16(buf: &mut [u8], offset: usize, value: u16) -> Result<()> {
    check_bounds(buf, offset, 2)?;
    LittleEndian::write_u16(&mut buf[offset..offset + 2], value);
    Ok(())
}

/// Writes a little-endian `i32` at `offset`.
pub fn write4(buf: &mut [u8], offset: usize, value: i32) -> Result<()> {
    check_bounds(buf, offset, 4)?;
    LittleEndian::write_i32(&mut buf[offset..offset + 4], value);
    Ok(())
}

/// Writes a little-endian `u32` at `offset`.
pub fn write_u32(buf: &mut [u8], offset: usize, value: u32) -> Result<()> {
    check_bounds(buf, offset, 4)?;
    LittleEndian::write_u32(&mut buf[offset..offset + 4], value);
    Ok(())
}

/// Writes a little-endian `i64` at `offset`.
pub fn write8(buf: &mut [u8], offset: usize, value: i64) -> Result<()> {
    check_bounds(buf, offset, 8)?;
    LittleEndian::write_i64(&mut buf[offset..offset + 8], value);
    Ok(())
}

/// Writes a little-endian `u64` at `offset`.
pub fn write_u64(buf: &mut [u8], offset: usize, value: u64) -> Result<()> {
    check_bounds(buf, offset, 8)?;
    LittleEndian::write_u64(&mut buf[offset..offset + 8], value);
    Ok(())
}

/// Writes a little-endian `f64` at `offset`.
pub fn write_f64(buf: &mut [u8], offset: usize, value: f64) -> Result<()> {
    check_bounds(buf, offset, 8)?;
    LittleEndian::write_f64(&mut buf[offset..offset + 8], value);
    Ok(())
}

/// Writes the ASCII bytes of `s` at `offset`, padding the remainder of
/// `width` bytes with `0x20` (space). Non-ASCII bytes are written verbatim;
/// callers are expected to pass ASCII-only strings.
pub fn write_ascii(buf: &mut [u8], offset: usize, s: &str, width: usize) -> Result<()> {
    check_bounds(buf, offset, width)?;
    let bytes = s.as_bytes();
    let copy_len = bytes.len().min(width);
    buf[offset..offset + copy_len].copy_from_slice(&bytes[..copy_len]);
    for slot in &mut buf[offset + copy_len..offset + width] {
        *slot = b' ';
    }
    Ok(())
}

/// Writes as many whole UTF-8 codepoints of `s` as fit in `width` bytes,
/// truncating on a codepoint boundary, then pads the remainder with `pad`.
pub fn write_utf8(buf: &mut [u8], offset: usize, s: &str, width: usize, pad: u8) -> Result<()> {
    check_bounds(buf, offset, width)?;
    let mut copy_len = 0usize;
    for (idx, _) in s.char_indices() {
        if idx > width {
            break;
        }
        copy_len = idx;
    }
    if s.len() <= width {
        copy_len = s.len();
    }
    let bytes = s.as_bytes();
    buf[offset..offset + copy_len].copy_from_slice(&bytes[..copy_len]);
    for slot in &mut buf[offset + copy_len..offset + width] {
        *slot = pad;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_pads_remainder_with_spaces() {
        let mut buf = [0u8; 8];
        write_ascii(&mut buf, 0, "DATA", 8).unwrap();
        assert_eq!(&buf, b"DATA    ");
    }

    #[test]
    fn utf8_truncates_on_codepoint_boundary() {
        let mut buf = [0u8; 4];
        // U+1F601 is 4 UTF-8 bytes; it fits exactly in a 4-byte field.
        write_utf8(&mut buf, 0, "\u{1F601}", 4, b' ').unwrap();
        assert_eq!(&buf, "\u{1F601}".as_bytes());
    }

    #[test]
    fn utf8_truncates_when_codepoint_does_not_fit() {
        let mut buf = [0u8; 3];
        write_utf8(&mut buf, 0, "\u{1F601}", 3, b' ').unwrap();
        assert_eq!(&buf, b"   ");
    }

    #[test]
    fn write_out_of_bounds_fails() {
        let mut buf = [0u8; 4];
        assert!(write8(&mut buf, 0, 1).is_err());
    }
}
