//! The subheader-counts record. A full signature directory describing every
//! other subheader kind's count would only matter to a reader, which is out
//! of scope here; we emit the fixed-size record readers expect with the one
//! documented "unknown" constant SAS itself always writes.

use crate::error::Result;
use crate::primitives::write_u32;

pub const SIZE: usize = 600;
pub const SIGNATURE: [u8; 8] = [0x00, 0xFC, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];

/// The constant SAS writes at offset 112; preserved bit-exact for reader
/// compatibility even though its meaning is undocumented upstream.
const UNKNOWN_CONSTANT: u32 = 1804;

#[derive(Debug, Clone, Copy, Default)]
pub struct SubheaderCounts;

impl SubheaderCounts {
    pub fn write(&self, buf: &mut [u8], offset: usize) -> Result<()> {
        buf[offset..offset + 8].copy_from_slice(&SIGNATURE);
        write_u32(buf, offset + 112, UNKNOWN_CONSTANT)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_signature_and_unknown_constant() {
        let mut buf = vec![0u8; SIZE];
        SubheaderCounts.write(&mut buf, 0).unwrap();
        assert_eq!(&buf[0..8], &SIGNATURE);
        assert_eq!(u32::from_le_bytes(buf[112..116].try_into().unwrap()), 1804);
    }
}
