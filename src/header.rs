//! The 512-byte fixed leading record that begins every sas7bdat file.

use time::{Duration, OffsetDateTime};

use crate::error::Result;
use crate::primitives::{write_ascii, write_f64, write_u32, write_u64, write_utf8};

pub const SIZE: usize = 512;

const MAGIC: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc2, 0xea, 0x81, 0x60,
    0xb3, 0x14, 0x11, 0xcf, 0xbd, 0x92, 0x08, 0x00, 0x09, 0xc7, 0x31, 0x8c, 0x18, 0x1f, 0x10, 0x11,
];

/// The fixed platform/structure byte pattern following the magic number for
/// a 64-bit little-endian Unix file.
const PLATFORM_PATTERN: [u8; 52] = [
    0x33, 0x22, 0x00, 0x04, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
];

fn sas_epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
        .replace_date(
            time::Date::from_calendar_date(1960, time::Month::January, 1)
                .expect("1960-01-01 is a valid calendar date"),
        )
        .replace_time(time::Time::MIDNIGHT)
}

/// `(creation_time - 1960-01-01T00:00:00Z)` in whole seconds, as the f64 the
/// format stores.
#[must_use]
pub fn encode_datetime(creation_time: OffsetDateTime) -> f64 {
    let delta: Duration = creation_time - sas_epoch();
    delta.as_seconds_f64()
}

/// The fixed fields of a sas7bdat file header, plus the values only known
/// once the page layout is complete.
#[derive(Debug, Clone)]
pub struct FileHeader {
    pub file_label: String,
    pub dataset_type: String,
    pub creation_time: OffsetDateTime,
    pub header_size: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub initial_page_sequence: u32,
}

impl FileHeader {
    /// Header size is 1024, or the smallest 1024-multiple at least as large
    /// as `page_size` once `page_size` exceeds 64 KiB.
    #[must_use]
    pub fn header_size_for(page_size: u32) -> u32 {
        if page_size > 0x1_0000 {
            page_size.div_ceil(1024) * 1024
        } else {
            1024
        }
    }

    pub fn write(&self, buf: &mut [u8]) -> Result<()> {
        buf[0..32].copy_from_slice(&MAGIC);
        buf[32..84].copy_from_slice(&PLATFORM_PATTERN);
        write_ascii(buf, 84, "SAS FILE", 8)?;
        write_utf8(buf, 92, &self.file_label, 64, b' ')?;
        write_ascii(buf, 156, &self.dataset_type, 8)?;
        // 4 zero bytes at 164..168.
        let creation = encode_datetime(self.creation_time);
        write_f64(buf, 168, creation)?;
        write_f64(buf, 176, creation)?;
        buf[184..200].copy_from_slice(&KNOWN_CONSTANTS_1);
        write_u32(buf, 200, self.header_size)?;
        write_u32(buf, 204, self.page_size)?;
        write_u64(buf, 208, self.total_pages)?;
        // 8 zero bytes at 216..224.
        write_ascii(buf, 224, "9.0401M2", 8)?;
        write_ascii(buf, 232, "Linux", 16)?;
        write_ascii(buf, 248, "4.4.104-18.44", 16)?;
        write_ascii(buf, 264, "", 16)?; // 16 spaces
        write_ascii(buf, 280, "x86_64", 16)?;
        buf[296..300].copy_from_slice(&KNOWN_CONSTANTS_2);
        buf[300..304].copy_from_slice(&KNOWN_CONSTANTS_3);
        buf[304..308].copy_from_slice(&KNOWN_CONSTANTS_4);
        // 16 zero bytes at 308..324.
        write_u32(buf, 324, self.initial_page_sequence)?;
        write_f64(buf, 328, creation)?;
        Ok(())
    }
}

const KNOWN_CONSTANTS_1: [u8; 16] = [0; 16];
const KNOWN_CONSTANTS_2: [u8; 4] = [0x02, 0x00, 0x00, 0x00];
const KNOWN_CONSTANTS_3: [u8; 4] = [0x02, 0x00, 0x00, 0x00];
const KNOWN_CONSTANTS_4: [u8; 4] = [0x02, 0x00, 0x00, 0x00];
