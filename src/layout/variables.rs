//! Physical row layout: where each variable's bytes land within an
//! observation, and how to encode a caller-supplied row into those bytes.

use time::Date;

use crate::error::{Error, Result};
use crate::metadata::{MissingValue, Value, Variable, VariableKind};
use crate::primitives::{write_ascii, write_f64};

const SAS_EPOCH_YEAR: i32 = 1960;

fn sas_epoch() -> Date {
    Date::from_calendar_date(SAS_EPOCH_YEAR, time::Month::January, 1)
        .expect("1960-01-01 is a valid calendar date")
}

/// Physical row layout derived from a variable list: all numerics occupy
/// the front of the row in declaration order, followed by all characters.
#[derive(Debug, Clone)]
pub struct VariablesLayout {
    variables: Vec<Variable>,
    physical_offsets: Vec<usize>,
    row_length: usize,
}

impl VariablesLayout {
    /// Builds the physical layout for `variables`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if `variables` is empty.
    pub fn new(variables: Vec<Variable>) -> Result<Self> {
        if variables.is_empty() {
            return Err(Error::argument(
                "a dataset must declare at least one variable",
            ));
        }

        let mut physical_offsets = vec![0usize; variables.len()];
        let mut cursor = 0usize;
        for (index, variable) in variables.iter().enumerate() {
            if variable.is_numeric() {
                physical_offsets[index] = cursor;
                cursor += usize::from(variable.length);
            }
        }
        for (index, variable) in variables.iter().enumerate() {
            if !variable.is_numeric() {
                physical_offsets[index] = cursor;
                cursor += usize::from(variable.length);
            }
        }
        let row_length = cursor.div_ceil(8) * 8;

        Ok(Self {
            variables,
            physical_offsets,
            row_length,
        })
    }

    #[must_use]
    pub fn total_variables(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    #[must_use]
    pub fn physical_offset(&self, index: usize) -> usize {
        self.physical_offsets[index]
    }

    #[must_use]
    pub const fn row_length(&self) -> usize {
        self.row_length
    }

    /// Encodes one observation into `buf[offset..offset + row_length]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if `values.len()` does not match the
    /// variable count, if a numeric variable is given a string (or any
    /// value other than null, a missing sentinel, an integer, a float, or
    /// a date), if a character variable is given anything other than a
    /// UTF-8 string no longer than its declared length, or if a character
    /// variable is given a missing-value sentinel.
    pub fn write_observation(&self, buf: &mut [u8], offset: usize, values: &[Value]) -> Result<()> {
        if values.len() != self.variables.len() {
            return Err(Error::argument(format!(
                "expected {} values per observation, got {}",
                self.variables.len(),
                values.len()
            )));
        }

        for (index, (variable, value)) in self.variables.iter().zip(values).enumerate() {
            let field_offset = offset + self.physical_offsets[index];
            match variable.kind {
                VariableKind::Numeric => {
                    let bits = Self::encode_numeric(value)?;
                    write_f64(buf, field_offset, bits)?;
                }
                VariableKind::Character => {
                    let Value::Str(text) = value else {
                        return Err(Error::argument(
                            "character values must be strings; missing values are not valid for character variables",
                        ));
                    };
                    if text.len() > usize::from(variable.length) {
                        return Err(Error::argument(format!(
                            "value for '{}' exceeds its declared length of {} bytes",
                            variable.name, variable.length
                        )));
                    }
                    write_ascii_or_utf8(buf, field_offset, text, usize::from(variable.length))?;
                }
            }
        }
        Ok(())
    }

    fn encode_numeric(value: &Value) -> Result<f64> {
        match value {
            Value::Null => Ok(MissingValue::Standard.raw_double()),
            Value::Missing(missing) => Ok(missing.raw_double()),
            Value::Integer(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            Value::Date(date) => {
                let days = (*date - sas_epoch()).whole_days();
                Ok(days as f64)
            }
            Value::Str(_) => Err(Error::argument(
                "NUMERIC values must be null or MissingValue|date|number",
            )),
        }
    }
}

/// Writes `text` left-aligned into `width` bytes, padding the remainder
/// with ASCII spaces. `text` has already been validated not to exceed
/// `width` bytes when UTF-8 encoded.
fn write_ascii_or_utf8(buf: &mut [u8], offset: usize, text: &str, width: usize) -> Result<()> {
    if text.is_ascii() {
        return write_ascii(buf, offset, text, width);
    }
    if offset + width > buf.len() {
        return Err(Error::state(format!(
            "write of {width} bytes at offset {offset} exceeds buffer length {}",
            buf.len()
        )));
    }
    let bytes = text.as_bytes();
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    for slot in &mut buf[offset + bytes.len()..offset + width] {
        *slot = b' ';
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Format;

    fn numeric(name: &str) -> Variable {
        Variable::new(
            name,
            VariableKind::Numeric,
            8,
            "",
            Format::UNSPECIFIED,
            Format::UNSPECIFIED,
        )
        .unwrap()
    }

    fn character(name: &str, length: u16) -> Variable {
        Variable::new(
            name,
            VariableKind::Character,
            length,
            "",
            Format::UNSPECIFIED,
            Format::UNSPECIFIED,
        )
        .unwrap()
    }

    #[test]
    fn numerics_precede_characters_with_no_gaps() {
        let layout = VariablesLayout::new(vec![
            character("c1", 3),
            numeric("n1"),
            character("c2", 5),
            numeric("n2"),
        ])
        .unwrap();
        // n1, n2 (declaration order among numerics) first, then c1, c2.
        assert_eq!(layout.physical_offset(1), 0); // n1
        assert_eq!(layout.physical_offset(3), 8); // n2
        assert_eq!(layout.physical_offset(0), 16); // c1
        assert_eq!(layout.physical_offset(2), 19); // c2
        // 16 + 3 + 5 = 24, already a multiple of 8.
        assert_eq!(layout.row_length(), 24);
    }

    #[test]
    fn row_length_rounds_up_to_multiple_of_eight() {
        let layout = VariablesLayout::new(vec![numeric("n1"), character("c1", 1)]).unwrap();
        assert_eq!(layout.row_length(), 16);
    }

    #[test]
    fn rejects_wrong_arity_observation() {
        let layout = VariablesLayout::new(vec![numeric("n1")]).unwrap();
        let mut buf = vec![0u8; layout.row_length()];
        let err = layout.write_observation(&mut buf, 0, &[]).unwrap_err();
        assert!(matches!(err, Error::Argument { .. }));
    }

    #[test]
    fn character_value_exceeding_length_is_rejected() {
        let layout = VariablesLayout::new(vec![character("c1", 2)]).unwrap();
        let mut buf = vec![0u8; layout.row_length()];
        let err = layout
            .write_observation(&mut buf, 0, &[Value::str("abc")])
            .unwrap_err();
        assert!(matches!(err, Error::Argument { .. }));
    }

    #[test]
    fn missing_value_on_character_variable_is_rejected() {
        let layout = VariablesLayout::new(vec![character("c1", 2)]).unwrap();
        let mut buf = vec![0u8; layout.row_length()];
        let err = layout
            .write_observation(&mut buf, 0, &[Value::Missing(MissingValue::Standard)])
            .unwrap_err();
        assert!(matches!(err, Error::Argument { .. }));
    }

    #[test]
    fn null_numeric_encodes_as_standard_missing() {
        let layout = VariablesLayout::new(vec![numeric("n1")]).unwrap();
        let mut buf = vec![0u8; layout.row_length()];
        layout.write_observation(&mut buf, 0, &[Value::Null]).unwrap();
        assert_eq!(f64::from_le_bytes(buf.try_into().unwrap()).to_bits(), MissingValue::Standard.raw_bits());
    }

    #[test]
    fn letter_missing_value_matches_documented_bit_pattern() {
        let mut buf = [0u8; 8];
        write_f64(&mut buf, 0, MissingValue::letter('A').unwrap().raw_double()).unwrap();
        assert_eq!(buf, [0x00, 0x00, 0x00, 0x00, 0x00, 0xFD, 0xFF, 0xFF]);
    }

    #[test]
    fn non_ascii_character_value_writes_utf8_then_spaces() {
        let layout = VariablesLayout::new(vec![character("emoji", 8)]).unwrap();
        let mut buf = vec![0u8; layout.row_length()];
        layout
            .write_observation(&mut buf, 0, &[Value::str("\u{1F601}")])
            .unwrap();
        assert_eq!(&buf[0..4], &[0xF0, 0x9F, 0x98, 0x81]);
        assert_eq!(&buf[4..8], b"    ");
    }
}
