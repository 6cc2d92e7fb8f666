//! Public data model: variable definitions, formats, missing-value sentinels,
//! and the row values a caller supplies to the writer.

mod builder;
mod value;

pub use builder::{DatasetBuilder, VariableBuilder};
pub use value::{MissingValue, Value};

/// A validated dataset schema: its SAS member name, label, and ordered
/// variable list, ready to hand to the writer.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub table_name: String,
    pub label: String,
    pub variables: Vec<Variable>,
}

use std::borrow::Cow;

use crate::error::{Error, Result};

/// Maximum length, in bytes, of a variable name.
pub const MAX_NAME_LEN: usize = 32;
/// Maximum length, in bytes, of a variable label.
pub const MAX_LABEL_LEN: usize = 256;
/// Maximum length, in bytes, of a numeric or character variable.
pub const MAX_VARIABLE_LEN: u16 = 32767;
/// Fixed storage width of a numeric variable.
pub const NUMERIC_STORAGE_LEN: u16 = 8;
/// Maximum number of variables a dataset may declare: the 1-based variable
/// number written into `ColumnAttributes`/`ColumnList` entries must fit in a
/// `u16`, and the file format's own hard cap is `Short.MAX_VALUE`.
pub const MAX_VARIABLES: usize = 32767;

/// Whether a variable holds numbers or text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Numeric,
    Character,
}

/// An input or output format attached to a variable.
///
/// A `$`-prefixed name denotes a character format; an unprefixed name is
/// numeric. `Format::UNSPECIFIED` carries neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub name: String,
    pub width: u16,
    pub digits: u16,
}

impl Format {
    /// The empty, type-neutral format every variable starts with.
    pub const UNSPECIFIED: Format = Format {
        name: String::new(),
        width: 0,
        digits: 0,
    };

    /// Builds a format, validating the name length and field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if `name` exceeds 32 UTF-8 bytes.
    pub fn new(name: impl Into<String>, width: u16, digits: u16) -> Result<Self> {
        let name = name.into();
        if name.len() > MAX_NAME_LEN {
            return Err(Error::argument(
                "format names must not be longer than 32 bytes when encoded with UTF-8",
            ));
        }
        Ok(Self {
            name,
            width,
            digits,
        })
    }

    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        self.name.is_empty() && self.width == 0 && self.digits == 0
    }

    #[must_use]
    pub fn is_character(&self) -> bool {
        self.name.starts_with('$')
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

/// An immutable column definition.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub length: u16,
    pub label: String,
    pub input_format: Format,
    pub output_format: Format,
}

impl Variable {
    /// Builds and validates a variable definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if the name is empty or exceeds 32 UTF-8
    /// bytes, the label exceeds 256 UTF-8 bytes, the length is out of range
    /// (or not 8 for a numeric variable), or a non-unspecified format's type
    /// does not match the variable's type.
    pub fn new(
        name: impl Into<String>,
        kind: VariableKind,
        length: u16,
        label: impl Into<String>,
        input_format: Format,
        output_format: Format,
    ) -> Result<Self> {
        let name = name.into();
        let label = label.into();
        if name.is_empty() {
            return Err(Error::argument("variable names must not be empty"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(Error::argument(
                "variable names must not be longer than 32 bytes when encoded with UTF-8",
            ));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(Error::argument(
                "variable labels must not be longer than 256 bytes when encoded with UTF-8",
            ));
        }
        if length == 0 {
            return Err(Error::argument("variable length must be at least 1"));
        }
        if length > MAX_VARIABLE_LEN {
            return Err(Error::argument(
                "variable length must not exceed 32767 bytes",
            ));
        }
        match kind {
            VariableKind::Numeric if length != NUMERIC_STORAGE_LEN => {
                return Err(Error::argument("numeric variables must have length 8"));
            }
            _ => {}
        }
        Self::validate_format_type(kind, &input_format)?;
        Self::validate_format_type(kind, &output_format)?;
        Ok(Self {
            name,
            kind,
            length,
            label,
            input_format,
            output_format,
        })
    }

    fn validate_format_type(kind: VariableKind, format: &Format) -> Result<()> {
        if format.is_unspecified() {
            return Ok(());
        }
        let mismatch = match kind {
            VariableKind::Character => !format.is_character(),
            VariableKind::Numeric => format.is_character(),
        };
        if mismatch {
            return Err(Error::argument(Cow::Owned(format!(
                "format '{}' does not match the variable's type",
                format.name
            ))));
        }
        Ok(())
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self.kind, VariableKind::Numeric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_variable_rejects_length_over_max() {
        let err = Variable::new(
            "v",
            VariableKind::Character,
            MAX_VARIABLE_LEN + 1,
            "",
            Format::UNSPECIFIED,
            Format::UNSPECIFIED,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Argument { .. }));
    }

    #[test]
    fn character_variable_accepts_length_at_max() {
        let variable = Variable::new(
            "v",
            VariableKind::Character,
            MAX_VARIABLE_LEN,
            "",
            Format::UNSPECIFIED,
            Format::UNSPECIFIED,
        )
        .unwrap();
        assert_eq!(variable.length, MAX_VARIABLE_LEN);
    }
}
