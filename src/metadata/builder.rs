//! Fluent construction of a dataset schema. This is an external collaborator
//! around the writer's core: it validates caller input up front so the core
//! layout and page-packing logic never has to.

use crate::error::{Error, Result};
use crate::metadata::{Dataset, Format, Variable, VariableKind, MAX_VARIABLES};

/// Builds the variable list and dataset-level attributes for a new dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetBuilder {
    table_name: String,
    label: String,
    variables: Vec<Variable>,
}

impl DatasetBuilder {
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            label: String::new(),
            variables: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Appends an already-validated variable to the schema.
    #[must_use]
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Convenience entry point for constructing a variable inline.
    #[must_use]
    pub fn variable(name: impl Into<String>, kind: VariableKind, length: u16) -> VariableBuilder {
        VariableBuilder::new(name, kind, length)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Validates the dataset-level attributes and returns the finished
    /// dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if the table name or label exceed their
    /// fixed widths, or if no variables were added. Returns [`Error::State`]
    /// if more than [`MAX_VARIABLES`] were added: the file format's variable
    /// numbers must fit in a `u16`.
    pub fn build(self) -> Result<Dataset> {
        if self.table_name.is_empty() {
            return Err(Error::argument("dataset table name must not be empty"));
        }
        if self.table_name.len() > 32 {
            return Err(Error::argument(
                "dataset table name must not be longer than 32 bytes when encoded with UTF-8",
            ));
        }
        if self.label.len() > 256 {
            return Err(Error::argument(
                "dataset label must not be longer than 256 bytes when encoded with UTF-8",
            ));
        }
        if self.variables.is_empty() {
            return Err(Error::argument(
                "a dataset must declare at least one variable",
            ));
        }
        if self.variables.len() > MAX_VARIABLES {
            return Err(Error::state(
                "a dataset must not declare more than 32767 variables",
            ));
        }
        Ok(Dataset {
            table_name: self.table_name,
            label: self.label,
            variables: self.variables,
        })
    }
}

/// Fluent builder for a single [`Variable`].
#[derive(Debug, Clone)]
pub struct VariableBuilder {
    name: String,
    kind: VariableKind,
    length: u16,
    label: String,
    input_format: Format,
    output_format: Format,
}

impl VariableBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: VariableKind, length: u16) -> Self {
        Self {
            name: name.into(),
            kind,
            length,
            label: String::new(),
            input_format: Format::UNSPECIFIED,
            output_format: Format::UNSPECIFIED,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn input_format(mut self, format: Format) -> Self {
        self.input_format = format;
        self
    }

    #[must_use]
    pub fn output_format(mut self, format: Format) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn format(self, format: Format) -> Self {
        let format2 = format.clone();
        self.input_format(format).output_format(format2)
    }

    /// Validates and constructs the [`Variable`].
    ///
    /// # Errors
    ///
    /// See [`Variable::new`].
    pub fn build(self) -> Result<Variable> {
        Variable::new(
            self.name,
            self.kind,
            self.length,
            self.label,
            self.input_format,
            self.output_format,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_variable(name: &str) -> Variable {
        DatasetBuilder::variable(name, VariableKind::Numeric, 8).build().unwrap()
    }

    #[test]
    fn build_rejects_more_than_max_variables() {
        let mut builder = DatasetBuilder::new("SAMPLE");
        for i in 0..=MAX_VARIABLES {
            builder = builder.with_variable(numeric_variable(&format!("v{i}")));
        }
        let err = builder.build().unwrap_err();
        assert!(matches!(err, Error::State { .. }));
    }

    #[test]
    fn build_accepts_exactly_max_variables() {
        let mut builder = DatasetBuilder::new("SAMPLE");
        for i in 0..MAX_VARIABLES {
            builder = builder.with_variable(numeric_variable(&format!("v{i}")));
        }
        let dataset = builder.build().unwrap();
        assert_eq!(dataset.variables.len(), MAX_VARIABLES);
    }
}
