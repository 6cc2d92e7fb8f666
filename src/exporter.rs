//! Orchestrator and stream entry point. Builds the schema-derived layout,
//! synthesizes every required subheader in the documented order, streams
//! rows through the page layout, and flushes the finished file on close.
//!
//! Everything interesting happens in [`VariablesLayout`], [`PageLayout`],
//! and the subheader renderers; this module is glue.

use std::io::Write;

use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::header::FileHeader;
use crate::layout::{TextRef, VariablesLayout};
use crate::metadata::{Dataset, Value};
use crate::page::Sas7bdatPage;
use crate::page_layout::PageLayout;
use crate::subheaders::column_attributes::ColumnAttributeEntry;
use crate::subheaders::{
    column_attributes, column_list, column_name, ColumnAttributes, ColumnFormat, ColumnList,
    ColumnName, ColumnSize, RowSize, RowSizeHandle, SubheaderCounts, SubheaderRecord,
};

/// Literal creator-proc string SAS itself always writes.
const CREATOR_PROC: &str = "DATASTEP";
/// Literal dataset-type string for an ordinary (non-view) dataset.
const DATASET_TYPE: &str = "DATA";

/// Per-variable column-text references collected while walking the schema,
/// reused when rendering `ColumnName` and `ColumnFormat`.
struct VariableText {
    name: TextRef,
    label: TextRef,
    input_format_name: TextRef,
    output_format_name: TextRef,
}

/// Streaming sas7bdat writer. One `Writer` corresponds to one output file
/// and is not thread-safe; it holds no internal locking.
pub struct Writer<W: Write> {
    sink: W,
    page_layout: Option<PageLayout>,
    row_size: RowSizeHandle,
    creation_time: OffsetDateTime,
    page_size: u32,
    expected_row_count: u64,
    observations_written: u64,
    closed: bool,
}

impl<W: Write> Writer<W> {
    /// Builds the full metadata section (every subheader the schema
    /// requires, in the documented order) and returns a writer ready to
    /// accept observations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if `dataset` has no variables or any
    /// variable/format is invalid, or [`Error::State`] if the schema cannot
    /// be laid out (e.g. more pages than fit in a signed 16-bit count).
    pub fn new(sink: W, dataset: Dataset, expected_row_count: u64, creation_time: OffsetDateTime) -> Result<Self> {
        let Dataset { label, variables, .. } = dataset;
        let total_variables = variables.len();
        let variables_layout = VariablesLayout::new(variables)?;
        let row_length = variables_layout.row_length();
        let page_size = Sas7bdatPage::calculate_page_size(row_length);
        let mut page_layout = PageLayout::new(page_size, variables_layout);

        let row_size = RowSize::new_handle();
        page_layout.add_subheader(SubheaderRecord::RowSize(row_size.clone()))?;
        let (column_size_page, column_size_position) =
            page_layout.add_subheader(SubheaderRecord::ColumnSize(ColumnSize::new(total_variables as u64)))?;
        page_layout.add_subheader(SubheaderRecord::SubheaderCounts(SubheaderCounts))?;

        let dataset_type_ref = page_layout.add_text(DATASET_TYPE)?;
        let dataset_label_ref = page_layout.add_text(&label)?;
        let creator_proc_ref = page_layout.add_text(CREATOR_PROC)?;

        let variables_snapshot = page_layout.variables_layout().variables().to_vec();
        let variable_names_total: u64 = variables_snapshot.iter().map(|v| v.name.len() as u64).sum();
        let max_name_len = variables_snapshot.iter().map(|v| v.name.len()).max().unwrap_or(0);
        let max_label_len = variables_snapshot.iter().map(|v| v.label.len()).max().unwrap_or(0);

        let mut variable_text = Vec::with_capacity(total_variables);
        for variable in &variables_snapshot {
            let name = page_layout.add_text(&variable.name)?;
            let label = page_layout.add_text(&variable.label)?;
            let input_format_name = page_layout.add_text(&variable.input_format.name)?;
            let output_format_name = page_layout.add_text(&variable.output_format.name)?;
            variable_text.push(VariableText {
                name,
                label,
                input_format_name,
                output_format_name,
            });
        }
        page_layout.finalize_text()?;

        let mut last_subheader_position = (column_size_page, column_size_position);

        // ColumnAttributes, split across subheaders to fit.
        let offsets: Vec<usize> = (0..total_variables)
            .map(|i| page_layout.variables_layout().physical_offset(i))
            .collect();
        let mut next = 0usize;
        while next < total_variables {
            let capacity = ColumnAttributes::capacity(crate::subheaders::MAX_VARIABLE_SUBHEADER_SIZE).max(1);
            let end = (next + capacity).min(total_variables);
            let entries = (next..end)
                .map(|i| ColumnAttributeEntry {
                    physical_offset: offsets[i] as u64,
                    length: u32::from(variables_snapshot[i].length),
                    variable_number: (i + 1) as u16,
                    column_type: if variables_snapshot[i].is_numeric() {
                        column_attributes::NUMERIC_TYPE_CODE
                    } else {
                        column_attributes::CHARACTER_TYPE_CODE
                    },
                })
                .collect();
            last_subheader_position =
                page_layout.add_subheader(SubheaderRecord::ColumnAttributes(ColumnAttributes { entries }))?;
            next = end;
        }

        // ColumnName, split across subheaders to fit.
        let mut next = 0usize;
        while next < total_variables {
            let capacity = column_name::ColumnName::capacity(crate::subheaders::MAX_VARIABLE_SUBHEADER_SIZE).max(1);
            let end = (next + capacity).min(total_variables);
            let entries = (next..end).map(|i| variable_text[i].name).collect();
            last_subheader_position =
                page_layout.add_subheader(SubheaderRecord::ColumnName(ColumnName { entries }))?;
            next = end;
        }

        // One ColumnFormat per variable, in order.
        let mut first_column_format_position = None;
        for (i, variable) in variables_snapshot.iter().enumerate() {
            let text = &variable_text[i];
            let format = ColumnFormat {
                output_width: variable.output_format.width,
                output_digits: variable.output_format.digits,
                input_width: variable.input_format.width,
                input_digits: variable.input_format.digits,
                input_format: text.input_format_name,
                output_format: text.output_format_name,
                label: text.label,
            };
            let position = page_layout.add_subheader(SubheaderRecord::ColumnFormat(format))?;
            if first_column_format_position.is_none() {
                first_column_format_position = Some(position);
            }
            last_subheader_position = position;
        }
        let first_column_format_position = first_column_format_position.unwrap_or(last_subheader_position);

        // ColumnList, split across subheaders to fit.
        let mut next = 0usize;
        while next < total_variables {
            let capacity = column_list::ColumnList::capacity(crate::subheaders::MAX_VARIABLE_SUBHEADER_SIZE).max(1);
            let end = (next + capacity).min(total_variables);
            let variable_numbers = (next..end).map(|i| (i + 1) as u16).collect();
            last_subheader_position =
                page_layout.add_subheader(SubheaderRecord::ColumnList(ColumnList { variable_numbers }))?;
            next = end;
        }

        page_layout.finalize_metadata();

        {
            let mut row_size_mut = row_size.borrow_mut();
            row_size_mut.row_length = row_length as u64;
            row_size_mut.page_size = page_size as u64;
            row_size_mut.initial_page_sequence = page_layout.initial_page_sequence();
            row_size_mut.aggregate_variable_name_length = variable_names_total;
            row_size_mut.max_variable_name_length = max_name_len as u16;
            row_size_mut.max_variable_label_length = max_label_len as u16;
            row_size_mut.column_text_subheader_count = page_layout.column_text_subheader_count();
            row_size_mut.max_obs_per_data_page =
                Sas7bdatPage::max_observations_per_data_page(page_size, row_length).min(65535) as u16;
            row_size_mut.max_obs_on_mixed_page = page_layout.current_page_row_capacity();
            row_size_mut.dataset_type = dataset_type_ref;
            row_size_mut.dataset_label = dataset_label_ref;
            row_size_mut.creator_proc = creator_proc_ref;
            // Tolerated garbage fields: SAS emits these even though no
            // distinct string backs them on a writer-produced file.
            row_size_mut.compression_algorithm_name = TextRef::EMPTY;
            row_size_mut.second_entry = TextRef::EMPTY;
            row_size_mut.page_index_of_column_size = column_size_page;
            row_size_mut.position_of_column_size = column_size_position;
            row_size_mut.page_of_last_subheader = last_subheader_position.0;
            row_size_mut.position_of_last_subheader = last_subheader_position.1;
            row_size_mut.page_of_first_column_format = first_column_format_position.0;
            row_size_mut.position_of_first_column_format = first_column_format_position.1;
        }

        Ok(Self {
            sink,
            page_layout: Some(page_layout),
            row_size,
            creation_time,
            page_size: page_size as u32,
            expected_row_count,
            observations_written: 0,
            closed: false,
        })
    }

    /// Encodes and places one observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] on a wrong-arity or mis-typed observation,
    /// [`Error::State`] if the file would need more than 32767 pages, or
    /// [`Error::State`] if the writer is already closed.
    pub fn write_observation(&mut self, values: &[Value]) -> Result<()> {
        if self.closed {
            return Err(Error::state("cannot write an observation after close"));
        }
        let page_layout = self
            .page_layout
            .as_mut()
            .expect("page_layout is only taken by close, which marks the writer closed");
        let (page, block) = page_layout.add_observation(values)?;
        {
            let mut row_size = self.row_size.borrow_mut();
            if self.observations_written == 0 {
                row_size.page_of_first_observation = page;
                row_size.block_index_of_first_observation = block;
            }
            row_size.page_of_last_observation = page;
            row_size.block_index_of_last_observation = block;
        }
        self.observations_written += 1;
        Ok(())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.expected_row_count != 0 && self.observations_written >= self.expected_row_count
    }

    /// Finalizes the back-referenced row-size fields, writes the file
    /// header, then every page, to the sink. Idempotent: a second call is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if writing to the sink fails.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let page_layout = self
            .page_layout
            .take()
            .expect("page_layout is only taken once, right here");

        let total_pages = page_layout.total_pages();
        {
            let mut row_size = self.row_size.borrow_mut();
            row_size.total_observations = self.observations_written;
            row_size.observations_in_dataset = self.observations_written;
        }

        let header = FileHeader {
            file_label: String::new(),
            dataset_type: DATASET_TYPE.to_owned(),
            creation_time: self.creation_time,
            header_size: FileHeader::header_size_for(self.page_size),
            page_size: self.page_size,
            total_pages,
            initial_page_sequence: page_layout.initial_page_sequence(),
        };
        let mut header_buf = vec![0u8; header.header_size as usize];
        header.write(&mut header_buf)?;
        self.sink.write_all(&header_buf)?;

        let page_size = self.page_size as usize;
        for page in page_layout.into_pages() {
            let mut buf = vec![0u8; page_size];
            page.write(&mut buf)?;
            self.sink.write_all(&buf)?;
        }

        self.closed = true;
        Ok(())
    }
}

/// One-shot export: builds the writer, streams every observation, and
/// closes.
///
/// # Errors
///
/// See [`Writer::new`], [`Writer::write_observation`], [`Writer::close`].
pub fn export_dataset<W: Write>(
    sink: W,
    dataset: Dataset,
    creation_time: OffsetDateTime,
    observations: impl IntoIterator<Item = Vec<Value>>,
) -> Result<()> {
    let observations: Vec<Vec<Value>> = observations.into_iter().collect();
    let mut writer = Writer::new(sink, dataset, observations.len() as u64, creation_time)?;
    for row in &observations {
        writer.write_observation(row)?;
    }
    writer.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{DatasetBuilder, VariableKind};
    use time::macros::datetime;

    fn sample_dataset() -> Dataset {
        DatasetBuilder::new("SAMPLE")
            .with_label("sample dataset")
            .with_variable(DatasetBuilder::variable("id", VariableKind::Numeric, 8).build().unwrap())
            .with_variable(DatasetBuilder::variable("name", VariableKind::Character, 10).build().unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn export_dataset_writes_a_full_page() {
        let mut buf = Vec::new();
        export_dataset(
            &mut buf,
            sample_dataset(),
            datetime!(2024-01-01 0:00 UTC),
            vec![
                vec![Value::Integer(1), Value::str("alice")],
                vec![Value::Integer(2), Value::str("bob")],
            ],
        )
        .unwrap();
        // One header plus at least one full page.
        assert!(buf.len() >= crate::header::SIZE + 65536);
        assert_eq!(&buf[84..92], b"SAS FILE");
    }

    #[test]
    fn writer_rejects_observation_after_close() {
        let mut buf = Vec::new();
        let mut writer = Writer::new(&mut buf, sample_dataset(), 1, datetime!(2024-01-01 0:00 UTC)).unwrap();
        writer.write_observation(&[Value::Integer(1), Value::str("a")]).unwrap();
        writer.close().unwrap();
        let err = writer.write_observation(&[Value::Integer(2), Value::str("b")]).unwrap_err();
        assert!(matches!(err, Error::State { .. }));
    }

    #[test]
    fn is_complete_tracks_expected_row_count() {
        let mut buf = Vec::new();
        let mut writer = Writer::new(&mut buf, sample_dataset(), 2, datetime!(2024-01-01 0:00 UTC)).unwrap();
        assert!(!writer.is_complete());
        writer.write_observation(&[Value::Integer(1), Value::str("a")]).unwrap();
        assert!(!writer.is_complete());
        writer.write_observation(&[Value::Integer(2), Value::str("b")]).unwrap();
        assert!(writer.is_complete());
        writer.close().unwrap();
    }

    #[test]
    fn close_is_idempotent() {
        let mut buf = Vec::new();
        let mut writer = Writer::new(&mut buf, sample_dataset(), 0, datetime!(2024-01-01 0:00 UTC)).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn export_dataset_writes_a_real_file_on_disk() {
        let file = tempfile::NamedTempFile::new().expect("create temp file for writer output");
        export_dataset(
            file.reopen().expect("reopen temp file for writing"),
            sample_dataset(),
            datetime!(2024-01-01 0:00 UTC),
            vec![vec![Value::Integer(1), Value::str("alice")]],
        )
        .unwrap();
        let written = std::fs::read(file.path()).expect("read back temp file");
        assert!(written.len() >= crate::header::SIZE + 65536);
        assert_eq!(&written[84..92], b"SAS FILE");
    }
}
