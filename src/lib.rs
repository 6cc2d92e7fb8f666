//! Writer for the sas7bdat binary table format (64-bit little-endian Unix
//! variant), byte-compatible with SAS's own writer on Linux/x86_64.
//!
//! The public surface is [`metadata::DatasetBuilder`] to describe a schema,
//! then either [`exporter::export_dataset`] for a one-shot write or
//! [`exporter::Writer`] to stream observations one at a time.

pub mod error;
pub mod exporter;
pub mod header;
pub mod layout;
pub mod logger;
pub mod metadata;
pub mod page;
pub mod page_layout;
pub mod primitives;
pub mod sequence;
pub mod subheaders;

pub use error::{Error, Result};
pub use exporter::{export_dataset, Writer};
pub use metadata::{Dataset, DatasetBuilder, Format, MissingValue, Value, Variable, VariableBuilder, VariableKind};

/// Starts a streaming writer. Thin wrapper over [`Writer::new`] matching the
/// documented `stream_writer(sink, metadata, total_observations)` entry
/// point.
///
/// # Errors
///
/// See [`Writer::new`].
pub fn stream_writer<W: std::io::Write>(
    sink: W,
    dataset: Dataset,
    total_observations: u64,
) -> Result<Writer<W>> {
    Writer::new(sink, dataset, total_observations, now())
}

fn now() -> time::OffsetDateTime {
    time::OffsetDateTime::now_utc()
}
