use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use time::OffsetDateTime;

use sas7bdat_writer_rs::metadata::{DatasetBuilder, Format, MissingValue, Value, VariableKind};
use sas7bdat_writer_rs::{export_dataset, Dataset};

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "sas7bw", version, about = "Write a sas7bdat from a JSON schema and row data")]
struct Cli {
    /// JSON file describing the dataset schema (see README for shape).
    #[arg(long)]
    schema: PathBuf,

    /// JSON file holding an array of rows, each an array of cell values.
    #[arg(long)]
    data: PathBuf,

    /// Output .sas7bdat path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Deserialize)]
struct SchemaFile {
    table_name: String,
    #[serde(default)]
    label: String,
    variables: Vec<VariableSpec>,
}

#[derive(Deserialize)]
struct VariableSpec {
    name: String,
    kind: VariableKindSpec,
    length: u16,
    #[serde(default)]
    label: String,
    #[serde(default)]
    input_format: Option<FormatSpec>,
    #[serde(default)]
    output_format: Option<FormatSpec>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum VariableKindSpec {
    Numeric,
    Character,
}

#[derive(Deserialize)]
struct FormatSpec {
    name: String,
    #[serde(default)]
    width: u16,
    #[serde(default)]
    digits: u16,
}

/// One JSON-encoded cell. Numbers map to `Float`/`Integer`, strings to
/// `Str`, `null` to `Null`, and the object form `{"missing": "A"}` or
/// `{"missing": "standard"}` to a `MissingValue` sentinel.
#[derive(Deserialize)]
#[serde(untagged)]
enum CellSpec {
    Null,
    Number(f64),
    Text(String),
    Missing { missing: String },
}

fn build_dataset(schema: SchemaFile) -> Result<Dataset, AnyError> {
    let mut builder = DatasetBuilder::new(schema.table_name).with_label(schema.label);
    for spec in schema.variables {
        let kind = match spec.kind {
            VariableKindSpec::Numeric => VariableKind::Numeric,
            VariableKindSpec::Character => VariableKind::Character,
        };
        let mut variable_builder = DatasetBuilder::variable(spec.name, kind, spec.length).label(spec.label);
        if let Some(format) = spec.input_format {
            variable_builder = variable_builder.input_format(Format::new(format.name, format.width, format.digits)?);
        }
        if let Some(format) = spec.output_format {
            variable_builder = variable_builder.output_format(Format::new(format.name, format.width, format.digits)?);
        }
        builder = builder.with_variable(variable_builder.build()?);
    }
    Ok(builder.build()?)
}

fn convert_cell(cell: CellSpec) -> Result<Value, AnyError> {
    match cell {
        CellSpec::Null => Ok(Value::Null),
        CellSpec::Number(n) => Ok(Value::Float(n)),
        CellSpec::Text(s) => Ok(Value::Str(s)),
        CellSpec::Missing { missing } => {
            let value = match missing.as_str() {
                "standard" => MissingValue::Standard,
                "underscore" => MissingValue::Underscore,
                letter if letter.len() == 1 => {
                    let ch = letter.chars().next().expect("checked len == 1");
                    MissingValue::letter(ch.to_ascii_uppercase())
                        .ok_or_else(|| format!("'{letter}' is not a valid missing-value letter"))?
                }
                other => return Err(format!("unrecognized missing-value kind '{other}'").into()),
            };
            Ok(Value::Missing(value))
        }
    }
}

fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    let schema: SchemaFile = serde_json::from_reader(File::open(&cli.schema)?)?;
    let rows: Vec<Vec<CellSpec>> = serde_json::from_reader(File::open(&cli.data)?)?;

    let dataset = build_dataset(schema)?;
    let observations = rows
        .into_iter()
        .map(|row| row.into_iter().map(convert_cell).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;

    let sink = BufWriter::new(File::create(&cli.out)?);
    export_dataset(sink, dataset, OffsetDateTime::now_utc(), observations)?;

    println!("wrote {}", cli.out.display());
    Ok(())
}
