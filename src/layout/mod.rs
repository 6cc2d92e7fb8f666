//! Row byte layout and the interned column-text table: the two pieces of
//! per-dataset bookkeeping the page packer and subheaders both read from.

pub mod text;
mod variables;

pub use text::{ColumnTextStoreState, TextRef};
pub use variables::VariablesLayout;
