//! Turns rendered HTML tables into indexed text for data-driven step
//! assertions.
//!
//! ```text
//! | Name | Age |      col_headers = ["Name", "Age"]
//! |------|-----|      head = [["Name", "Age"]]
//! | Ann  | 30  |      body = [["Ann", "30"]]
//! ```
//!
//! Cells are addressed 1-based through [`Table::cell`] / [`get_cell`].

pub mod assertions;
pub mod dom;
mod parser;
mod table;

pub use dom::{DomNode, MemoryNode, MemoryPage, Page};
pub use parser::{find_table, TableParser};
pub use table::{find_header_columns, get_cell, parse_table, Section, Table};

// Re-export core types for convenience
pub use stepkit_core::{Result, StepKitError};
