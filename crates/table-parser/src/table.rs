//! Table structure and parsing from DOM nodes.
//!
//! Row and column spans are only looked at when picking the header row.
//! Spanning cells anywhere else shift the cells after them, so such tables
//! come out misaligned.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use stepkit_core::{Dimension, Result, StepKitError};
use tracing::{debug, instrument};

use crate::dom::DomNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Head,
    Body,
    Foot,
}

impl FromStr for Section {
    type Err = StepKitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "head" => Ok(Section::Head),
            "body" => Ok(Section::Body),
            "foot" => Ok(Section::Foot),
            other => Err(StepKitError::InvalidArgument {
                reason: format!("'{other}' is not a table section, expected head, body or foot"),
            }),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Head => f.write_str("head"),
            Section::Body => f.write_str("body"),
            Section::Foot => f.write_str("foot"),
        }
    }
}

/// Text content of a rendered table, split into its sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Non-blank labels of the first header row without column-spanning cells.
    pub col_headers: Vec<String>,
    /// Row position of the column under each entry of `col_headers`.
    #[serde(default)]
    pub col_positions: Vec<usize>,
    pub head: Vec<Vec<String>>,
    pub body: Vec<Vec<String>>,
    pub foot: Vec<Vec<String>>,
}

impl Table {
    pub fn section(&self, section: Section) -> &[Vec<String>] {
        match section {
            Section::Head => &self.head,
            Section::Body => &self.body,
            Section::Foot => &self.foot,
        }
    }

    /// Cell at 1-based `row` and `col` of `section`.
    pub fn cell(&self, row: usize, col: usize, section: Section) -> Result<&str> {
        if row < 1 || col < 1 {
            return Err(StepKitError::InvalidArgument {
                reason: format!("table rows and columns start at 1, got row {row} column {col}"),
            });
        }

        let rows = self.section(section);
        let cells = rows.get(row - 1).ok_or(StepKitError::OutOfBounds {
            dimension: Dimension::Row,
            requested: row,
            bound: rows.len(),
        })?;

        cells
            .get(col - 1)
            .map(String::as_str)
            .ok_or(StepKitError::OutOfBounds {
                dimension: Dimension::Column,
                requested: col,
                bound: cells.len(),
            })
    }

    /// 0-based row position of the column labelled `header`.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.col_headers
            .iter()
            .position(|h| h == header)
            .map(|label| self.position_of(label))
    }

    fn position_of(&self, label: usize) -> usize {
        self.col_positions.get(label).copied().unwrap_or(label)
    }

    /// `row` reduced to the labelled columns, in header order. Rows of a
    /// table without headers come back whole.
    pub fn labelled_cells<'r>(&self, row: &'r [String]) -> Vec<&'r str> {
        if self.col_headers.is_empty() {
            return row.iter().map(String::as_str).collect();
        }
        (0..self.col_headers.len())
            .map(|label| row.get(self.position_of(label)).map_or("", String::as_str))
            .collect()
    }

    pub(crate) fn require_column(&self, header: &str) -> Result<usize> {
        self.column_index(header)
            .ok_or_else(|| StepKitError::HeaderNotFound {
                table: self.name.clone(),
                reason: format!("no column named '{header}' in {:?}", self.col_headers),
            })
    }

    /// Body values under the given header.
    pub fn column(&self, header: &str) -> Result<Vec<&str>> {
        let index = self.require_column(header)?;
        Ok(self
            .body
            .iter()
            .map(|row| row.get(index).map(String::as_str).unwrap_or_default())
            .collect())
    }

    /// Body row `row` (1-based) paired with the column headers.
    pub fn row_map(&self, row: usize) -> Result<Vec<(&str, &str)>> {
        self.cell(row, 1, Section::Body)?;
        let cells = &self.body[row - 1];
        Ok(self
            .col_headers
            .iter()
            .enumerate()
            .filter_map(|(label, h)| {
                cells
                    .get(self.position_of(label))
                    .map(|c| (h.as_str(), c.as_str()))
            })
            .collect())
    }
}

/// [`Table::cell`] with the section given by name.
pub fn get_cell(table: &Table, row: usize, col: usize, section: &str) -> Result<String> {
    let section = section.parse::<Section>()?;
    table.cell(row, col, section).map(str::to_string)
}

/// Build a [`Table`] from a `<table>` element.
#[instrument(skip(element))]
pub fn parse_table<N: DomNode>(name: &str, element: &N) -> Result<Table> {
    let tag = element.tag_name();
    if tag != "table" {
        return Err(malformed(name, format!("expected a <table> element, found <{tag}>")));
    }

    let mut head_rows = Vec::new();
    let mut body_rows = Vec::new();
    let mut foot_rows = Vec::new();

    for child in element.children() {
        match child.tag_name().as_str() {
            "thead" => head_rows.extend(rows_of(&child)),
            "tbody" => body_rows.extend(rows_of(&child)),
            "tfoot" => foot_rows.extend(rows_of(&child)),
            "tr" => body_rows.push(child),
            _ => {}
        }
    }

    let (col_positions, col_headers) = if head_rows.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        header_columns(name, &head_rows)?.into_iter().unzip()
    };

    let table = Table {
        name: name.to_string(),
        col_headers,
        col_positions,
        head: section_text(name, Section::Head, &head_rows)?,
        body: section_text(name, Section::Body, &body_rows)?,
        foot: section_text(name, Section::Foot, &foot_rows)?,
    };

    debug!(
        head = table.head.len(),
        body = table.body.len(),
        foot = table.foot.len(),
        "parsed table"
    );
    Ok(table)
}

/// Header labels from the first header row that has no cell spanning
/// several columns. Rows with spanning cells are usually group headings.
pub fn find_header_columns<N: DomNode>(table: &str, head_rows: &[N]) -> Result<Vec<String>> {
    Ok(header_columns(table, head_rows)?
        .into_iter()
        .map(|(_, label)| label)
        .collect())
}

/// Non-blank header labels with the position of their cell in the row.
fn header_columns<N: DomNode>(table: &str, head_rows: &[N]) -> Result<Vec<(usize, String)>> {
    if head_rows.is_empty() {
        return Err(StepKitError::HeaderNotFound {
            table: table.to_string(),
            reason: "the table has no header rows".to_string(),
        });
    }

    let row = head_rows
        .iter()
        .find(|row| !cells_of(*row).iter().any(|cell| colspan(cell) > 1))
        .ok_or_else(|| StepKitError::HeaderNotFound {
            table: table.to_string(),
            reason: "every header row has a cell spanning several columns".to_string(),
        })?;

    let cells = cells_of(row);
    if cells.is_empty() {
        return Err(StepKitError::HeaderNotFound {
            table: table.to_string(),
            reason: "the header row has no cells".to_string(),
        });
    }

    Ok(cells
        .iter()
        .map(cell_text)
        .enumerate()
        .filter(|(_, label)| !label.is_empty())
        .collect())
}

fn rows_of<N: DomNode>(group: &N) -> Vec<N> {
    group
        .children()
        .into_iter()
        .filter(|child| child.tag_name() == "tr")
        .collect()
}

fn cells_of<N: DomNode>(row: &N) -> Vec<N> {
    row.children()
        .into_iter()
        .filter(|child| matches!(child.tag_name().as_str(), "td" | "th"))
        .collect()
}

fn colspan<N: DomNode>(cell: &N) -> usize {
    cell.attribute("colspan")
        .and_then(|span| span.trim().parse().ok())
        .unwrap_or(1)
}

fn section_text<N: DomNode>(table: &str, section: Section, rows: &[N]) -> Result<Vec<Vec<String>>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let cells = cells_of(row);
            if cells.is_empty() {
                return Err(malformed(
                    table,
                    format!("row {} of the {section} has no cells", index + 1),
                ));
            }
            Ok(cells.iter().map(cell_text).collect())
        })
        .collect()
}

/// Trimmed text of a cell; form selects report their chosen option.
fn cell_text<N: DomNode>(cell: &N) -> String {
    match cell.first_descendant("select") {
        Some(select) => selected_option_text(&select),
        None => cell.text().trim().to_string(),
    }
}

fn selected_option_text<N: DomNode>(select: &N) -> String {
    let options = select.descendants("option");
    options
        .iter()
        .find(|option| option.attribute("selected").is_some())
        .or_else(|| options.first())
        .map(|option| option.text().trim().to_string())
        .unwrap_or_default()
}

fn malformed(table: &str, reason: String) -> StepKitError {
    StepKitError::MalformedTable {
        table: table.to_string(),
        reason,
    }
}
