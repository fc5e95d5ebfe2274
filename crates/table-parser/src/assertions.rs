//! Assertions comparing a parsed [`Table`] with expected rows.
//!
//! Expected data comes as rows of strings, the way step tables arrive. A cell
//! holding `*` matches any value.

use stepkit_core::{Result, StepKitError};

use crate::table::Table;

pub const WILDCARD: &str = "*";

pub fn cell_matches(expected: &str, actual: &str) -> bool {
    expected == WILDCARD || expected == actual
}

pub fn row_matches<E, A>(expected: &[E], actual: &[A]) -> bool
where
    E: AsRef<str>,
    A: AsRef<str>,
{
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(e, a)| cell_matches(e.as_ref(), a.as_ref()))
}

/// Some body row has every given `(header, value)` pair.
pub fn assert_row_exists(table: &Table, expected: &[(String, String)]) -> Result<()> {
    let columns = expected
        .iter()
        .map(|(header, value)| Ok((table.require_column(header)?, value.as_str())))
        .collect::<Result<Vec<_>>>()?;

    let found = table.body.iter().any(|row| {
        columns.iter().all(|(index, value)| {
            row.get(*index)
                .is_some_and(|actual| cell_matches(value, actual))
        })
    });

    if found {
        Ok(())
    } else {
        Err(StepKitError::assertion(format!(
            "table '{}' has no row matching {:?}",
            table.name, expected
        )))
    }
}

/// Header row and body rows equal `expected` in order.
///
/// `expected[0]` is compared with the column headers. Columns with a blank
/// header take no part in the comparison.
pub fn assert_table_equals(table: &Table, expected: &[Vec<String>]) -> Result<()> {
    let body = check_headers(table, expected)?;
    check_row_count(table, body.len())?;

    for (index, (want, got)) in body.iter().zip(labelled_body(table)).enumerate() {
        if !row_matches(want, &got) {
            return Err(StepKitError::assertion(format!(
                "row {} of table '{}' is {:?}, expected {:?}",
                index + 1,
                table.name,
                got,
                want
            )));
        }
    }
    Ok(())
}

/// Like [`assert_table_equals`] but body rows may appear in any order.
pub fn assert_table_equals_unordered(table: &Table, expected: &[Vec<String>]) -> Result<()> {
    let body = check_headers(table, expected)?;
    check_row_count(table, body.len())?;

    let labelled = labelled_body(table);
    let actual: Vec<&[&str]> = labelled.iter().map(Vec::as_slice).collect();
    match unmatched_row(body, &actual) {
        None => Ok(()),
        Some(row) => Err(StepKitError::assertion(format!(
            "table '{}' has no row left to match {:?}",
            table.name, row
        ))),
    }
}

/// Every expected row appears in the body, each matched by a different row.
///
/// `expected[0]` names the columns to compare; it may be any subset of the
/// table's headers in any order.
pub fn assert_table_contains_rows(table: &Table, expected: &[Vec<String>]) -> Result<()> {
    let Some((headers, rows)) = expected.split_first() else {
        return Ok(());
    };

    let indexes = headers
        .iter()
        .map(|header| table.require_column(header))
        .collect::<Result<Vec<_>>>()?;

    let projected: Vec<Vec<String>> = table
        .body
        .iter()
        .map(|row| {
            indexes
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    let actual: Vec<&[String]> = projected.iter().map(Vec::as_slice).collect();

    match unmatched_row(rows, &actual) {
        None => Ok(()),
        Some(row) => Err(StepKitError::assertion(format!(
            "table '{}' does not contain a row matching {:?} under {:?}",
            table.name, row, headers
        ))),
    }
}

pub fn assert_row_count(table: &Table, expected: usize) -> Result<()> {
    check_row_count(table, expected)
}

fn labelled_body(table: &Table) -> Vec<Vec<&str>> {
    table
        .body
        .iter()
        .map(|row| table.labelled_cells(row))
        .collect()
}

fn check_headers<'e>(table: &Table, expected: &'e [Vec<String>]) -> Result<&'e [Vec<String>]> {
    let (headers, body) = expected
        .split_first()
        .ok_or_else(|| StepKitError::InvalidArgument {
            reason: "expected table needs a header row".to_string(),
        })?;

    if !row_matches(headers, &table.col_headers) {
        return Err(StepKitError::assertion(format!(
            "table '{}' has headers {:?}, expected {:?}",
            table.name, table.col_headers, headers
        )));
    }
    Ok(body)
}

fn check_row_count(table: &Table, expected: usize) -> Result<()> {
    if table.body.len() == expected {
        Ok(())
    } else {
        Err(StepKitError::assertion(format!(
            "table '{}' has {} rows, expected {}",
            table.name,
            table.body.len(),
            expected
        )))
    }
}

/// Pairs each expected row with a distinct matching actual row (bipartite
/// matching with augmenting paths). Returns the first expected row left
/// without a partner, if any.
///
/// Wildcards make greedy pairing unreliable: `[*]` could take the only row
/// a later `[a]` needs.
fn unmatched_row<'e, A: AsRef<str>>(
    expected: &'e [Vec<String>],
    actual: &[&[A]],
) -> Option<&'e Vec<String>> {
    let candidates: Vec<Vec<usize>> = expected
        .iter()
        .map(|want| {
            actual
                .iter()
                .enumerate()
                .filter(|(_, got)| row_matches(want, **got))
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    let mut owner: Vec<Option<usize>> = vec![None; actual.len()];
    for (row, want) in expected.iter().enumerate() {
        let mut visited = vec![false; actual.len()];
        if !augment(row, &candidates, &mut owner, &mut visited) {
            return Some(want);
        }
    }
    None
}

fn augment(
    row: usize,
    candidates: &[Vec<usize>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &slot in &candidates[row] {
        if visited[slot] {
            continue;
        }
        visited[slot] = true;
        let free = match owner[slot] {
            None => true,
            Some(other) => augment(other, candidates, owner, visited),
        };
        if free {
            owner[slot] = Some(row);
            return true;
        }
    }
    false
}
