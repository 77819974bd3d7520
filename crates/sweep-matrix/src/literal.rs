//! Array-literal text form for matrices.
//!
//! Rows are separated by `; ` and values by a single space, wrapped in
//! brackets: `[1 0; 0 1]`. This is the array-literal syntax read by the
//! downstream numeric scripts.

use crate::error::MatrixError;
use crate::grid::{Cell, Grid};
use std::fmt::Display;
use std::str::FromStr;

/// Conversion to array-literal text.
pub trait ArrayLiteral {
    fn to_literal(&self) -> String;
}

impl<T: Display> ArrayLiteral for Grid<T> {
    fn to_literal(&self) -> String {
        let rows: Vec<String> = self
            .iter_rows()
            .map(|row| {
                row.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        format!("[{}]", rows.join("; "))
    }
}

impl<T: Display> ArrayLiteral for [T] {
    fn to_literal(&self) -> String {
        let values: Vec<String> = self.iter().map(ToString::to_string).collect();
        format!("[{}]", values.join(" "))
    }
}

/// Split array-literal text into rows of tokens.
///
/// Commas are accepted as value separators. `[]` yields no rows.
pub fn parse_literal(s: &str) -> Result<Vec<Vec<String>>, MatrixError> {
    let inner = s
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| MatrixError::Parse(format!("expected [...], got {:?}", s)))?;

    if inner.trim().is_empty() {
        return Ok(vec![]);
    }

    Ok(inner
        .split(';')
        .map(|row| {
            row.replace(',', " ")
                .split_whitespace()
                .map(str::to_string)
                .collect()
        })
        .collect())
}

fn parse_grid<T: Clone>(
    s: &str,
    parse_value: impl Fn(&str) -> Option<T>,
) -> Result<Grid<T>, MatrixError> {
    let rows = parse_literal(s)?
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|token| {
                    parse_value(token.as_str())
                        .ok_or_else(|| MatrixError::Parse(format!("invalid value {:?}", token)))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Grid::from_rows(rows)
}

fn parse_bit(token: &str) -> Option<u8> {
    match token {
        "0" => Some(0),
        "1" => Some(1),
        _ => None,
    }
}

impl FromStr for Grid<Cell> {
    type Err = MatrixError;

    /// Parse a seed matrix where `*` marks a free cell: `[* 1; 0 *]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_grid(s, |token| match token {
            "*" => Some(Cell::Free),
            other => parse_bit(other).map(Cell::Fixed),
        })
    }
}

impl FromStr for Grid<u8> {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_grid(s, parse_bit)
    }
}
