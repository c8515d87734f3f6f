//! Multi-valued cell codec
//!
//! Room types, furniture, amenities and photo references are lists of strings,
//! but both storage backends only understand scalar cells. Lists are written as
//! a JSON array in a single cell and read back with a decoder that never fails,
//! because older sheets contain plain comma-separated text, lone scalars and
//! hand-edited garbage in these columns.

use serde_json::Value;

/// A single cell as it crosses the storage boundary
///
/// Only the codec and the schema normalizer look inside a `Cell`; records
/// always expose plain `Vec<String>` for list fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cell {
    /// Nothing stored (blank cell, missing column, short row)
    #[default]
    Empty,
    /// Textual form of whatever the backend returned
    Scalar(String),
    /// An already-decoded list (in-memory tables only)
    List(Vec<String>),
}

impl Cell {
    /// Wrap backend text, treating the empty string as a blank cell
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Cell::Empty
        } else {
            Cell::Scalar(text)
        }
    }

    /// Render the cell for a scalar-only backend
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Scalar(s) => s.clone(),
            Cell::List(values) => encode(values),
        }
    }

    /// Borrow the text of a scalar cell, trimmed; blank and list cells give `""`
    pub fn trimmed(&self) -> &str {
        match self {
            Cell::Scalar(s) => s.trim(),
            _ => "",
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Scalar(s) => s.trim().is_empty(),
            Cell::List(_) => false,
        }
    }
}

/// Encode a list of strings as a JSON array
///
/// Non-ASCII text is written as-is. The empty list becomes `[]`, never a blank
/// cell, so an explicitly empty list survives a round trip.
pub fn encode(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| String::from("[]"))
}

/// Decode a stored cell into a list of strings
///
/// Total over every input: lists pass through, blanks become `[]`, JSON arrays
/// are parsed (elements coerced to strings), other JSON scalars become a
/// one-element list, and anything that is not JSON is split on commas.
pub fn decode(cell: &Cell) -> Vec<String> {
    match cell {
        Cell::List(values) => values.clone(),
        Cell::Empty => Vec::new(),
        Cell::Scalar(text) => decode_text(text),
    }
}

fn decode_text(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items.into_iter().filter_map(value_to_string).collect(),
        Ok(Value::Null) => Vec::new(),
        Ok(scalar) => value_to_string(scalar).into_iter().collect(),
        Err(_) => split_delimited(text),
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn split_delimited(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

/// Join a list for human display (`"a, b, c"`, or `""` when empty)
pub fn join_human(values: &[String]) -> String {
    values.join(", ")
}
