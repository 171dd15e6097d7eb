//! CSV input with a header row

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::{RawRecord, RecordKind};
use crate::error::{InputError, Result};

pub(crate) fn parse(path: &Path, content: &str, kind: RecordKind) -> Result<Vec<RawRecord>> {
    let parse_error = |message: String| InputError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| parse_error(e.to_string()))?
        .clone();

    let id_col = find_column(&headers, kind.id_columns()).ok_or_else(|| {
        parse_error(format!(
            "no id column; expected one of: {}",
            kind.id_columns().join(", ")
        ))
    })?;
    let name_col = find_column(&headers, kind.name_columns());

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| parse_error(e.to_string()))?;
        // Header is line 1
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);

        if row.iter().all(str::is_empty) {
            continue;
        }

        records.push(RawRecord {
            line,
            id: row.get(id_col).map(str::to_string),
            name: name_col.and_then(|c| row.get(c)).map(str::to_string),
        });
    }

    Ok(records)
}

/// First header matching any candidate, by candidate preference.
fn find_column(headers: &StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(candidate))
    })
}
