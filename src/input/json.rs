//! Structured JSON input
//!
//! Accepts a top-level array of records, an object with an
//! `organizations`/`projects` array (audit exports), or the `data` array of a
//! report envelope. Records may be plain strings or objects; audit records
//! carry their id under `organization.id`.

use std::path::Path;

use serde_json::Value;

use super::{RawRecord, RecordKind};
use crate::error::{InputError, Result};

pub(crate) fn parse(path: &Path, content: &str, kind: RecordKind) -> Result<Vec<RawRecord>> {
    let value: Value = serde_json::from_str(content).map_err(|e| InputError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let items = records_of(&value, kind).ok_or_else(|| InputError::Parse {
        path: path.to_path_buf(),
        message: format!(
            "expected an array of records, or an object with a '{}' or 'data' array",
            collection_key(kind)
        ),
    })?;

    Ok(items
        .iter()
        .enumerate()
        .map(|(index, item)| record_from(index + 1, item, kind))
        .collect())
}

fn collection_key(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Organization => "organizations",
        RecordKind::Project => "projects",
    }
}

fn records_of(value: &Value, kind: RecordKind) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map
            .get(collection_key(kind))
            .or_else(|| map.get("data"))
            .and_then(Value::as_array),
        _ => None,
    }
}

fn record_from(line: usize, item: &Value, kind: RecordKind) -> RawRecord {
    if let Value::String(id) = item {
        return RawRecord {
            line,
            id: Some(id.clone()),
            name: None,
        };
    }

    let nested = match kind {
        RecordKind::Organization => "organization",
        RecordKind::Project => "project",
    };

    let id = kind
        .id_columns()
        .iter()
        .find_map(|key| string_at(item, &[*key]))
        .or_else(|| string_at(item, &[nested, "id"]));
    let name = kind
        .name_columns()
        .iter()
        .find_map(|key| string_at(item, &[*key]))
        .or_else(|| string_at(item, &[nested, "name"]));

    RawRecord { line, id, name }
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}
