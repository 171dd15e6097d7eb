//! Delimited text input: one `id[,name]` per line

use super::RawRecord;

/// Parse a text target list. Blank and `#` comment lines are skipped.
pub(crate) fn parse(content: &str) -> Vec<RawRecord> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }

            let (id, name) = match line.split_once(',') {
                Some((id, name)) => (id, Some(name.trim().to_string())),
                None => (line, None),
            };

            Some(RawRecord {
                line: line_no,
                id: Some(id.trim().to_string()),
                name,
            })
        })
        .collect()
}
