//! Bulk target resolution
//!
//! Turns a single identifier or a text, JSON or CSV file into an ordered,
//! deduplicated [`TargetSet`]. Resolution is pure: it never touches the
//! network. Records that fail validation are collected per line while the
//! rest of the file is still used; only an unreadable or unparseable file
//! fails the whole resolution.

mod json;
mod tabular;
mod text;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::error::{InputError, Result, ValidationError};

/// Longest identifier accepted
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// A validated remote identifier.
///
/// Can only be built through [`Identifier::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Validate a raw identifier. Surrounding whitespace is trimmed.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let value = raw.trim();
        if value.is_empty() {
            return Err("missing id".to_string());
        }
        if value.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(format!(
                "id longer than {} characters",
                MAX_IDENTIFIER_LEN
            ));
        }
        if !value.chars().all(is_identifier_char) {
            return Err(format!(
                "id '{}' may only contain ASCII letters, digits, '-' and '_'",
                value.escape_debug()
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifiers are interpolated into request paths, so path and query
/// delimiters must never get through.
fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A resolved operation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    Organization {
        org_id: Identifier,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Project {
        org_id: Identifier,
        project_id: Identifier,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Target {
    pub fn organization(org_id: Identifier, name: Option<String>) -> Self {
        Target::Organization { org_id, name }
    }

    pub fn project(org_id: Identifier, project_id: Identifier, name: Option<String>) -> Self {
        Target::Project {
            org_id,
            project_id,
            name,
        }
    }

    pub fn org_id(&self) -> &Identifier {
        match self {
            Target::Organization { org_id, .. } | Target::Project { org_id, .. } => org_id,
        }
    }

    pub fn project_id(&self) -> Option<&Identifier> {
        match self {
            Target::Organization { .. } => None,
            Target::Project { project_id, .. } => Some(project_id),
        }
    }

    /// Advisory display name from the input, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Target::Organization { name, .. } | Target::Project { name, .. } => name.as_deref(),
        }
    }

    /// Identity used for deduplication
    pub fn key(&self) -> (&str, Option<&str>) {
        (
            self.org_id().as_str(),
            self.project_id().map(Identifier::as_str),
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Target::Organization { .. } => "organization",
            Target::Project { .. } => "project",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Organization { org_id, name } => match name {
                Some(name) => write!(f, "org {} ({})", org_id, name),
                None => write!(f, "org {}", org_id),
            },
            Target::Project {
                org_id, project_id, ..
            } => write!(f, "project {} in org {}", project_id, org_id),
        }
    }
}

/// Ordered, deduplicated targets plus the records rejected while resolving
/// them.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    pub targets: Vec<Target>,
    pub errors: Vec<ValidationError>,
}

impl TargetSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Append targets from another set, keeping first-seen order and
    /// dropping duplicates.
    pub fn extend(&mut self, other: TargetSet) {
        let mut seen: HashSet<(String, Option<String>)> = self
            .targets
            .iter()
            .map(owned_key)
            .collect();
        for target in other.targets {
            if seen.insert(owned_key(&target)) {
                self.targets.push(target);
            }
        }
        self.errors.extend(other.errors);
    }
}

fn owned_key(target: &Target) -> (String, Option<String>) {
    let (org, project) = target.key();
    (org.to_string(), project.map(str::to_string))
}

/// Where targets come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSource {
    /// One identifier given on the command line
    Single(String),
    /// A bulk input file; the extension selects the format
    File(PathBuf),
}

impl TargetSource {
    /// Short description for messages
    pub fn describe(&self) -> String {
        match self {
            TargetSource::Single(id) => format!("'{}'", id),
            TargetSource::File(path) => path.display().to_string(),
        }
    }
}

/// Supported file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Text,
    Json,
    Csv,
}

/// One record read from an input file, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RawRecord {
    /// 1-based line (text/CSV) or record (JSON) number
    pub line: usize,
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Which identifier a file lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordKind {
    Organization,
    Project,
}

impl RecordKind {
    /// Accepted id columns and keys, in order of preference.
    ///
    /// Qualified names win over a bare `id`, so a project export read as an
    /// organization list yields the owning organizations.
    pub fn id_columns(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Organization => &["organization_id", "org_id", "id"],
            RecordKind::Project => &["project_id", "id"],
        }
    }

    /// Accepted name columns and keys, in order of preference
    pub fn name_columns(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Organization => &["organization_name", "org_name", "name"],
            RecordKind::Project => &["project_name", "name"],
        }
    }
}

/// Resolve organization targets.
pub fn resolve(source: &TargetSource) -> Result<TargetSet> {
    let records = load(source, RecordKind::Organization)?;
    Ok(build(records, Target::organization))
}

/// Resolve project targets belonging to `org_id`.
pub fn resolve_projects(org_id: &Identifier, source: &TargetSource) -> Result<TargetSet> {
    let records = load(source, RecordKind::Project)?;
    Ok(build(records, |id, name| {
        Target::project(org_id.clone(), id, name)
    }))
}

/// Validate a single command-line identifier.
pub fn parse_identifier(raw: &str) -> Result<Identifier> {
    Identifier::parse(raw)
        .map_err(|message| InputError::InvalidIdentifier(ValidationError::new(1, message)).into())
}

fn load(source: &TargetSource, kind: RecordKind) -> Result<Vec<RawRecord>> {
    match source {
        TargetSource::Single(id) => Ok(vec![RawRecord {
            line: 1,
            id: Some(id.clone()),
            name: None,
        }]),
        TargetSource::File(path) => {
            let format = detect_format(path)?;
            let content = std::fs::read_to_string(path).map_err(|source| InputError::Read {
                path: path.clone(),
                source,
            })?;
            debug!("Reading {:?} targets from {}", format, path.display());

            let records = match format {
                FileFormat::Text => text::parse(&content),
                FileFormat::Json => json::parse(path, &content, kind)?,
                FileFormat::Csv => tabular::parse(path, &content, kind)?,
            };
            Ok(records)
        }
    }
}

fn detect_format(path: &Path) -> Result<FileFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => Ok(FileFormat::Json),
        Some("csv") => Ok(FileFormat::Csv),
        Some("xlsx") | Some("xls") => Err(InputError::UnsupportedFormat {
            path: path.to_path_buf(),
            hint: "spreadsheets are not read directly; export the sheet to CSV first".to_string(),
        }
        .into()),
        _ => Ok(FileFormat::Text),
    }
}

/// Validate, deduplicate and convert raw records.
fn build<F>(records: Vec<RawRecord>, make: F) -> TargetSet
where
    F: Fn(Identifier, Option<String>) -> Target,
{
    let mut set = TargetSet::default();
    let mut seen = HashSet::new();

    for record in records {
        let id = match Identifier::parse(record.id.as_deref().unwrap_or_default()) {
            Ok(id) => id,
            Err(message) => {
                let error = ValidationError::new(record.line, message);
                warn!("Rejected input record: {}", error);
                set.errors.push(error);
                continue;
            }
        };

        if !seen.insert(id.clone()) {
            debug!("Skipping duplicate id {} on line {}", id, record.line);
            continue;
        }

        let name = record
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        set.targets.push(make(id, name));
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn ids(set: &TargetSet) -> Vec<&str> {
        set.targets.iter().map(|t| t.org_id().as_str()).collect()
    }

    #[test]
    fn test_identifier_validation() {
        assert!(Identifier::parse("org-1").is_ok());
        assert_eq!(Identifier::parse("  org-1 ").unwrap().as_str(), "org-1");
        assert!(Identifier::parse("").is_err());
        assert!(Identifier::parse("   ").is_err());
        assert!(Identifier::parse("org 1").is_err());
        assert!(Identifier::parse("org\u{7}1").is_err());
        assert!(Identifier::parse(&"a".repeat(MAX_IDENTIFIER_LEN)).is_ok());
        assert!(Identifier::parse(&"a".repeat(MAX_IDENTIFIER_LEN + 1)).is_err());
        assert!(Identifier::parse("0f9a1c2e-77b4-4c1e-9d3a-5b6c7d8e9f00").is_ok());
        assert!(Identifier::parse("org_1").is_ok());
    }

    #[test]
    fn test_identifier_rejects_path_and_query_delimiters() {
        for raw in [
            "org-1/projects/victim",
            "p1/../../org-2",
            "..",
            "a?b",
            "a#b",
            "a%2F",
            "a.b",
            "a\\b",
            "org-é",
        ] {
            assert!(Identifier::parse(raw).is_err(), "{} should be rejected", raw);
        }
    }

    #[test]
    fn test_traversal_records_are_rejected_individually() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "orgs.txt", "org-1\norg-1/projects/victim\norg-2\n");

        let set = resolve(&TargetSource::File(path)).unwrap();
        assert_eq!(ids(&set), vec!["org-1", "org-2"]);
        assert_eq!(set.errors.len(), 1);
        assert_eq!(set.errors[0].line, 2);
    }

    #[test]
    fn test_resolve_single() {
        let set = resolve(&TargetSource::Single("org-1".to_string())).unwrap();
        assert_eq!(ids(&set), vec!["org-1"]);
        assert!(set.errors.is_empty());
    }

    #[test]
    fn test_resolve_single_invalid_is_recorded() {
        let set = resolve(&TargetSource::Single("bad id".to_string())).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.errors.len(), 1);
    }

    #[test]
    fn test_text_file_with_comments_and_names() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "orgs.txt", "org-1,Team A\n# comment\n\norg-2\n");

        let set = resolve(&TargetSource::File(path)).unwrap();
        assert_eq!(ids(&set), vec!["org-1", "org-2"]);
        assert_eq!(set.targets[0].name(), Some("Team A"));
        assert_eq!(set.targets[1].name(), None);
        assert!(set.errors.is_empty());
    }

    #[test]
    fn test_duplicates_are_dropped_in_first_seen_order() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "orgs.txt", "org-2\norg-1\norg-2,Again\norg-3\norg-1\n");

        let set = resolve(&TargetSource::File(path)).unwrap();
        assert_eq!(ids(&set), vec!["org-2", "org-1", "org-3"]);
    }

    #[test]
    fn test_invalid_records_are_rejected_individually() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "orgs.txt", "org-1\nbad id\norg-2\n,name only\n");

        let set = resolve(&TargetSource::File(path)).unwrap();
        assert_eq!(ids(&set), vec!["org-1", "org-2"]);
        let lines: Vec<usize> = set.errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = resolve(&TargetSource::File(PathBuf::from("/nonexistent/orgs.txt"))).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Input(InputError::Read { .. })
        ));
    }

    #[test]
    fn test_xlsx_is_rejected_with_hint() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "orgs.xlsx", "PK");

        let err = resolve(&TargetSource::File(path)).unwrap_err();
        match err {
            crate::error::Error::Input(InputError::UnsupportedFormat { hint, .. }) => {
                assert!(hint.contains("CSV"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_resolve_json_array() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "orgs.json",
            r#"[{"id":"org-1","name":"A"},{"id":"org-2"},{"name":"no id"},{"id":"org-1"}]"#,
        );

        let set = resolve(&TargetSource::File(path)).unwrap();
        assert_eq!(ids(&set), vec!["org-1", "org-2"]);
        assert_eq!(set.errors.len(), 1);
        assert_eq!(set.errors[0].line, 3);
    }

    #[test]
    fn test_resolve_csv_with_org_id_column() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "orgs.csv", "org_name,org_id\nTeam A,org-1\nTeam B,org-2\n");

        let set = resolve(&TargetSource::File(path)).unwrap();
        assert_eq!(ids(&set), vec!["org-1", "org-2"]);
        assert_eq!(set.targets[1].name(), Some("Team B"));
    }

    #[test]
    fn test_resolve_projects() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "projects.csv", "project_id,project_name\np1,web\np2,api\np1,dup\n");
        let org = Identifier::parse("org-1").unwrap();

        let set = resolve_projects(&org, &TargetSource::File(path)).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.targets[0].key(), ("org-1", Some("p1")));
        assert_eq!(set.targets[1].name(), Some("api"));
    }

    #[test]
    fn test_target_set_extend_dedupes() {
        let mut first = resolve(&TargetSource::Single("org-1".to_string())).unwrap();
        let second = resolve(&TargetSource::Single("org-1".to_string())).unwrap();
        first.extend(second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_target_serializes_tagged() {
        let target = Target::project(
            Identifier::parse("o").unwrap(),
            Identifier::parse("p").unwrap(),
            None,
        );
        let value = serde_json::to_value(&target).unwrap();
        assert_eq!(value["type"], "project");
        assert_eq!(value["org_id"], "o");
        assert_eq!(value["project_id"], "p");
    }
}
