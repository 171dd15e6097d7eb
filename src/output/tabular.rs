//! Flat CSV rendering of report records
//!
//! Every record shape has a fixed column list. Nested fields are flattened
//! with `_`, so an audit record's organization becomes `organization_id`,
//! `organization_name` and `organization_group_id`. Those column names are
//! also accepted by the input resolver, which makes every CSV report a valid
//! bulk input file.

use std::io::Write;

use crate::audit::AuditRecord;
use crate::client::Project;
use crate::error::Result;
use crate::executor::OperationResult;

/// A record that renders as one CSV row.
pub trait TabularRecord {
    /// Header row; order is part of the file format
    const COLUMNS: &'static [&'static str];

    /// Cell values in `COLUMNS` order
    fn row(&self) -> Vec<String>;
}

/// Write `records` as CSV with a header row.
pub fn write_csv<T: TabularRecord, W: Write>(records: &[T], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(T::COLUMNS)?;
    for record in records {
        csv.write_record(record.row())?;
    }
    csv.flush()?;
    Ok(())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl TabularRecord for AuditRecord {
    const COLUMNS: &'static [&'static str] = &[
        "organization_id",
        "organization_name",
        "organization_group_id",
        "sast_enabled",
        "project_count",
        "fetched_at",
        "error",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.organization.id.clone(),
            self.organization.name.clone(),
            self.organization.group_id.clone(),
            opt(self.sast_enabled),
            opt(self.project_count),
            self.fetched_at.to_rfc3339(),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

impl TabularRecord for OperationResult {
    const COLUMNS: &'static [&'static str] = &[
        "target_type",
        "organization_id",
        "project_id",
        "name",
        "status",
        "detail",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.target.kind().to_string(),
            self.target.org_id().to_string(),
            opt(self.target.project_id()),
            self.target.name().unwrap_or_default().to_string(),
            self.status.to_string(),
            self.detail.clone(),
        ]
    }
}

impl TabularRecord for Project {
    const COLUMNS: &'static [&'static str] =
        &["project_id", "project_name", "organization_id", "created"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.org_id.clone(),
            self.created.clone().unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixtures::{OrganizationBuilder, ProjectBuilder};
    use crate::executor::TargetStatus;
    use crate::input::{Identifier, Target};
    use chrono::{TimeZone, Utc};

    fn render<T: TabularRecord>(records: &[T]) -> String {
        let mut buffer = Vec::new();
        write_csv(records, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_audit_columns_are_stable() {
        let record = AuditRecord {
            organization: OrganizationBuilder::new("org-1").name("Team, A").build(),
            sast_enabled: Some(true),
            project_count: None,
            fetched_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            error: Some("projects: boom".to_string()),
        };

        let csv = render(&[record]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("organization_id,organization_name,organization_group_id,sast_enabled,project_count,fetched_at,error")
        );
        assert_eq!(
            lines.next(),
            Some("org-1,\"Team, A\",grp,true,,2024-05-01T12:00:00+00:00,projects: boom")
        );
    }

    #[test]
    fn test_operation_result_row() {
        let result = OperationResult {
            target: Target::project(
                Identifier::parse("org-1").unwrap(),
                Identifier::parse("p1").unwrap(),
                Some("web".to_string()),
            ),
            status: TargetStatus::Failed,
            detail: "gone".to_string(),
        };

        assert_eq!(
            result.row(),
            vec!["project", "org-1", "p1", "web", "failed", "gone"]
        );
    }

    #[test]
    fn test_project_rows_with_header_only_when_empty() {
        let csv = render::<Project>(&[]);
        assert_eq!(csv, "project_id,project_name,organization_id,created\n");

        let csv = render(&[ProjectBuilder::new("p1", "org-1").name("api").build()]);
        assert!(csv.ends_with("p1,api,org-1,\n"));
    }
}
