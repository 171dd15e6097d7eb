//! Batch result display model

use serde::Serialize;
use tabled::Tabled;

use super::common::{MISSING, truncate_string};
use crate::executor::OperationResult;

/// Operation result display model for table/JSON output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ResultDisplay {
    /// Organization ID
    #[tabled(rename = "ORG ID")]
    pub org_id: String,

    /// Project ID, for project targets
    #[tabled(rename = "PROJECT ID")]
    pub project_id: String,

    /// Advisory name from input or API
    #[tabled(rename = "NAME")]
    pub name: String,

    /// Final status
    #[tabled(rename = "STATUS")]
    pub status: String,

    /// What happened
    #[tabled(rename = "DETAIL")]
    pub detail: String,
}

impl From<&OperationResult> for ResultDisplay {
    fn from(result: &OperationResult) -> Self {
        Self {
            org_id: result.target.org_id().to_string(),
            project_id: result
                .target
                .project_id()
                .map(|p| p.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
            name: result.target.name().unwrap_or(MISSING).to_string(),
            status: result.status.to_string(),
            detail: truncate_string(&result.detail, 70),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::TargetStatus;
    use crate::input::{Identifier, Target};

    #[test]
    fn test_result_display_for_org_target() {
        let result = OperationResult {
            target: Target::organization(Identifier::parse("org-1").unwrap(), None),
            status: TargetStatus::Skipped,
            detail: "SAST already disabled".to_string(),
        };

        let display = ResultDisplay::from(&result);

        assert_eq!(display.org_id, "org-1");
        assert_eq!(display.project_id, "--");
        assert_eq!(display.name, "--");
        assert_eq!(display.status, "skipped");
    }
}
