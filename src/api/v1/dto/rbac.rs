/*
 * Responsibility
 * - /rbac/grant-basic-permissions の response DTO
 */
use std::collections::BTreeMap;

use serde::Serialize;

use crate::services::rbac::ProvisionReport;

#[derive(Debug, Serialize)]
pub struct GrantPermissionsResponse {
    pub success: bool,
    pub message: String,
    pub role: String,
    pub role_id: i64,
    pub inserted: Vec<String>,
    pub reactivated: Vec<String>,
    pub permission_ids: BTreeMap<String, i64>,
}

impl From<ProvisionReport> for GrantPermissionsResponse {
    fn from(report: ProvisionReport) -> Self {
        let changed = report.inserted.len() + report.reactivated.len();
        let message = if changed == 0 {
            format!("Basic permissions already granted to '{}'", report.role)
        } else {
            format!(
                "Granted {} permission(s) to '{}'",
                changed,
                report.role
            )
        };

        Self {
            success: true,
            message,
            role: report.role,
            role_id: report.role_id,
            inserted: report.inserted,
            reactivated: report.reactivated,
            permission_ids: report.permission_ids,
        }
    }
}
