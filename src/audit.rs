//! Admin audit-log retrieval and display helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Admin views list audit entries and request export payloads. Rendering
//! the PDF/CSV itself happens elsewhere; this module only fetches the data
//! and maps backend action codes and UTC timestamps to display text.
//!
//! The backend speaks UTC as `YYYY-MM-DD HH:MM:SS` with no zone marker.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::error;

use crate::api::{ApiError, HttpApi};

pub const AUDIT_LOGS_PATH: &str = "/api/admin/audit-logs";
pub const EXPORT_AUDIT_LOGS_PATH: &str = "/api/admin/export-audit-logs";

const BACKEND_TIMESTAMP: &[FormatItem<'static>] = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Filters accepted by the audit-log endpoints. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditLogQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AuditLogEntry {
    #[serde(default)]
    pub id: Option<i64>,
    pub action: String,
    /// Backend UTC timestamp, verbatim.
    #[serde(default)]
    pub timestamp: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl AuditLogEntry {
    #[must_use]
    pub fn timestamp_utc(&self) -> Option<OffsetDateTime> {
        parse_utc_timestamp(&self.timestamp)
    }

    /// Timestamp shifted to `offset`, or the raw text if it does not parse.
    #[must_use]
    pub fn display_timestamp(&self, offset: UtcOffset) -> String {
        self.timestamp_utc()
            .and_then(|t| t.to_offset(offset).format(BACKEND_TIMESTAMP).ok())
            .unwrap_or_else(|| self.timestamp.clone())
    }

    #[must_use]
    pub fn action_label(&self) -> &str {
        format_action(&self.action)
    }
}

/// One page of audit entries (or an export payload).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuditLogPage {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub logs: Vec<AuditLogEntry>,
    /// Pagination and any other envelope fields.
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Csv,
}

impl ExportFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown export format `{other}` (expected `pdf` or `csv`)")),
        }
    }
}

impl HttpApi {
    /// `GET /api/admin/audit-logs`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the body is not a page.
    pub async fn audit_logs(&self, token: Option<&str>, query: &AuditLogQuery) -> Result<AuditLogPage, ApiError> {
        self.get_json(AUDIT_LOGS_PATH, token, query).await.inspect_err(|e| {
            error!(error = %e, "audit log fetch failed");
        })
    }

    /// `GET /api/admin/export-audit-logs/{pdf|csv}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the body is not a page.
    pub async fn export_audit_logs(
        &self,
        token: Option<&str>,
        format: ExportFormat,
        query: &AuditLogQuery,
    ) -> Result<AuditLogPage, ApiError> {
        let path = format!("{EXPORT_AUDIT_LOGS_PATH}/{}", format.as_str());
        self.get_json(&path, token, query).await.inspect_err(|e| {
            error!(error = %e, format = format.as_str(), "audit log export failed");
        })
    }
}

/// Human label for a backend action code. Unknown codes pass through.
#[must_use]
pub fn format_action(action: &str) -> &str {
    match action {
        "login" => "User Login",
        "logout" => "User Logout",
        "FORM_SUBMIT" => "Form Submission",
        "DRAFT_SAVE" => "Draft Saved",
        "DRAFT_UPDATE" => "Draft Updated",
        "VIEW_FORMS" => "Forms Viewed",
        "view_audit_logs" => "Audit Logs Viewed",
        "view_users" => "Users List Viewed",
        "update_user" => "User Updated",
        "export_audit_logs" => "Audit Logs Exported",
        other => other,
    }
}

/// Style class for a backend action code; empty for unknown codes.
#[must_use]
pub fn action_class(action: &str) -> &'static str {
    match action {
        "login" => "action-login",
        "logout" => "action-logout",
        "FORM_SUBMIT" => "action-submit",
        "DRAFT_SAVE" | "DRAFT_UPDATE" => "action-draft",
        "VIEW_FORMS" => "action-view",
        "view_audit_logs" | "view_users" | "update_user" | "export_audit_logs" => "action-admin",
        _ => "",
    }
}

/// Parse a backend UTC timestamp. Accepts a `T` separator and trailing `Z`.
#[must_use]
pub fn parse_utc_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let normalized = raw.trim().trim_end_matches('Z').replacen('T', " ", 1);
    PrimitiveDateTime::parse(&normalized, BACKEND_TIMESTAMP)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// The machine's UTC offset, or UTC when it cannot be determined.
///
/// The platform lookup refuses to run once the process has spawned extra
/// threads, so call this before starting any.
#[must_use]
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Format any instant in the backend's UTC wire format.
#[must_use]
pub fn to_utc_string(at: OffsetDateTime) -> String {
    at.to_offset(UtcOffset::UTC)
        .format(BACKEND_TIMESTAMP)
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "audit_test.rs"]
mod tests;
