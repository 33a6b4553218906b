use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::ProjectName;

/// Outbound hook notified after allocation decisions are committed.
pub trait NoticePublisher: Send + Sync {
    fn publish(&self, notice: AllocationNotice) -> Result<(), NoticeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    ApplicationApproved,
    ApplicationRejected,
    FlatBooked,
    OfficerApproved,
}

impl NoticeKind {
    pub const fn template(self) -> &'static str {
        match self {
            NoticeKind::ApplicationApproved => "application_approved",
            NoticeKind::ApplicationRejected => "application_rejected",
            NoticeKind::FlatBooked => "flat_booked",
            NoticeKind::OfficerApproved => "officer_approved",
        }
    }
}

/// Simple notice payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationNotice {
    pub kind: NoticeKind,
    /// Application id or officer id the notice concerns.
    pub subject: String,
    pub project: ProjectName,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}
