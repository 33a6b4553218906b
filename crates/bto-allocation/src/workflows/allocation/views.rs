use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationStatus, ApplicationWindow, MaritalStatus, OfficerStanding,
    PersonId, Project, ProjectName, UnitCategory,
};
use super::eligibility::DenialReason;

/// Applicant-facing summary of a project the person may apply to today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectListing {
    pub name: ProjectName,
    pub neighbourhood: String,
    pub window: ApplicationWindow,
    pub eligible_categories: Vec<UnitCategory>,
    pub remaining_units: BTreeMap<UnitCategory, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityVerdict {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialReason>,
}

impl From<Result<(), DenialReason>> for EligibilityVerdict {
    fn from(value: Result<(), DenialReason>) -> Self {
        match value {
            Ok(()) => Self {
                eligible: true,
                denial: None,
            },
            Err(reason) => Self {
                eligible: false,
                denial: Some(reason),
            },
        }
    }
}

/// Every field is optional; an empty filter matches all projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectFilter {
    #[serde(default)]
    pub neighbourhood: Option<String>,
    #[serde(default)]
    pub category: Option<UnitCategory>,
    #[serde(default)]
    pub visible: Option<bool>,
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        let neighbourhood = self
            .neighbourhood
            .as_deref()
            .map(|wanted| project.neighbourhood.eq_ignore_ascii_case(wanted.trim()))
            .unwrap_or(true);
        let category = self
            .category
            .map(|wanted| project.inventory.offers(wanted))
            .unwrap_or(true);
        let visible = self
            .visible
            .map(|wanted| project.visible == wanted)
            .unwrap_or(true);

        neighbourhood && category && visible
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub category: Option<UnitCategory>,
    #[serde(default)]
    pub marital_status: Option<MaritalStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub application_id: ApplicationId,
    pub applicant: PersonId,
    pub age: u16,
    pub marital_status: MaritalStatus,
    pub category: UnitCategory,
    pub status: ApplicationStatus,
}

/// Structured booking confirmation. Rendering is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReceipt {
    pub application_id: ApplicationId,
    pub applicant: PersonId,
    pub age: u16,
    pub marital_status: MaritalStatus,
    pub category: UnitCategory,
    pub project: ProjectName,
    pub neighbourhood: String,
    pub booked_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficerRegistrationView {
    pub officer: PersonId,
    pub project: ProjectName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standing: Option<OfficerStanding>,
    pub remaining_slots: usize,
}
