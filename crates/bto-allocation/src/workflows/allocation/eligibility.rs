use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{MaritalStatus, Person, Project, ProjectName, UnitCategory};
use crate::config::AllocationConfig;

/// Lawful reasons an application request is turned away before it reaches the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    #[error("{project} is not open for applications")]
    ProjectNotOpen { project: ProjectName },
    #[error("{category} units are not offered by {project}")]
    CategoryNotOffered {
        project: ProjectName,
        category: UnitCategory,
    },
    #[error(
        "single applicants must be at least {minimum_age} and may only request the smallest offered category (age {age}, requested {requested})"
    )]
    IneligibleSingle {
        age: u16,
        minimum_age: u16,
        requested: UnitCategory,
    },
    #[error("married applicants must be at least {minimum_age} (age {age})")]
    IneligibleMarried { age: u16, minimum_age: u16 },
}

/// Age and marital-status rules gating application submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    single_min_age: u16,
    married_min_age: u16,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::from(&AllocationConfig::default())
    }
}

impl From<&AllocationConfig> for EligibilityPolicy {
    fn from(config: &AllocationConfig) -> Self {
        Self {
            single_min_age: config.single_min_age,
            married_min_age: config.married_min_age,
        }
    }
}

impl EligibilityPolicy {
    /// Applicant-facing availability: visible and within the application window.
    pub fn is_open(project: &Project, today: NaiveDate) -> bool {
        project.visible && project.window.contains(today)
    }

    pub fn can_apply(
        &self,
        person: &Person,
        project: &Project,
        category: UnitCategory,
        today: NaiveDate,
    ) -> Result<(), DenialReason> {
        if !Self::is_open(project, today) {
            return Err(DenialReason::ProjectNotOpen {
                project: project.name.clone(),
            });
        }

        if !project.inventory.offers(category) {
            return Err(DenialReason::CategoryNotOffered {
                project: project.name.clone(),
                category,
            });
        }

        match person.marital_status {
            MaritalStatus::Single => {
                let smallest = project.inventory.smallest_category();
                if person.age < self.single_min_age || smallest != Some(category) {
                    return Err(DenialReason::IneligibleSingle {
                        age: person.age,
                        minimum_age: self.single_min_age,
                        requested: category,
                    });
                }
            }
            MaritalStatus::Married => {
                if person.age < self.married_min_age {
                    return Err(DenialReason::IneligibleMarried {
                        age: person.age,
                        minimum_age: self.married_min_age,
                    });
                }
            }
        }

        Ok(())
    }

    /// Categories the person could request from the project today, in size order.
    pub fn permitted_categories(
        &self,
        person: &Person,
        project: &Project,
        today: NaiveDate,
    ) -> Vec<UnitCategory> {
        project
            .inventory
            .categories()
            .filter(|category| self.can_apply(person, project, *category, today).is_ok())
            .collect()
    }
}
