//! Temporal-overlap rules governing which roles a person may hold across projects at once.

use super::domain::{ApplicationWindow, OfficerStanding, Person, PersonId, Project, ProjectName};
use super::state::AllocationState;

/// Role-assignment conflicts raised by officer registration, applications and manager posting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    #[error("{officer} already holds an officer post for {project}")]
    AlreadyAssignedElsewhere {
        officer: PersonId,
        project: ProjectName,
    },
    #[error("{person} cannot hold an officer role on {project} alongside an application for {conflicting}")]
    ApplicantConflict {
        person: PersonId,
        project: ProjectName,
        conflicting: ProjectName,
    },
    #[error("{officer} is already an officer of {project}")]
    AlreadyRegistered {
        officer: PersonId,
        project: ProjectName,
    },
    #[error("{officer} already has a pending registration for {project}")]
    AlreadyPending {
        officer: PersonId,
        project: ProjectName,
    },
    #[error("{officer} has no pending registration for {project}")]
    NoPendingRequest {
        officer: PersonId,
        project: ProjectName,
    },
    #[error("{manager} already manages {conflicting}, whose window overlaps {project}")]
    ManagerOverlap {
        manager: PersonId,
        project: ProjectName,
        conflicting: ProjectName,
    },
    #[error("{project} is already managed by {manager}")]
    ManagerAlreadyAssigned {
        project: ProjectName,
        manager: PersonId,
    },
}

/// Inclusive interval intersection of two application windows.
pub fn overlaps(a: &ApplicationWindow, b: &ApplicationWindow) -> bool {
    !(a.closing_date < b.opening_date || a.opening_date > b.closing_date)
}

/// One officer post per person: redundant requests and posts elsewhere are refused
/// before the application rule is consulted.
pub(crate) fn check_officer_registration(
    state: &AllocationState,
    officer: &Person,
    project: &Project,
) -> Result<(), ConflictError> {
    if let Some(post) = &officer.officer_post {
        if post.project == project.name {
            return Err(match post.standing {
                OfficerStanding::Assigned => ConflictError::AlreadyRegistered {
                    officer: officer.id.clone(),
                    project: project.name.clone(),
                },
                OfficerStanding::Pending => ConflictError::AlreadyPending {
                    officer: officer.id.clone(),
                    project: project.name.clone(),
                },
            });
        }

        return Err(ConflictError::AlreadyAssignedElsewhere {
            officer: officer.id.clone(),
            project: post.project.clone(),
        });
    }

    check_officer_against_application(state, officer, project)
}

/// An officer may not serve a project they ever applied to, whatever became of that
/// application, nor one whose window overlaps their active application.
pub(crate) fn check_officer_against_application(
    state: &AllocationState,
    officer: &Person,
    project: &Project,
) -> Result<(), ConflictError> {
    if state
        .applications_for(&project.name)
        .any(|application| application.applicant == officer.id)
    {
        return Err(ConflictError::ApplicantConflict {
            person: officer.id.clone(),
            project: project.name.clone(),
            conflicting: project.name.clone(),
        });
    }

    let Some(application) = state.active_application(officer) else {
        return Ok(());
    };

    if clashes(state, &application.project, project) {
        return Err(ConflictError::ApplicantConflict {
            person: officer.id.clone(),
            project: project.name.clone(),
            conflicting: application.project.clone(),
        });
    }

    Ok(())
}

/// Mirror of the officer rule, applied when an officer submits an application.
pub(crate) fn check_applicant_against_officer_post(
    state: &AllocationState,
    person: &Person,
    project: &Project,
) -> Result<(), ConflictError> {
    let Some(post) = &person.officer_post else {
        return Ok(());
    };

    if clashes(state, &post.project, project) {
        return Err(ConflictError::ApplicantConflict {
            person: person.id.clone(),
            project: post.project.clone(),
            conflicting: project.name.clone(),
        });
    }

    Ok(())
}

pub(crate) fn check_manager_assignment(
    state: &AllocationState,
    manager: &PersonId,
    project: &ProjectName,
    window: &ApplicationWindow,
) -> Result<(), ConflictError> {
    let conflicting = state
        .projects()
        .filter(|candidate| candidate.is_managed_by(manager) && candidate.name != *project)
        .find(|candidate| overlaps(&candidate.window, window));

    match conflicting {
        Some(candidate) => Err(ConflictError::ManagerOverlap {
            manager: manager.clone(),
            project: project.clone(),
            conflicting: candidate.name.clone(),
        }),
        None => Ok(()),
    }
}

fn clashes(state: &AllocationState, held: &ProjectName, target: &Project) -> bool {
    if *held == target.name {
        return true;
    }

    state
        .find_project(held)
        .map(|project| overlaps(&project.window, &target.window))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window(open: (i32, u32, u32), close: (i32, u32, u32)) -> ApplicationWindow {
        ApplicationWindow::new(
            NaiveDate::from_ymd_opt(open.0, open.1, open.2).expect("valid"),
            NaiveDate::from_ymd_opt(close.0, close.1, close.2).expect("valid"),
        )
        .expect("ordered window")
    }

    #[test]
    fn shared_boundary_day_counts_as_overlap() {
        let feb = window((2025, 2, 1), (2025, 2, 28));
        let from_last_day = window((2025, 2, 28), (2025, 3, 31));
        assert!(overlaps(&feb, &from_last_day));
        assert!(overlaps(&from_last_day, &feb));
    }

    #[test]
    fn adjacent_windows_do_not_overlap() {
        let feb = window((2025, 2, 1), (2025, 2, 28));
        let march = window((2025, 3, 1), (2025, 3, 31));
        assert!(!overlaps(&feb, &march));
        assert!(!overlaps(&march, &feb));
    }

    #[test]
    fn containment_overlaps() {
        let quarter = window((2025, 1, 1), (2025, 3, 31));
        let mid = window((2025, 2, 10), (2025, 2, 12));
        assert!(overlaps(&quarter, &mid));
        assert!(overlaps(&mid, &quarter));
        assert!(quarter.overlaps(&mid));
    }
}
