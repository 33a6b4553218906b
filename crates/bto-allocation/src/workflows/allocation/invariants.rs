//! Whole-state consistency checks.
//!
//! Coordinator operations keep these true on their own; the checker exists so tests and
//! seeding code can assert it after every step.

use std::collections::BTreeMap;

use super::conflict::overlaps;
use super::domain::{ApplicationId, ApplicationStatus, OfficerStanding, PersonId, ProjectName};
use super::state::AllocationState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("{person} holds {count} active applications")]
    MultipleActiveApplications { person: PersonId, count: usize },
    #[error("{person} has active application {application} that is not their current one")]
    StaleCurrentApplication {
        person: PersonId,
        application: ApplicationId,
    },
    #[error("application {application} references missing {missing}")]
    DanglingReference {
        application: ApplicationId,
        missing: String,
    },
    #[error("{person} is missing from the applicant set of {project}")]
    ApplicantNotRegistered {
        person: PersonId,
        project: ProjectName,
    },
    #[error("{person} is listed as an applicant of {project} without an application there")]
    PhantomApplicant {
        person: PersonId,
        project: ProjectName,
    },
    #[error("{person} is both pending and assigned on {project}")]
    PendingAndAssigned {
        person: PersonId,
        project: ProjectName,
    },
    #[error("officer sets of {project} disagree with the post recorded on {person}")]
    OfficerPostMismatch {
        person: PersonId,
        project: ProjectName,
    },
    #[error("{project} has {assigned} officers but only {capacity} slots")]
    OfficerCapacityExceeded {
        project: ProjectName,
        assigned: usize,
        capacity: usize,
    },
    #[error("{person} serves {post} while applying to conflicting project {applied}")]
    OfficerApplicantOverlap {
        person: PersonId,
        post: ProjectName,
        applied: ProjectName,
    },
    #[error("{manager} manages overlapping projects {first} and {second}")]
    ManagerOverlap {
        manager: PersonId,
        first: ProjectName,
        second: ProjectName,
    },
    #[error("booked application {0} has no booking date")]
    MissingBookingDate(ApplicationId),
}

impl AllocationState {
    /// Returns the first violation found, or `Ok(())` if the state is consistent.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.check_single_active_application()?;
        self.check_application_references()?;
        self.check_officer_sets()?;
        self.check_officer_applicant_separation()?;
        self.check_manager_windows()?;
        Ok(())
    }

    fn check_single_active_application(&self) -> Result<(), InvariantViolation> {
        let mut active: BTreeMap<&PersonId, Vec<&ApplicationId>> = BTreeMap::new();
        for application in self.applications() {
            if application.status.is_active() {
                active
                    .entry(&application.applicant)
                    .or_default()
                    .push(&application.id);
            }
            if application.status == ApplicationStatus::Booked && application.booked_on.is_none() {
                return Err(InvariantViolation::MissingBookingDate(application.id.clone()));
            }
        }

        for (person, applications) in active {
            if applications.len() > 1 {
                return Err(InvariantViolation::MultipleActiveApplications {
                    person: person.clone(),
                    count: applications.len(),
                });
            }
            let current = self
                .person(person)
                .ok()
                .and_then(|record| record.current_application.as_ref());
            if current != Some(applications[0]) {
                return Err(InvariantViolation::StaleCurrentApplication {
                    person: person.clone(),
                    application: applications[0].clone(),
                });
            }
        }
        Ok(())
    }

    fn check_application_references(&self) -> Result<(), InvariantViolation> {
        for application in self.applications() {
            if self.person(&application.applicant).is_err() {
                return Err(InvariantViolation::DanglingReference {
                    application: application.id.clone(),
                    missing: format!("person {}", application.applicant),
                });
            }
            let Some(project) = self.find_project(&application.project) else {
                return Err(InvariantViolation::DanglingReference {
                    application: application.id.clone(),
                    missing: format!("project {}", application.project),
                });
            };
            if !project.applicants.contains(&application.applicant) {
                return Err(InvariantViolation::ApplicantNotRegistered {
                    person: application.applicant.clone(),
                    project: project.name.clone(),
                });
            }
        }

        for project in self.projects() {
            for person in &project.applicants {
                let applied = self
                    .applications_for(&project.name)
                    .any(|application| application.applicant == *person);
                if !applied {
                    return Err(InvariantViolation::PhantomApplicant {
                        person: person.clone(),
                        project: project.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_officer_sets(&self) -> Result<(), InvariantViolation> {
        for project in self.projects() {
            if let Some(person) = project.pending_officers.intersection(&project.officers).next() {
                return Err(InvariantViolation::PendingAndAssigned {
                    person: person.clone(),
                    project: project.name.clone(),
                });
            }
            if project.officers.len() > project.officer_slots {
                return Err(InvariantViolation::OfficerCapacityExceeded {
                    project: project.name.clone(),
                    assigned: project.officers.len(),
                    capacity: project.officer_slots,
                });
            }

            let listed = project
                .officers
                .iter()
                .map(|person| (person, OfficerStanding::Assigned))
                .chain(
                    project
                        .pending_officers
                        .iter()
                        .map(|person| (person, OfficerStanding::Pending)),
                );
            for (person, standing) in listed {
                let consistent = self
                    .person(person)
                    .ok()
                    .and_then(|record| record.officer_post.as_ref())
                    .map(|post| post.project == project.name && post.standing == standing)
                    .unwrap_or(false);
                if !consistent {
                    return Err(InvariantViolation::OfficerPostMismatch {
                        person: person.clone(),
                        project: project.name.clone(),
                    });
                }
            }
        }

        for person in self.persons() {
            let Some(post) = &person.officer_post else {
                continue;
            };
            let listed = self
                .find_project(&post.project)
                .map(|project| match post.standing {
                    OfficerStanding::Assigned => project.officers.contains(&person.id),
                    OfficerStanding::Pending => project.pending_officers.contains(&person.id),
                })
                .unwrap_or(false);
            if !listed {
                return Err(InvariantViolation::OfficerPostMismatch {
                    person: person.id.clone(),
                    project: post.project.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_officer_applicant_separation(&self) -> Result<(), InvariantViolation> {
        for person in self.persons() {
            let (Some(post), Some(application)) =
                (&person.officer_post, self.active_application(person))
            else {
                continue;
            };

            let clash = post.project == application.project
                || match (
                    self.find_project(&post.project),
                    self.find_project(&application.project),
                ) {
                    (Some(served), Some(applied)) => overlaps(&served.window, &applied.window),
                    _ => false,
                };
            if clash {
                return Err(InvariantViolation::OfficerApplicantOverlap {
                    person: person.id.clone(),
                    post: post.project.clone(),
                    applied: application.project.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_manager_windows(&self) -> Result<(), InvariantViolation> {
        let managed: Vec<_> = self
            .projects()
            .filter_map(|project| project.manager.as_ref().map(|manager| (manager, project)))
            .collect();

        for (index, (manager, first)) in managed.iter().enumerate() {
            for (other, second) in &managed[index + 1..] {
                if manager == other && overlaps(&first.window, &second.window) {
                    return Err(InvariantViolation::ManagerOverlap {
                        manager: (*manager).clone(),
                        first: first.name.clone(),
                        second: second.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
