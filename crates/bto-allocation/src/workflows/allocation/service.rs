use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::warn;

use super::coordinator::AllocationCoordinator;
use super::domain::{
    Application, ApplicationId, NewPerson, Person, PersonId, Project, ProjectDraft, ProjectName,
    UnitCategory,
};
use super::errors::AllocationError;
use super::invariants::InvariantViolation;
use super::notices::{AllocationNotice, NoticeKind, NoticePublisher};
use super::views::{
    BookingReceipt, EligibilityVerdict, OfficerRegistrationView, ProjectFilter, ProjectListing,
    ReportFilter, ReportRow,
};
use crate::config::AllocationConfig;

/// Thread-safe front for the coordinator plus the outbound notice hook.
///
/// One lock guards the whole coordinator, so every operation is atomic with respect to
/// every other.
pub struct AllocationService<N> {
    coordinator: Mutex<AllocationCoordinator>,
    notices: Arc<N>,
}

impl<N> AllocationService<N>
where
    N: NoticePublisher + 'static,
{
    pub fn new(coordinator: AllocationCoordinator, notices: Arc<N>) -> Self {
        Self {
            coordinator: Mutex::new(coordinator),
            notices,
        }
    }

    pub fn from_config(config: &AllocationConfig, notices: Arc<N>) -> Self {
        Self::new(AllocationCoordinator::new(config), notices)
    }

    pub fn register_person(&self, person: NewPerson) -> Result<Person, AllocationServiceError> {
        self.write("register person", |engine| engine.register_person(person))
    }

    pub fn person(&self, id: &PersonId) -> Result<Person, AllocationServiceError> {
        self.read(|engine| engine.person(id).cloned())
    }

    pub fn create_project(
        &self,
        actor: &PersonId,
        draft: ProjectDraft,
    ) -> Result<Project, AllocationServiceError> {
        self.write("create project", |engine| engine.create_project(actor, draft))
    }

    pub fn assign_manager(
        &self,
        manager: &PersonId,
        project: &ProjectName,
    ) -> Result<Project, AllocationServiceError> {
        self.write("assign manager", |engine| {
            engine.assign_manager(manager, project)
        })
    }

    pub fn set_visibility(
        &self,
        actor: &PersonId,
        project: &ProjectName,
        visible: bool,
    ) -> Result<Project, AllocationServiceError> {
        self.write("set visibility", |engine| {
            engine.set_visibility(actor, project, visible)
        })
    }

    pub fn project(&self, name: &ProjectName) -> Result<Project, AllocationServiceError> {
        self.read(|engine| engine.project(name).cloned())
    }

    pub fn filter_projects(
        &self,
        filter: &ProjectFilter,
    ) -> Result<Vec<Project>, AllocationServiceError> {
        self.read(|engine| {
            Ok(engine
                .filter_projects(filter)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    pub fn check_eligibility(
        &self,
        person: &PersonId,
        project: &ProjectName,
        category: UnitCategory,
        today: NaiveDate,
    ) -> Result<EligibilityVerdict, AllocationServiceError> {
        self.read(|engine| engine.check_eligibility(person, project, category, today))
    }

    pub fn list_eligible_projects(
        &self,
        person: &PersonId,
        today: NaiveDate,
    ) -> Result<Vec<ProjectListing>, AllocationServiceError> {
        self.read(|engine| engine.list_eligible_projects(person, today))
    }

    pub fn submit_application(
        &self,
        actor: &PersonId,
        project: &ProjectName,
        category: UnitCategory,
        today: NaiveDate,
    ) -> Result<Application, AllocationServiceError> {
        self.write("submit application", |engine| {
            engine.submit_application(actor, project, category, today)
        })
    }

    pub fn application(&self, id: &ApplicationId) -> Result<Application, AllocationServiceError> {
        self.read(|engine| engine.application(id).cloned())
    }

    pub fn request_withdrawal(
        &self,
        actor: &PersonId,
        application: &ApplicationId,
        today: NaiveDate,
    ) -> Result<Application, AllocationServiceError> {
        self.write("request withdrawal", |engine| {
            engine.request_withdrawal(actor, application, today)
        })
    }

    pub fn acknowledge_withdrawal(
        &self,
        actor: &PersonId,
        application: &ApplicationId,
    ) -> Result<Application, AllocationServiceError> {
        self.write("acknowledge withdrawal", |engine| {
            engine.acknowledge_withdrawal(actor, application)
        })
    }

    pub fn approve_application(
        &self,
        actor: &PersonId,
        application: &ApplicationId,
    ) -> Result<Application, AllocationServiceError> {
        let approved = self.write("approve application", |engine| {
            engine.approve_application(actor, application)
        })?;
        self.notify(application_notice(
            NoticeKind::ApplicationApproved,
            &approved,
            actor,
        ));
        Ok(approved)
    }

    pub fn reject_application(
        &self,
        actor: &PersonId,
        application: &ApplicationId,
    ) -> Result<Application, AllocationServiceError> {
        let rejected = self.write("reject application", |engine| {
            engine.reject_application(actor, application)
        })?;
        self.notify(application_notice(
            NoticeKind::ApplicationRejected,
            &rejected,
            actor,
        ));
        Ok(rejected)
    }

    pub fn book_flat(
        &self,
        actor: &PersonId,
        application: &ApplicationId,
        today: NaiveDate,
    ) -> Result<Application, AllocationServiceError> {
        let booked = self.write("book flat", |engine| {
            engine.book_flat(actor, application, today)
        })?;
        self.notify(application_notice(NoticeKind::FlatBooked, &booked, actor));
        Ok(booked)
    }

    pub fn booking_receipt(
        &self,
        actor: &PersonId,
        application: &ApplicationId,
    ) -> Result<BookingReceipt, AllocationServiceError> {
        self.read(|engine| engine.booking_receipt(actor, application))
    }

    pub fn register_officer(
        &self,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<OfficerRegistrationView, AllocationServiceError> {
        self.write("register officer", |engine| {
            engine.register_officer(officer, project)
        })
    }

    pub fn approve_officer_registration(
        &self,
        actor: &PersonId,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<OfficerRegistrationView, AllocationServiceError> {
        let view = self.write("approve officer registration", |engine| {
            engine.approve_officer_registration(actor, officer, project)
        })?;

        let mut details = BTreeMap::new();
        details.insert("decided_by".to_string(), actor.to_string());
        details.insert(
            "remaining_slots".to_string(),
            view.remaining_slots.to_string(),
        );
        self.notify(AllocationNotice {
            kind: NoticeKind::OfficerApproved,
            subject: officer.to_string(),
            project: project.clone(),
            details,
        });
        Ok(view)
    }

    pub fn reject_officer_registration(
        &self,
        actor: &PersonId,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<OfficerRegistrationView, AllocationServiceError> {
        self.write("reject officer registration", |engine| {
            engine.reject_officer_registration(actor, officer, project)
        })
    }

    pub fn withdraw_officer_registration(
        &self,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<OfficerRegistrationView, AllocationServiceError> {
        self.write("withdraw officer registration", |engine| {
            engine.withdraw_officer_registration(officer, project)
        })
    }

    pub fn set_unit_count(
        &self,
        actor: &PersonId,
        project: &ProjectName,
        category: UnitCategory,
        count: u32,
    ) -> Result<u32, AllocationServiceError> {
        self.write("set unit count", |engine| {
            engine.set_unit_count(actor, project, category, count)
        })
    }

    pub fn remaining_units(
        &self,
        project: &ProjectName,
        category: UnitCategory,
    ) -> Result<u32, AllocationServiceError> {
        self.read(|engine| engine.remaining_units(project, category))
    }

    pub fn pending_applications(
        &self,
        actor: &PersonId,
        project: &ProjectName,
    ) -> Result<Vec<Application>, AllocationServiceError> {
        self.read(|engine| {
            Ok(engine
                .pending_applications(actor, project)?
                .into_iter()
                .cloned()
                .collect())
        })
    }

    pub fn pending_withdrawals(
        &self,
        actor: &PersonId,
        project: &ProjectName,
    ) -> Result<Vec<Application>, AllocationServiceError> {
        self.read(|engine| {
            Ok(engine
                .pending_withdrawals(actor, project)?
                .into_iter()
                .cloned()
                .collect())
        })
    }

    pub fn application_report(
        &self,
        actor: &PersonId,
        project: &ProjectName,
        filter: &ReportFilter,
    ) -> Result<Vec<ReportRow>, AllocationServiceError> {
        self.read(|engine| engine.application_report(actor, project, filter))
    }

    /// Runs the whole-state consistency check under the lock.
    pub fn check_invariants(&self) -> Result<Result<(), InvariantViolation>, AllocationServiceError> {
        let guard = self
            .coordinator
            .lock()
            .map_err(|_| AllocationServiceError::StateUnavailable)?;
        Ok(guard.state().check_invariants())
    }

    fn read<T>(
        &self,
        query: impl FnOnce(&AllocationCoordinator) -> Result<T, AllocationError>,
    ) -> Result<T, AllocationServiceError> {
        let guard = self
            .coordinator
            .lock()
            .map_err(|_| AllocationServiceError::StateUnavailable)?;
        Ok(query(&guard)?)
    }

    fn write<T>(
        &self,
        operation: &'static str,
        command: impl FnOnce(&mut AllocationCoordinator) -> Result<T, AllocationError>,
    ) -> Result<T, AllocationServiceError> {
        let mut guard = self
            .coordinator
            .lock()
            .map_err(|_| AllocationServiceError::StateUnavailable)?;
        command(&mut guard).map_err(|error| {
            warn!(operation, code = error.code(), %error, "allocation operation refused");
            AllocationServiceError::from(error)
        })
    }

    /// Delivery failures are logged only; the decision has already been committed.
    fn notify(&self, notice: AllocationNotice) {
        let kind = notice.kind.template();
        if let Err(error) = self.notices.publish(notice) {
            warn!(notice = kind, %error, "allocation notice not delivered");
        }
    }
}

fn application_notice(
    kind: NoticeKind,
    application: &Application,
    actor: &PersonId,
) -> AllocationNotice {
    let mut details = BTreeMap::new();
    details.insert("applicant".to_string(), application.applicant.to_string());
    details.insert("category".to_string(), application.category.to_string());
    details.insert("status".to_string(), application.status.to_string());
    details.insert("decided_by".to_string(), actor.to_string());
    AllocationNotice {
        kind,
        subject: application.id.to_string(),
        project: application.project.clone(),
        details,
    }
}

/// Error raised by the allocation service.
#[derive(Debug, thiserror::Error)]
pub enum AllocationServiceError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("allocation state is unavailable after a failed operation")]
    StateUnavailable,
}
