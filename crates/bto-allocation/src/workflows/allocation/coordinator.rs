use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::conflict::{
    check_applicant_against_officer_post, check_manager_assignment,
    check_officer_against_application, check_officer_registration, ConflictError,
};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationWindow, NewPerson, OfficerPost,
    OfficerStanding, Person, PersonId, Project, ProjectDraft, ProjectName, Role, UnitCategory,
};
use super::eligibility::EligibilityPolicy;
use super::errors::AllocationError;
use super::inventory::UnitInventory;
use super::lifecycle::ApplicationAction;
use super::state::AllocationState;
use super::views::{
    BookingReceipt, EligibilityVerdict, OfficerRegistrationView, ProjectFilter, ProjectListing,
    ReportFilter, ReportRow,
};
use crate::config::AllocationConfig;

/// Single authority over allocation state.
///
/// Every operation validates completely before it mutates, so a returned error always
/// leaves the state exactly as it was.
#[derive(Debug, Clone)]
pub struct AllocationCoordinator {
    state: AllocationState,
    policy: EligibilityPolicy,
    officer_slots: usize,
}

impl Default for AllocationCoordinator {
    fn default() -> Self {
        Self::new(&AllocationConfig::default())
    }
}

impl AllocationCoordinator {
    pub fn new(config: &AllocationConfig) -> Self {
        Self {
            state: AllocationState::default(),
            policy: EligibilityPolicy::from(config),
            officer_slots: config.officer_slots,
        }
    }

    pub fn state(&self) -> &AllocationState {
        &self.state
    }

    pub fn person(&self, id: &PersonId) -> Result<&Person, AllocationError> {
        self.state.person(id)
    }

    pub fn project(&self, name: &ProjectName) -> Result<&Project, AllocationError> {
        self.state.project(name)
    }

    pub fn application(&self, id: &ApplicationId) -> Result<&Application, AllocationError> {
        self.state.application(id)
    }

    pub fn register_person(&mut self, new_person: NewPerson) -> Result<Person, AllocationError> {
        let id = PersonId::parse(&new_person.id)
            .ok_or_else(|| AllocationError::InvalidPersonId(new_person.id.clone()))?;
        if self.state.contains_person(&id) {
            return Err(AllocationError::DuplicatePerson(id));
        }

        let mut roles: BTreeSet<Role> = new_person.roles.into_iter().collect();
        if roles.is_empty() {
            roles.insert(Role::Applicant);
        }

        let person = Person {
            id,
            age: new_person.age,
            marital_status: new_person.marital_status,
            roles,
            current_application: None,
            officer_post: None,
        };
        self.state.insert_person(person.clone());

        info!(person = %person.id, age = person.age, "person registered");
        Ok(person)
    }

    /// Creates a project with `actor` as its manager in charge.
    pub fn create_project(
        &mut self,
        actor: &PersonId,
        draft: ProjectDraft,
    ) -> Result<Project, AllocationError> {
        self.require_role(actor, Role::Manager)?;
        let mut project = self.build_project(draft)?;
        check_manager_assignment(&self.state, actor, &project.name, &project.window)?;

        project.manager = Some(actor.clone());
        self.state.insert_project(project.clone());

        info!(project = %project.name, manager = %actor, "project created");
        Ok(project)
    }

    /// Creates a project without a manager in charge, for bulk seeding.
    pub fn intake_project(&mut self, draft: ProjectDraft) -> Result<Project, AllocationError> {
        let project = self.build_project(draft)?;
        self.state.insert_project(project.clone());

        info!(project = %project.name, "project taken in without a manager");
        Ok(project)
    }

    pub fn assign_manager(
        &mut self,
        manager: &PersonId,
        project: &ProjectName,
    ) -> Result<Project, AllocationError> {
        self.require_role(manager, Role::Manager)?;
        let target = self.state.project(project)?;
        match &target.manager {
            Some(current) if current == manager => return Ok(target.clone()),
            Some(current) => {
                return Err(ConflictError::ManagerAlreadyAssigned {
                    project: project.clone(),
                    manager: current.clone(),
                }
                .into())
            }
            None => {}
        }
        check_manager_assignment(&self.state, manager, project, &target.window)?;

        let target = self.state.project_mut(project)?;
        target.manager = Some(manager.clone());

        info!(project = %project, manager = %manager, "manager assigned");
        Ok(target.clone())
    }

    pub fn set_visibility(
        &mut self,
        actor: &PersonId,
        project: &ProjectName,
        visible: bool,
    ) -> Result<Project, AllocationError> {
        self.require_manager_of(actor, project)?;
        let target = self.state.project_mut(project)?;
        target.visible = visible;

        info!(project = %project, visible, "project visibility changed");
        Ok(target.clone())
    }

    pub fn filter_projects(&self, filter: &ProjectFilter) -> Vec<&Project> {
        self.state
            .projects()
            .filter(|project| filter.matches(project))
            .collect()
    }

    pub fn check_eligibility(
        &self,
        person: &PersonId,
        project: &ProjectName,
        category: UnitCategory,
        today: NaiveDate,
    ) -> Result<EligibilityVerdict, AllocationError> {
        let person = self.state.person(person)?;
        let project = self.state.project(project)?;
        let verdict =
            EligibilityVerdict::from(self.policy.can_apply(person, project, category, today));

        debug!(
            person = %person.id,
            project = %project.name,
            eligible = verdict.eligible,
            "eligibility checked"
        );
        Ok(verdict)
    }

    /// Open projects offering at least one category the person may request today.
    pub fn list_eligible_projects(
        &self,
        person: &PersonId,
        today: NaiveDate,
    ) -> Result<Vec<ProjectListing>, AllocationError> {
        let person = self.state.person(person)?;
        let listings = self
            .state
            .projects()
            .filter_map(|project| {
                let eligible_categories = self.policy.permitted_categories(person, project, today);
                if eligible_categories.is_empty() {
                    return None;
                }
                Some(ProjectListing {
                    name: project.name.clone(),
                    neighbourhood: project.neighbourhood.clone(),
                    window: project.window,
                    eligible_categories,
                    remaining_units: project.inventory.snapshot().clone(),
                })
            })
            .collect();
        Ok(listings)
    }

    pub fn submit_application(
        &mut self,
        actor: &PersonId,
        project: &ProjectName,
        category: UnitCategory,
        today: NaiveDate,
    ) -> Result<Application, AllocationError> {
        let person = self.require_role(actor, Role::Applicant)?;
        let target = self.state.project(project)?;

        self.policy.can_apply(person, target, category, today)?;
        check_applicant_against_officer_post(&self.state, person, target)?;
        if let Some(active) = self.state.active_application(person) {
            return Err(AllocationError::DuplicateActiveApplication {
                person: person.id.clone(),
                application: active.id.clone(),
            });
        }

        let id = self.state.next_application_id();
        let application = Application {
            id: id.clone(),
            applicant: actor.clone(),
            project: project.clone(),
            category,
            status: ApplicationStatus::Pending,
            submitted_on: today,
            booked_on: None,
            withdrawal: None,
        };
        self.state.insert_application(application.clone());
        self.state.person_mut(actor)?.current_application = Some(id);
        self.state.project_mut(project)?.applicants.insert(actor.clone());

        info!(application = %application.id, applicant = %actor, project = %project, %category, "application submitted");
        Ok(application)
    }

    /// Withdrawal takes effect at once; a unit held by a SUCCESSFUL application stays
    /// allocated until a manager acknowledges the withdrawal.
    pub fn request_withdrawal(
        &mut self,
        actor: &PersonId,
        application: &ApplicationId,
        today: NaiveDate,
    ) -> Result<Application, AllocationError> {
        self.state.person(actor)?;
        let record = self.state.application_mut(application)?;
        if record.applicant != *actor {
            return Err(AllocationError::NotApplicationOwner {
                actor: actor.clone(),
                application: application.clone(),
            });
        }
        record.withdraw(today)?;

        info!(application = %application, applicant = %actor, "application withdrawn");
        Ok(record.clone())
    }

    pub fn acknowledge_withdrawal(
        &mut self,
        actor: &PersonId,
        application: &ApplicationId,
    ) -> Result<Application, AllocationError> {
        let (project, category) = self.application_scope(application)?;
        self.require_manager_of(actor, &project)?;
        self.state.project(&project)?.inventory.remaining(category)?;

        let record = self.state.application_mut(application)?;
        let withdrawal = record.acknowledge_withdrawal()?;
        let snapshot = record.clone();

        if withdrawal.holds_unit() {
            let remaining = self.state.project_mut(&project)?.inventory.release(category)?;
            info!(application = %application, project = %project, %category, remaining, "withdrawn unit released");
        }

        info!(application = %application, manager = %actor, "withdrawal acknowledged");
        Ok(snapshot)
    }

    pub fn approve_application(
        &mut self,
        actor: &PersonId,
        application: &ApplicationId,
    ) -> Result<Application, AllocationError> {
        let (project, category) = self.application_scope(application)?;
        self.require_manager_of(actor, &project)?;

        let next = self
            .state
            .application(application)?
            .status
            .transition(ApplicationAction::Approve)?;
        let remaining = self.state.project(&project)?.inventory.remaining(category)?;
        if remaining == 0 {
            return Err(AllocationError::NoUnitsAvailable { project, category });
        }

        let remaining = self.state.project_mut(&project)?.inventory.decrement(category)?;
        let record = self.state.application_mut(application)?;
        record.status = next;

        info!(application = %application, manager = %actor, %category, remaining, "application approved");
        Ok(record.clone())
    }

    pub fn reject_application(
        &mut self,
        actor: &PersonId,
        application: &ApplicationId,
    ) -> Result<Application, AllocationError> {
        let (project, _) = self.application_scope(application)?;
        self.require_manager_of(actor, &project)?;

        let record = self.state.application_mut(application)?;
        record.status = record.status.transition(ApplicationAction::Reject)?;

        info!(application = %application, manager = %actor, "application rejected");
        Ok(record.clone())
    }

    pub fn book_flat(
        &mut self,
        actor: &PersonId,
        application: &ApplicationId,
        today: NaiveDate,
    ) -> Result<Application, AllocationError> {
        let (project, _) = self.application_scope(application)?;
        self.require_officer_of(actor, &project)?;

        let record = self.state.application_mut(application)?;
        record.book(today)?;

        info!(application = %application, officer = %actor, "flat booked");
        Ok(record.clone())
    }

    pub fn booking_receipt(
        &self,
        actor: &PersonId,
        application: &ApplicationId,
    ) -> Result<BookingReceipt, AllocationError> {
        let record = self.state.application(application)?;
        self.require_officer_of(actor, &record.project)?;
        if record.status != ApplicationStatus::Booked {
            return Err(AllocationError::NotBooked {
                application: application.clone(),
                status: record.status,
            });
        }

        let applicant = self.state.person(&record.applicant)?;
        let project = self.state.project(&record.project)?;
        Ok(BookingReceipt {
            application_id: record.id.clone(),
            applicant: applicant.id.clone(),
            age: applicant.age,
            marital_status: applicant.marital_status,
            category: record.category,
            project: project.name.clone(),
            neighbourhood: project.neighbourhood.clone(),
            booked_on: record.booked_on,
        })
    }

    pub fn register_officer(
        &mut self,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<OfficerRegistrationView, AllocationError> {
        let person = self.require_role(officer, Role::Officer)?;
        let target = self.state.project(project)?;
        check_officer_registration(&self.state, person, target)?;

        self.state.project_mut(project)?.pending_officers.insert(officer.clone());
        self.state.person_mut(officer)?.officer_post = Some(OfficerPost {
            project: project.clone(),
            standing: OfficerStanding::Pending,
        });

        info!(officer = %officer, project = %project, "officer registration requested");
        self.registration_view(officer, project)
    }

    /// Re-validates the applicant rule, since the officer may have applied somewhere
    /// conflicting after queueing the request.
    pub fn approve_officer_registration(
        &mut self,
        actor: &PersonId,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<OfficerRegistrationView, AllocationError> {
        self.require_manager_of(actor, project)?;
        self.require_pending_request(officer, project)?;

        let person = self.state.person(officer)?;
        let target = self.state.project(project)?;
        check_officer_against_application(&self.state, person, target)?;
        if target.remaining_officer_slots() == 0 {
            return Err(AllocationError::SlotsFull {
                project: project.clone(),
                capacity: target.officer_slots,
            });
        }

        let target = self.state.project_mut(project)?;
        target.pending_officers.remove(officer);
        target.officers.insert(officer.clone());
        self.state.person_mut(officer)?.officer_post = Some(OfficerPost {
            project: project.clone(),
            standing: OfficerStanding::Assigned,
        });

        info!(officer = %officer, project = %project, manager = %actor, "officer registration approved");
        self.registration_view(officer, project)
    }

    pub fn reject_officer_registration(
        &mut self,
        actor: &PersonId,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<OfficerRegistrationView, AllocationError> {
        self.require_manager_of(actor, project)?;
        self.require_pending_request(officer, project)?;
        self.clear_pending_request(officer, project)?;

        info!(officer = %officer, project = %project, manager = %actor, "officer registration rejected");
        self.registration_view(officer, project)
    }

    pub fn withdraw_officer_registration(
        &mut self,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<OfficerRegistrationView, AllocationError> {
        self.require_pending_request(officer, project)?;
        self.clear_pending_request(officer, project)?;

        info!(officer = %officer, project = %project, "officer registration withdrawn");
        self.registration_view(officer, project)
    }

    pub fn set_unit_count(
        &mut self,
        actor: &PersonId,
        project: &ProjectName,
        category: UnitCategory,
        count: u32,
    ) -> Result<u32, AllocationError> {
        self.require_manager_of(actor, project)?;
        self.state
            .project_mut(project)?
            .inventory
            .set(category, count)?;

        info!(project = %project, %category, count, manager = %actor, "unit count overridden");
        Ok(count)
    }

    pub fn remaining_units(
        &self,
        project: &ProjectName,
        category: UnitCategory,
    ) -> Result<u32, AllocationError> {
        Ok(self.state.project(project)?.inventory.remaining(category)?)
    }

    pub fn pending_applications(
        &self,
        actor: &PersonId,
        project: &ProjectName,
    ) -> Result<Vec<&Application>, AllocationError> {
        self.require_manager_of(actor, project)?;
        Ok(self
            .state
            .applications_for(project)
            .filter(|application| application.status == ApplicationStatus::Pending)
            .collect())
    }

    /// Withdrawals the manager has not yet acknowledged.
    pub fn pending_withdrawals(
        &self,
        actor: &PersonId,
        project: &ProjectName,
    ) -> Result<Vec<&Application>, AllocationError> {
        self.require_manager_of(actor, project)?;
        Ok(self
            .state
            .applications_for(project)
            .filter(|application| {
                application
                    .withdrawal
                    .map(|withdrawal| !withdrawal.acknowledged)
                    .unwrap_or(false)
            })
            .collect())
    }

    pub fn application_report(
        &self,
        actor: &PersonId,
        project: &ProjectName,
        filter: &ReportFilter,
    ) -> Result<Vec<ReportRow>, AllocationError> {
        self.require_manager_of(actor, project)?;

        let mut rows = Vec::new();
        for application in self.state.applications_for(project) {
            let applicant = self.state.person(&application.applicant)?;
            if filter.category.is_some_and(|wanted| wanted != application.category) {
                continue;
            }
            if filter
                .marital_status
                .is_some_and(|wanted| wanted != applicant.marital_status)
            {
                continue;
            }
            rows.push(ReportRow {
                application_id: application.id.clone(),
                applicant: applicant.id.clone(),
                age: applicant.age,
                marital_status: applicant.marital_status,
                category: application.category,
                status: application.status,
            });
        }
        Ok(rows)
    }

    fn build_project(&self, draft: ProjectDraft) -> Result<Project, AllocationError> {
        let name = ProjectName::new(draft.name.trim());
        if name.as_str().is_empty() {
            return Err(AllocationError::InvalidInput(
                "project name must not be blank".to_string(),
            ));
        }
        if self.state.find_project(&name).is_some() {
            return Err(AllocationError::DuplicateProject(name));
        }
        if draft.units.is_empty() {
            return Err(AllocationError::InvalidInput(format!(
                "{name} must offer at least one unit category"
            )));
        }
        let window = ApplicationWindow::new(draft.opening_date, draft.closing_date).ok_or(
            AllocationError::InvalidWindow {
                opening: draft.opening_date,
                closing: draft.closing_date,
            },
        )?;

        Ok(Project {
            name,
            neighbourhood: draft.neighbourhood.trim().to_string(),
            inventory: UnitInventory::new(draft.units),
            window,
            visible: draft.visible.unwrap_or(true),
            manager: None,
            officer_slots: draft.officer_slots.unwrap_or(self.officer_slots),
            officers: BTreeSet::new(),
            pending_officers: BTreeSet::new(),
            applicants: BTreeSet::new(),
        })
    }

    fn require_role(&self, actor: &PersonId, role: Role) -> Result<&Person, AllocationError> {
        let person = self.state.person(actor)?;
        if !person.has_role(role) {
            return Err(AllocationError::MissingRole {
                person: actor.clone(),
                role,
            });
        }
        Ok(person)
    }

    fn require_manager_of(
        &self,
        actor: &PersonId,
        project: &ProjectName,
    ) -> Result<(), AllocationError> {
        self.require_role(actor, Role::Manager)?;
        if !self.state.project(project)?.is_managed_by(actor) {
            return Err(AllocationError::NotProjectManager {
                actor: actor.clone(),
                project: project.clone(),
            });
        }
        Ok(())
    }

    fn require_officer_of(
        &self,
        actor: &PersonId,
        project: &ProjectName,
    ) -> Result<(), AllocationError> {
        self.require_role(actor, Role::Officer)?;
        if !self.state.project(project)?.officers.contains(actor) {
            return Err(AllocationError::NotProjectOfficer {
                actor: actor.clone(),
                project: project.clone(),
            });
        }
        Ok(())
    }

    fn require_pending_request(
        &self,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<(), AllocationError> {
        let person = self.state.person(officer)?;
        self.state.project(project)?;
        let pending = matches!(
            &person.officer_post,
            Some(post) if post.project == *project && post.standing == OfficerStanding::Pending
        );
        if !pending {
            return Err(ConflictError::NoPendingRequest {
                officer: officer.clone(),
                project: project.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn clear_pending_request(
        &mut self,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<(), AllocationError> {
        self.state.project_mut(project)?.pending_officers.remove(officer);
        self.state.person_mut(officer)?.officer_post = None;
        Ok(())
    }

    fn application_scope(
        &self,
        application: &ApplicationId,
    ) -> Result<(ProjectName, UnitCategory), AllocationError> {
        let record = self.state.application(application)?;
        Ok((record.project.clone(), record.category))
    }

    fn registration_view(
        &self,
        officer: &PersonId,
        project: &ProjectName,
    ) -> Result<OfficerRegistrationView, AllocationError> {
        let person = self.state.person(officer)?;
        let target = self.state.project(project)?;
        Ok(OfficerRegistrationView {
            officer: officer.clone(),
            project: project.clone(),
            standing: person
                .officer_post
                .as_ref()
                .filter(|post| post.project == *project)
                .map(|post| post.standing),
            remaining_slots: target.remaining_officer_slots(),
        })
    }
}
