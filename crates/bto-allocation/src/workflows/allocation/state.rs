use std::collections::BTreeMap;

use super::domain::{Application, ApplicationId, Person, PersonId, Project, ProjectName};
use super::errors::AllocationError;

/// Everything the engine knows: people, projects, applications and the id sequence.
///
/// Mutation is crate-private so that only coordinator operations change it.
#[derive(Debug, Clone, Default)]
pub struct AllocationState {
    persons: BTreeMap<PersonId, Person>,
    projects: BTreeMap<ProjectName, Project>,
    applications: BTreeMap<ApplicationId, Application>,
    application_sequence: u64,
}

impl AllocationState {
    pub fn person(&self, id: &PersonId) -> Result<&Person, AllocationError> {
        self.persons
            .get(id)
            .ok_or_else(|| AllocationError::UnknownPerson(id.clone()))
    }

    pub fn project(&self, name: &ProjectName) -> Result<&Project, AllocationError> {
        self.find_project(name)
            .ok_or_else(|| AllocationError::UnknownProject(name.clone()))
    }

    pub fn find_project(&self, name: &ProjectName) -> Option<&Project> {
        self.projects.get(name)
    }

    pub fn application(&self, id: &ApplicationId) -> Result<&Application, AllocationError> {
        self.applications
            .get(id)
            .ok_or_else(|| AllocationError::UnknownApplication(id.clone()))
    }

    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.values()
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn applications(&self) -> impl Iterator<Item = &Application> {
        self.applications.values()
    }

    pub fn applications_for<'a>(
        &'a self,
        project: &ProjectName,
    ) -> impl Iterator<Item = &'a Application> + 'a {
        let project = project.clone();
        self.applications
            .values()
            .filter(move |application| application.project == project)
    }

    /// The person's current application if it still occupies their application slot.
    pub fn active_application(&self, person: &Person) -> Option<&Application> {
        person
            .current_application
            .as_ref()
            .and_then(|id| self.applications.get(id))
            .filter(|application| application.status.is_active())
    }

    pub(crate) fn person_mut(&mut self, id: &PersonId) -> Result<&mut Person, AllocationError> {
        self.persons
            .get_mut(id)
            .ok_or_else(|| AllocationError::UnknownPerson(id.clone()))
    }

    pub(crate) fn project_mut(
        &mut self,
        name: &ProjectName,
    ) -> Result<&mut Project, AllocationError> {
        self.projects
            .get_mut(name)
            .ok_or_else(|| AllocationError::UnknownProject(name.clone()))
    }

    pub(crate) fn application_mut(
        &mut self,
        id: &ApplicationId,
    ) -> Result<&mut Application, AllocationError> {
        self.applications
            .get_mut(id)
            .ok_or_else(|| AllocationError::UnknownApplication(id.clone()))
    }

    pub(crate) fn contains_person(&self, id: &PersonId) -> bool {
        self.persons.contains_key(id)
    }

    pub(crate) fn insert_person(&mut self, person: Person) {
        self.persons.insert(person.id.clone(), person);
    }

    pub(crate) fn insert_project(&mut self, project: Project) {
        self.projects.insert(project.name.clone(), project);
    }

    pub(crate) fn insert_application(&mut self, application: Application) {
        self.applications.insert(application.id.clone(), application);
    }

    pub(crate) fn next_application_id(&mut self) -> ApplicationId {
        self.application_sequence += 1;
        ApplicationId::from_sequence(self.application_sequence)
    }
}
