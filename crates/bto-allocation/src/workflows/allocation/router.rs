use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    ApplicationId, MaritalStatus, NewPerson, PersonId, ProjectDraft, ProjectName, UnitCategory,
};
use super::errors::{AllocationError, ErrorKind};
use super::notices::NoticePublisher;
use super::service::{AllocationService, AllocationServiceError};
use super::views::{ProjectFilter, ReportFilter};

type SharedService<N> = State<Arc<AllocationService<N>>>;

/// Router builder exposing the allocation operations as JSON endpoints.
pub fn allocation_router<N>(service: Arc<AllocationService<N>>) -> Router
where
    N: NoticePublisher + 'static,
{
    Router::new()
        .route("/api/v1/bto/people", post(register_person_handler::<N>))
        .route("/api/v1/bto/people/:person_id", get(person_handler::<N>))
        .route(
            "/api/v1/bto/people/:person_id/eligibility",
            get(eligibility_handler::<N>),
        )
        .route(
            "/api/v1/bto/people/:person_id/eligible-projects",
            get(eligible_projects_handler::<N>),
        )
        .route(
            "/api/v1/bto/projects",
            get(filter_projects_handler::<N>).post(create_project_handler::<N>),
        )
        .route("/api/v1/bto/projects/:project", get(project_handler::<N>))
        .route(
            "/api/v1/bto/projects/:project/manager",
            post(assign_manager_handler::<N>),
        )
        .route(
            "/api/v1/bto/projects/:project/visibility",
            post(visibility_handler::<N>),
        )
        .route(
            "/api/v1/bto/projects/:project/units/:category",
            get(remaining_units_handler::<N>).put(set_unit_count_handler::<N>),
        )
        .route(
            "/api/v1/bto/projects/:project/applications",
            get(pending_applications_handler::<N>),
        )
        .route(
            "/api/v1/bto/projects/:project/withdrawals",
            get(pending_withdrawals_handler::<N>),
        )
        .route(
            "/api/v1/bto/projects/:project/report",
            get(report_handler::<N>),
        )
        .route(
            "/api/v1/bto/projects/:project/officers",
            post(register_officer_handler::<N>),
        )
        .route(
            "/api/v1/bto/projects/:project/officers/:officer/:decision",
            post(officer_decision_handler::<N>),
        )
        .route(
            "/api/v1/bto/applications",
            post(submit_application_handler::<N>),
        )
        .route(
            "/api/v1/bto/applications/:application_id",
            get(application_handler::<N>),
        )
        .route(
            "/api/v1/bto/applications/:application_id/approve",
            post(approve_application_handler::<N>),
        )
        .route(
            "/api/v1/bto/applications/:application_id/reject",
            post(reject_application_handler::<N>),
        )
        .route(
            "/api/v1/bto/applications/:application_id/withdrawal",
            post(withdrawal_handler::<N>),
        )
        .route(
            "/api/v1/bto/applications/:application_id/withdrawal/acknowledge",
            post(acknowledge_withdrawal_handler::<N>),
        )
        .route(
            "/api/v1/bto/applications/:application_id/book",
            post(book_handler::<N>),
        )
        .route(
            "/api/v1/bto/applications/:application_id/receipt",
            get(receipt_handler::<N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct DatedActorRequest {
    pub actor: String,
    pub on: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub actor: String,
    pub project: ProjectDraft,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub actor: String,
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct UnitCountRequest {
    pub actor: String,
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub struct OfficerRequest {
    pub officer: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitApplicationRequest {
    pub actor: String,
    pub project: String,
    pub category: UnitCategory,
    pub on: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct EligibilityQuery {
    pub project: String,
    pub category: UnitCategory,
    pub on: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub on: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub actor: String,
    #[serde(default)]
    pub category: Option<UnitCategory>,
    #[serde(default)]
    pub marital_status: Option<MaritalStatus>,
}

#[derive(Debug, Serialize)]
struct UnitCountView {
    project: ProjectName,
    category: UnitCategory,
    remaining: u32,
}

pub(crate) async fn register_person_handler<N>(
    State(service): SharedService<N>,
    Json(person): Json<NewPerson>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    respond(StatusCode::CREATED, service.register_person(person))
}

pub(crate) async fn person_handler<N>(
    State(service): SharedService<N>,
    Path(person_id): Path<String>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&person_id) {
        Ok(id) => respond(StatusCode::OK, service.person(&id)),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn eligibility_handler<N>(
    State(service): SharedService<N>,
    Path(person_id): Path<String>,
    Query(query): Query<EligibilityQuery>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&person_id) {
        Ok(id) => respond(
            StatusCode::OK,
            service.check_eligibility(
                &id,
                &ProjectName::new(query.project),
                query.category,
                query.on,
            ),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn eligible_projects_handler<N>(
    State(service): SharedService<N>,
    Path(person_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&person_id) {
        Ok(id) => respond(StatusCode::OK, service.list_eligible_projects(&id, query.on)),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn filter_projects_handler<N>(
    State(service): SharedService<N>,
    Query(filter): Query<ProjectFilter>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    respond(StatusCode::OK, service.filter_projects(&filter))
}

pub(crate) async fn create_project_handler<N>(
    State(service): SharedService<N>,
    Json(request): Json<CreateProjectRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&request.actor) {
        Ok(actor) => respond(
            StatusCode::CREATED,
            service.create_project(&actor, request.project),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn project_handler<N>(
    State(service): SharedService<N>,
    Path(project): Path<String>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    respond(StatusCode::OK, service.project(&ProjectName::new(project)))
}

pub(crate) async fn assign_manager_handler<N>(
    State(service): SharedService<N>,
    Path(project): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&request.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.assign_manager(&actor, &ProjectName::new(project)),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn visibility_handler<N>(
    State(service): SharedService<N>,
    Path(project): Path<String>,
    Json(request): Json<VisibilityRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&request.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.set_visibility(&actor, &ProjectName::new(project), request.visible),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn remaining_units_handler<N>(
    State(service): SharedService<N>,
    Path((project, category)): Path<(String, String)>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    let project = ProjectName::new(project);
    let category = match parse_category(&category) {
        Ok(category) => category,
        Err(error) => return error_response(error.into()),
    };
    let result = service
        .remaining_units(&project, category)
        .map(|remaining| UnitCountView {
            project,
            category,
            remaining,
        });
    respond(StatusCode::OK, result)
}

pub(crate) async fn set_unit_count_handler<N>(
    State(service): SharedService<N>,
    Path((project, category)): Path<(String, String)>,
    Json(request): Json<UnitCountRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    let project = ProjectName::new(project);
    let parsed = parse_person(&request.actor)
        .and_then(|actor| parse_category(&category).map(|category| (actor, category)));
    let (actor, category) = match parsed {
        Ok(parsed) => parsed,
        Err(error) => return error_response(error.into()),
    };
    let result = service
        .set_unit_count(&actor, &project, category, request.count)
        .map(|remaining| UnitCountView {
            project,
            category,
            remaining,
        });
    respond(StatusCode::OK, result)
}

pub(crate) async fn pending_applications_handler<N>(
    State(service): SharedService<N>,
    Path(project): Path<String>,
    Query(query): Query<ActorQuery>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&query.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.pending_applications(&actor, &ProjectName::new(project)),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn pending_withdrawals_handler<N>(
    State(service): SharedService<N>,
    Path(project): Path<String>,
    Query(query): Query<ActorQuery>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&query.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.pending_withdrawals(&actor, &ProjectName::new(project)),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn report_handler<N>(
    State(service): SharedService<N>,
    Path(project): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    let filter = ReportFilter {
        category: query.category,
        marital_status: query.marital_status,
    };
    match parse_person(&query.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.application_report(&actor, &ProjectName::new(project), &filter),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn register_officer_handler<N>(
    State(service): SharedService<N>,
    Path(project): Path<String>,
    Json(request): Json<OfficerRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&request.officer) {
        Ok(officer) => respond(
            StatusCode::ACCEPTED,
            service.register_officer(&officer, &ProjectName::new(project)),
        ),
        Err(error) => error_response(error.into()),
    }
}

/// `approve` and `reject` are manager decisions; `withdraw` is the officer's own.
pub(crate) async fn officer_decision_handler<N>(
    State(service): SharedService<N>,
    Path((project, officer, decision)): Path<(String, String, String)>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    let project = ProjectName::new(project);
    let parsed = parse_person(&officer)
        .and_then(|officer| parse_person(&request.actor).map(|actor| (officer, actor)));
    let (officer, actor) = match parsed {
        Ok(parsed) => parsed,
        Err(error) => return error_response(error.into()),
    };

    let result = match decision.as_str() {
        "approve" => service.approve_officer_registration(&actor, &officer, &project),
        "reject" => service.reject_officer_registration(&actor, &officer, &project),
        "withdraw" if actor == officer => service.withdraw_officer_registration(&officer, &project),
        "withdraw" => Err(AllocationError::InvalidInput(
            "only the officer may withdraw their own registration".to_string(),
        )
        .into()),
        other => Err(AllocationError::InvalidInput(format!(
            "unknown officer registration decision '{other}'"
        ))
        .into()),
    };
    respond(StatusCode::OK, result)
}

pub(crate) async fn submit_application_handler<N>(
    State(service): SharedService<N>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&request.actor) {
        Ok(actor) => respond(
            StatusCode::CREATED,
            service.submit_application(
                &actor,
                &ProjectName::new(request.project),
                request.category,
                request.on,
            ),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn application_handler<N>(
    State(service): SharedService<N>,
    Path(application_id): Path<String>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.application(&ApplicationId(application_id)),
    )
}

pub(crate) async fn approve_application_handler<N>(
    State(service): SharedService<N>,
    Path(application_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&request.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.approve_application(&actor, &ApplicationId(application_id)),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn reject_application_handler<N>(
    State(service): SharedService<N>,
    Path(application_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&request.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.reject_application(&actor, &ApplicationId(application_id)),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn withdrawal_handler<N>(
    State(service): SharedService<N>,
    Path(application_id): Path<String>,
    Json(request): Json<DatedActorRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&request.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.request_withdrawal(&actor, &ApplicationId(application_id), request.on),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn acknowledge_withdrawal_handler<N>(
    State(service): SharedService<N>,
    Path(application_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&request.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.acknowledge_withdrawal(&actor, &ApplicationId(application_id)),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn book_handler<N>(
    State(service): SharedService<N>,
    Path(application_id): Path<String>,
    Json(request): Json<DatedActorRequest>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&request.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.book_flat(&actor, &ApplicationId(application_id), request.on),
        ),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn receipt_handler<N>(
    State(service): SharedService<N>,
    Path(application_id): Path<String>,
    Query(query): Query<ActorQuery>,
) -> Response
where
    N: NoticePublisher + 'static,
{
    match parse_person(&query.actor) {
        Ok(actor) => respond(
            StatusCode::OK,
            service.booking_receipt(&actor, &ApplicationId(application_id)),
        ),
        Err(error) => error_response(error.into()),
    }
}

fn parse_person(raw: &str) -> Result<PersonId, AllocationError> {
    PersonId::parse(raw).ok_or_else(|| AllocationError::InvalidPersonId(raw.to_string()))
}

fn parse_category(raw: &str) -> Result<UnitCategory, AllocationError> {
    raw.parse().map_err(AllocationError::InvalidInput)
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, AllocationServiceError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::PolicyDenial => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::StateConflict
        | ErrorKind::ResourceExhaustion
        | ErrorKind::AssignmentConflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
    }
}

fn error_response(error: AllocationServiceError) -> Response {
    match error {
        AllocationServiceError::Allocation(error) => {
            let kind = error.kind();
            let payload = json!({
                "error": error.to_string(),
                "code": error.code(),
                "kind": kind,
            });
            (status_for(kind), Json(payload)).into_response()
        }
        AllocationServiceError::StateUnavailable => {
            let payload = json!({
                "error": AllocationServiceError::StateUnavailable.to_string(),
                "code": "state_unavailable",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
