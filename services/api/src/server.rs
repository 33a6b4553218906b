use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryNoticePublisher, SAMPLE_PEOPLE_CSV, SAMPLE_PROJECTS_CSV};
use crate::routes::with_allocation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bto_allocation::config::{AllocationConfig, AppConfig};
use bto_allocation::error::AppError;
use bto_allocation::telemetry;
use bto_allocation::workflows::allocation::{AllocationCoordinator, AllocationService};
use bto_allocation::workflows::RosterImporter;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let roster = args.people_csv.take().zip(args.projects_csv.take());
    let coordinator = seed_coordinator(&config.allocation, roster)?;
    let notices = Arc::new(InMemoryNoticePublisher::default());
    let allocation_service = Arc::new(AllocationService::new(coordinator, notices));

    let app = with_allocation_routes(allocation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "bto allocation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Builds a coordinator from a people and projects roster pair, falling back to the
/// bundled sample roster when none is given.
pub(crate) fn seed_coordinator(
    config: &AllocationConfig,
    roster: Option<(PathBuf, PathBuf)>,
) -> Result<AllocationCoordinator, AppError> {
    let mut coordinator = AllocationCoordinator::new(config);
    match roster {
        Some((people, projects)) => {
            RosterImporter::from_paths(&mut coordinator, people, projects)?;
        }
        None => {
            RosterImporter::from_readers(
                &mut coordinator,
                SAMPLE_PEOPLE_CSV.as_bytes(),
                SAMPLE_PROJECTS_CSV.as_bytes(),
            )?;
        }
    }
    Ok(coordinator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bto_allocation::workflows::allocation::ProjectName;

    fn write_roster(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).expect("write roster file");
        path
    }

    #[test]
    fn sample_roster_seeds_when_no_files_are_given() {
        let coordinator =
            seed_coordinator(&AllocationConfig::default(), None).expect("sample roster");
        assert!(coordinator
            .project(&ProjectName::new("Acacia Breeze"))
            .is_ok());
    }

    #[test]
    fn roster_pair_replaces_the_sample() {
        let people = write_roster(
            "seed-people.csv",
            "NRIC,Age,Marital Status,Roles\nT0172419Z,40,Married,Manager\n",
        );
        let projects = write_roster(
            "seed-projects.csv",
            "Project Name,Neighbourhood,Two Room Units,Three Room Units,Opening Date,Closing Date,Manager\n\
Dover Vista,Queenstown,4,,2025-02-01,2025-03-31,T0172419Z\n",
        );

        let coordinator =
            seed_coordinator(&AllocationConfig::default(), Some((people.clone(), projects.clone())))
                .expect("roster pair imports");
        let _ = std::fs::remove_file(people);
        let _ = std::fs::remove_file(projects);

        assert!(coordinator
            .project(&ProjectName::new("Dover Vista"))
            .is_ok());
        assert!(coordinator
            .project(&ProjectName::new("Acacia Breeze"))
            .is_err());
    }
}
