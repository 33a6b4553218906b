use crate::demo::{run_demo, DemoArgs};
use crate::server;
use bto_allocation::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "BTO Allocation",
    about = "Run or demonstrate the BTO eligibility and allocation engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk through an application round end to end on the console
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// People roster CSV (NRIC, Age, Marital Status, Roles); needs --projects-csv
    #[arg(long, requires = "projects_csv")]
    pub(crate) people_csv: Option<PathBuf>,
    /// Project roster CSV (Project Name, Neighbourhood, unit counts, dates, Manager); needs --people-csv
    #[arg(long, requires = "people_csv")]
    pub(crate) projects_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
    }
}
