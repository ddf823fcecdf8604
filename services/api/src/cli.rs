use crate::demo::{run_availability_check, run_demo, AvailabilityCheckArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use petconnect::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "PetConnect Coordinator",
    about = "Run and exercise the PetConnect adoption and fostering coordination service",
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
    /// Offline availability tools for staff schedules
    Availability {
        #[command(subcommand)]
        command: AvailabilityCommand,
    },
    /// Walk an adoption, a foster decision and an availability edit against an in-memory backend
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum AvailabilityCommand {
    /// Check a candidate slot (and optionally a meeting time) against existing slots
    Check(AvailabilityCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the backend base URL
    #[arg(long)]
    pub(crate) backend_url: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Availability {
            command: AvailabilityCommand::Check(args),
        } => run_availability_check(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
