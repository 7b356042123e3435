use clap::{Parser, Subcommand};

use gatehouse::config::AppConfig;
use gatehouse::error::AppError;
use gatehouse::telemetry;

use crate::demo::{run_demo, DemoArgs};
use crate::serve::run_serve;

#[derive(Parser, Debug)]
#[command(
    name = "gatehouse-bot",
    about = "Run the community gatehouse workflows from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Consume platform events as line-delimited JSON on stdin (default)
    Serve,
    /// Run the end-to-end workflow demo against scripted fakes
    Demo(DemoArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli.command.unwrap_or(Command::Serve);

    match command {
        Command::Serve => run_serve(config).await,
        Command::Demo(args) => run_demo(args, config).await,
    }
}
