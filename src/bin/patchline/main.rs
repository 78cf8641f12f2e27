use anyhow::Result;
use options::{Command, LogFormat};
use patchline::harness::ModuleRunner;
use patchline::module::ingest::Ingest;
use structopt::StructOpt;
use tracing::{error, info};

mod options;

#[tokio::main]
async fn main() -> Result<()> {
    let (command, runner) = init()?;

    let reason = match command {
        Command::Ingest(options) => runner.run(Ingest::new(options)).await,
    };

    if !reason.is_clean() {
        error!(?reason, "Module terminated abnormally");
        std::process::exit(1);
    }

    Ok(())
}

fn init() -> Result<(options::Command, ModuleRunner)> {
    let options = options::MainOptions::from_args();

    let formatter = tracing_subscriber::fmt().with_env_filter(options.log);

    match options.log_format {
        LogFormat::Text => formatter.init(),
        LogFormat::Compact => formatter.compact().init(),
        LogFormat::Json => formatter.json().init(),
    };

    let runner = match options.status_server {
        Some(port) => ModuleRunner::new_with_status_server(port),
        None => ModuleRunner::default(),
    };

    info!("Patchline {}", env!("CARGO_PKG_VERSION"));

    Ok((options.command, runner))
}
