//! mwx - scheduled Mount Mansfield weather collection jobs.

use clap::Parser;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "mwx",
    version,
    about = "Mount Mansfield weather collection jobs"
)]
struct Cli {
    #[command(flatten)]
    settings: mwx_cmd::settings::Settings,

    #[command(subcommand)]
    command: mwx_cmd::Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let status = mwx_cmd::run(cli.settings, cli.command).await;
    log::info!("status {}", status.status_code);
    println!("{}", status.body);
    if status.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
