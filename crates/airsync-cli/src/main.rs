use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use airsync_cli::cli::Cli;
use airsync_cli::style;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins unless -v asks for debug output
    let filter = if cli.verbose {
        EnvFilter::new("airsync=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("airsync=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let no_color = cli.no_color;
    match airsync_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::format_error(&format!("{:#}", e), no_color));
            ExitCode::FAILURE
        }
    }
}
