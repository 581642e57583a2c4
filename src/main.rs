// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;
use std::process::ExitCode;

mod app;
mod cli;
mod core;
mod logging;
mod ui;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            return Ok(code);
        }
    };

    // A read-only home must not stop a CI run.
    match logging::initialize_logging() {
        Ok(path) => tracing::debug!(path = %path.display(), "File logging initialized."),
        Err(e) => eprintln!("warning: file logging disabled: {e}"),
    }

    Ok(cli::execute(cli).await)
}
