use std::process::ExitCode;

use clinic_followup::config::AppConfig;
use clinic_followup::{init_tracing, run, StartupError};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let result = match AppConfig::from_env() {
        Ok(config) => run(config).await,
        Err(e) => Err(StartupError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
