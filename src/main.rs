use anyhow::Context;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "RISKGATE_LOG";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("riskgate=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    match riskgate::run().context("riskgate failed") {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(riskgate::EXIT_ERROR);
        }
    }
}
