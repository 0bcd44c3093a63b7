use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use pdfbind::cli::{Cli, LogFormat};

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(err) = pdfbind::run(&cli) {
        error!("{err}");
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(cli: &Cli) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    match cli.log_format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
