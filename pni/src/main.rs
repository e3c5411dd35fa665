use clap::Parser;
use pni::{Cli, LogFormat, run};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

const EXIT_FAILURE: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    install_tracing(&cli.log, cli.log_format);

    tokio::select! {
        result = run(cli) => match result {
            Ok(summary) => println!("{summary}"),
            Err(err) => {
                eprintln!("ERROR: {err}");
                std::process::exit(EXIT_FAILURE);
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("interrupted");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}

fn install_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().with_current_span(true).init(),
    }
}
