use colored::Colorize;
use std::process::ExitCode;

use encutil::cli::{TerminalPrompt, UseCase, USAGE};
use encutil::config::{Config, DEFAULT_LOG_FILTER};
use encutil::{EncUtilError, Result};

fn main() -> ExitCode {
    init_logging();

    let args: Vec<std::ffi::OsString> = std::env::args_os().collect();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if matches!(e, EncUtilError::Usage) {
                eprintln!("{}", USAGE);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[std::ffi::OsString]) -> Result<()> {
    let use_case = UseCase::from_args(args)?;
    use_case.run(&mut TerminalPrompt::new(), &Config::default())
}

fn init_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
