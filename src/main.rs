use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use yapi::cli::{command, run};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("YAPI_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let matches = command().get_matches();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = run(&matches, &mut out);
    let _ = out.flush();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!("Run `yapi --help` for usage.");
            ExitCode::FAILURE
        }
    }
}
