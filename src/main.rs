//! Binary entrypoint for the `fileassert` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = fileassert::logging::init() {
        eprintln!("Warning: failed to initialize logging: {err}");
    }

    // Recording is handled in commands::dispatch via FILEASSERT_RECORD=<dir>.
    match fileassert::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
