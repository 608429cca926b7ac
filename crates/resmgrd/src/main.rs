//! Entry point for the `resmgrd` binary.

use std::process::ExitCode;

fn main() -> ExitCode {
    match resmgrd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("resmgrd: {error}");
            ExitCode::FAILURE
        }
    }
}
