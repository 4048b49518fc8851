#[macro_use]
extern crate log;

use clap::Parser;
use user_error::{UserFacingError, UFE};

use probe_runtime::{probe_library, LibraryResolver, ProbeError, Result};

use crate::probe_options::ProbeOptions;
use crate::report::print_report;

mod probe_options;
mod report;

/// Returns whether every probe succeeded.
fn run() -> Result<bool> {
    let options: ProbeOptions = ProbeOptions::parse();
    let candidates = options.candidates();
    debug!("Candidates: {:?}", candidates);

    let report = probe_library(&LibraryResolver::new(candidates), &options.probes())?;
    print_report(&report);

    Ok(report.all_succeeded())
}

fn main() {
    env_logger::init();

    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => handle_probe_error(error),
    }
}

pub fn handle_probe_error(error: ProbeError) {
    let error: Box<dyn std::error::Error> = Box::new(error);
    let user_facing_error: UserFacingError = error.into();
    user_facing_error.print_and_exit();
}
