use probe_runtime::ProbeReport;

#[cfg(feature = "colored_terminal")]
pub fn print_report(report: &ProbeReport) {
    use colored::*;
    use comfy_table::Table;

    println!(
        "{} {}",
        "Loaded".green().bold(),
        report.library().display().to_string().bright_black()
    );

    let mut table = Table::new();
    table.set_header(vec!["Probe", "Stage", "Outcome"]);
    for outcome in report.outcomes() {
        let line = outcome.to_string();
        if outcome.is_success() {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
        table.add_row(vec![
            outcome.symbol().to_string(),
            outcome.stage().to_string(),
            describe(outcome),
        ]);
    }
    println!("{table}");
}

#[cfg(not(feature = "colored_terminal"))]
pub fn print_report(report: &ProbeReport) {
    println!("Loaded {}", report.library().display());
    for outcome in report.outcomes() {
        println!("{}", outcome);
    }
}

#[cfg(feature = "colored_terminal")]
fn describe(outcome: &probe_runtime::ProbeOutcome) -> String {
    match outcome.result() {
        Ok(value) => value.to_string(),
        Err(error) => error.kind().to_string(),
    }
}
