use std::path::PathBuf;

use breakroom_core::Scenario;
use chrono::Utc;

pub fn run(
    scenario: Option<PathBuf>,
    json: bool,
    full: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = match scenario {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str::<Scenario>(&content)?
        }
        None => Scenario::demo(Utc::now()),
    };

    let report = scenario.run();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "scenario: {} ({} -> {})",
        report.name, report.started, report.finished
    );
    if full {
        for event in &report.events {
            println!("{}", serde_json::to_string(event)?);
        }
    } else {
        for event in report.notable_events() {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(())
}
