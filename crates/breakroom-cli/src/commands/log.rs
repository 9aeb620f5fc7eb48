use breakroom_core::BreakLogStore;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum LogAction {
    /// Show recent break history
    Show {
        /// Most recent entries to print
        #[arg(long, default_value = "50")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the break history
    Clear,
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = BreakLogStore::new()?;
    match action {
        LogAction::Show { limit, json } => {
            let entries = store.entries()?;
            let start = entries.len().saturating_sub(limit);
            let recent = &entries[start..];
            if json {
                println!("{}", serde_json::to_string_pretty(recent)?);
            } else {
                for entry in recent {
                    println!(
                        "{}  {:<10}  {:<10}  {}",
                        entry.at.format("%Y-%m-%d %H:%M"),
                        entry.tier_name,
                        entry.kind,
                        entry.reason.as_deref().unwrap_or("-"),
                    );
                }
            }
        }
        LogAction::Clear => {
            store.clear()?;
            println!("break log cleared");
        }
    }
    Ok(())
}
