use breakroom_core::{ConfigStore, ScreenType, Tier, TierColor};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum TierAction {
    /// List configured tiers
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a tier
    Add {
        /// Display name
        name: String,
        /// Minutes of active time between breaks
        #[arg(long)]
        interval_mins: u64,
        /// Break length in seconds
        #[arg(long)]
        break_secs: u64,
        /// Warning border color (yellow, red, blue, ...)
        #[arg(long, default_value = "yellow")]
        color: String,
        /// Break screen style: short or long
        #[arg(long, default_value = "short")]
        screen: String,
    },
    /// Remove a tier by name or id
    Remove {
        /// Tier name or id
        tier: String,
    },
}

pub fn run(action: TierAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = ConfigStore::new()?;
    match action {
        TierAction::List { json } => {
            let config = store.load_or_default();
            if json {
                println!("{}", serde_json::to_string_pretty(&config.tiers)?);
            } else {
                for tier in &config.tiers {
                    println!(
                        "{}  every {} min, {} s break, {} screen, {}",
                        tier.name,
                        tier.active_interval_secs / 60,
                        tier.break_duration_secs,
                        tier.screen_type,
                        tier.color,
                    );
                }
            }
        }
        TierAction::Add {
            name,
            interval_mins,
            break_secs,
            color,
            screen,
        } => {
            let color = color.parse::<TierColor>()?;
            let screen = screen.parse::<ScreenType>()?;
            let mut config = store.load_or_default();
            config
                .tiers
                .push(Tier::new(name, color, interval_mins * 60, break_secs, screen));
            config.validate()?;
            store.save(&config)?;
            println!("ok");
        }
        TierAction::Remove { tier } => {
            let mut config = store.load_or_default();
            let before = config.tiers.len();
            config
                .tiers
                .retain(|t| t.name != tier && t.id.to_string() != tier);
            if config.tiers.len() == before {
                eprintln!("no such tier: {tier}");
                std::process::exit(1);
            }
            store.save(&config)?;
            println!("ok");
        }
    }
    Ok(())
}
