use breakroom_core::{ConfigStore, ExceptionRule, TriggerMode};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ExceptionAction {
    /// List exception rules
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an application rule
    Add {
        /// Application identifier (e.g. "us.zoom.xos")
        app_id: String,
        /// Display name used in logs
        app_name: String,
        /// When the rule applies: focused or opened
        #[arg(long, default_value = "focused")]
        trigger: String,
    },
    /// Remove the rules for an application
    Remove {
        /// Application identifier
        app_id: String,
    },
}

pub fn run(action: ExceptionAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = ConfigStore::new()?;
    match action {
        ExceptionAction::List { json } => {
            let config = store.load_or_default();
            if json {
                println!("{}", serde_json::to_string_pretty(&config.exception_rules)?);
            } else {
                for rule in &config.exception_rules {
                    println!("{}  {} ({})", rule.app_name, rule.app_id, rule.trigger);
                }
            }
        }
        ExceptionAction::Add {
            app_id,
            app_name,
            trigger,
        } => {
            let trigger = trigger.parse::<TriggerMode>()?;
            let mut config = store.load_or_default();
            config
                .exception_rules
                .push(ExceptionRule::new(app_id, app_name, trigger));
            store.save(&config)?;
            println!("ok");
        }
        ExceptionAction::Remove { app_id } => {
            let mut config = store.load_or_default();
            let before = config.exception_rules.len();
            config.exception_rules.retain(|r| r.app_id != app_id);
            if config.exception_rules.len() == before {
                eprintln!("no such rule: {app_id}");
                std::process::exit(1);
            }
            store.save(&config)?;
            println!("ok");
        }
    }
    Ok(())
}
