//! `cabin inspect` - load a configuration and dump engine state.

use std::path::PathBuf;

use anyhow::Context;
use cabin_config::SystemConfig;
use cabin_core::{Family, ResourceManager};
use clap::Args;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Path to the system configuration (TOML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Limit the dump to one zone
    #[arg(short, long)]
    pub zone: Option<String>,
}

/// Runs the inspect command.
pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let config = SystemConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let mut mgr = ResourceManager::new();
    config.apply(&mut mgr).context("installing configuration")?;

    println!("Zones:");
    for (id, name) in mgr.zones().iter() {
        println!("   {id}: {name}");
    }

    println!("Applications:");
    let mut apps: Vec<_> = mgr.applications().iter().collect();
    apps.sort_by(|a, b| a.appid.cmp(&b.appid));
    for app in apps {
        println!(
            "   '{}' class:'{}' screen_priority:{} privileges:{}/{} requisites:{}/{}",
            app.appid,
            app.resource_class,
            app.screen_priority,
            app.privileges.screen,
            app.privileges.audio,
            app.requisites.screen,
            app.requisites.audio,
        );
    }

    for (id, name) in mgr.zones().iter() {
        if let Some(only) = &args.zone
            && only != name
        {
            continue;
        }
        println!("Zone '{name}':");
        print!("{}", indent(&mgr.dump(Family::Screen, id)));
        print!("{}", indent(&mgr.dump(Family::Audio, id)));
    }

    Ok(())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("   {line}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_prefixes_every_line() {
        assert_eq!(indent("a\nb"), "   a\n   b\n");
    }
}
