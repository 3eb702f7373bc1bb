//! `cabin simulate` - replay a scenario of resource operations.
//!
//! A scenario is a TOML list of steps driving the engine the way the
//! resource framework would: create/acquire/release/destroy resources,
//! raise and lower windows, toggle the disable overlay, and commit
//! decision rounds. Every notifier event is printed as it is flushed.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, bail};
use cabin_config::SystemConfig;
use cabin_core::{
    ApplicationClass, DisableFilter, Family, LifecycleEvent, Requisite, Resource, ResourceHandle,
    ResourceManager, ZoneId,
};
use clap::Args;
use serde::Deserialize;

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to the system configuration (TOML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Path to the scenario file (TOML)
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Skip the final state dump
    #[arg(short, long)]
    pub quiet: bool,
}

/// One scenario step; which fields apply depends on `op`.
#[derive(Debug, Deserialize)]
struct Step {
    op: String,
    /// Resource label, unique within the scenario.
    name: Option<String>,
    family: Option<String>,
    zone: Option<String>,
    appid: Option<String>,
    class: Option<String>,
    priority: Option<i32>,
    surface: Option<i32>,
    area: Option<String>,
    shared: Option<bool>,
    filter: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    steps: Vec<Step>,
}

/// A created resource and the context it was created under.
struct Tracked {
    res: Resource,
    zone: ZoneId,
    class: ApplicationClass,
}

/// Runs the simulate command.
pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let config = SystemConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let text = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("loading {}", args.scenario.display()))?;
    let scenario: Scenario = toml::from_str(&text).context("parsing scenario")?;

    let mut mgr = ResourceManager::new();
    config.apply(&mut mgr).context("installing configuration")?;
    mgr.register_sink(|event| println!("{event}"));

    let mut tracked: HashMap<String, Tracked> = HashMap::new();
    let mut next_handle = 1u64;

    for (index, step) in scenario.steps.iter().enumerate() {
        apply_step(&mut mgr, &mut tracked, &mut next_handle, step)
            .with_context(|| format!("step {} ({})", index + 1, step.op))?;
    }

    if !args.quiet {
        for (id, name) in mgr.zones().iter() {
            println!("Zone '{name}':");
            print!("{}", mgr.dump(Family::Screen, id));
            print!("{}", mgr.dump(Family::Audio, id));
        }
    }

    Ok(())
}

fn apply_step(
    mgr: &mut ResourceManager,
    tracked: &mut HashMap<String, Tracked>,
    next_handle: &mut u64,
    step: &Step,
) -> anyhow::Result<()> {
    match step.op.as_str() {
        "create" => {
            let name = required(&step.name, "name")?;
            if tracked.contains_key(name) {
                bail!("resource '{name}' already exists");
            }
            let family = parse_family(required(&step.family, "family")?)?;
            let zone = parse_zone(mgr, required(&step.zone, "zone")?)?;
            let appid = required(&step.appid, "appid")?;
            let class = ApplicationClass::new(
                step.class.as_deref().unwrap_or("basic"),
                0,
            );

            let handle = ResourceHandle(*next_handle);
            *next_handle += 1;

            let mut res = match family {
                Family::Screen => Resource::screen(handle),
                Family::Audio => Resource::audio(handle),
            };
            res = res.with_shared(step.shared.unwrap_or(false));
            res.attrs_mut().set_string("appid", appid);
            if let Some(priority) = step.priority {
                res.attrs_mut().set_integer("priority", priority);
            }
            if family == Family::Screen {
                let surface = step
                    .surface
                    .with_context(|| "screen create needs a surface id")?;
                res.attrs_mut().set_integer("surface", surface);
                if let Some(area) = &step.area {
                    res.attrs_mut().set_string("area", area.clone());
                }
            }

            mgr.notify(LifecycleEvent::Created, zone, &class, &res);
            tracked.insert(name.to_owned(), Tracked { res, zone, class });
        }
        "acquire" | "release" | "destroy" => {
            let name = required(&step.name, "name")?;
            let event = match step.op.as_str() {
                "acquire" => LifecycleEvent::Acquire,
                "release" => LifecycleEvent::Release,
                _ => LifecycleEvent::Destroyed,
            };
            let Some(t) = tracked.get(name) else {
                bail!("unknown resource '{name}'");
            };
            mgr.notify(event, t.zone, &t.class, &t.res);
            if event == LifecycleEvent::Destroyed {
                tracked.remove(name);
            }
        }
        "raise" | "lower" => {
            let appid = required(&step.appid, "appid")?;
            let surface = step.surface.unwrap_or(0);
            if step.op == "raise" {
                mgr.raise(appid, surface);
            } else {
                mgr.lower(appid, surface);
            }
        }
        "disable" | "enable" => {
            let family = parse_family(required(&step.family, "family")?)?;
            let zone = step.zone.as_deref().unwrap_or("*");
            let value = required(&step.value, "value")?;
            let filter = parse_filter(required(&step.filter, "filter")?, value)?;
            let n = mgr.disable(family, zone, step.op == "disable", &filter, true);
            if n < 0 {
                bail!("{} failed", step.op);
            }
            println!("{}d {n} {} resource(s)", step.op, family);
        }
        "commit" => {
            let family = parse_family(required(&step.family, "family")?)?;
            let zone = parse_zone(mgr, required(&step.zone, "zone")?)?;
            mgr.recalc_owner(family, zone);
        }
        other => bail!("unknown op '{other}'"),
    }
    Ok(())
}

fn required<'a>(field: &'a Option<String>, name: &str) -> anyhow::Result<&'a str> {
    field.as_deref().with_context(|| format!("missing field '{name}'"))
}

fn parse_family(name: &str) -> anyhow::Result<Family> {
    match name {
        "screen" => Ok(Family::Screen),
        "audio" => Ok(Family::Audio),
        other => bail!("unknown family '{other}'"),
    }
}

fn parse_zone(mgr: &ResourceManager, name: &str) -> anyhow::Result<ZoneId> {
    mgr.zones()
        .id(name)
        .with_context(|| format!("unknown zone '{name}'"))
}

fn parse_filter<'a>(kind: &str, value: &'a str) -> anyhow::Result<DisableFilter<'a>> {
    match kind {
        "appid" => Ok(DisableFilter::Appid(value)),
        "surface" => Ok(DisableFilter::Surface(
            value.parse().context("surface must be an integer")?,
        )),
        "requisite" => {
            let mut mask = Requisite::empty();
            for token in value.split('|') {
                let Some(bit) = Requisite::from_token(token.trim()) else {
                    bail!("unknown requisite '{token}'");
                };
                mask |= bit;
            }
            Ok(DisableFilter::Requisite(mask))
        }
        other => bail!("unknown filter '{other}'"),
    }
}
