//! Builds an engine from an inline configuration and runs one
//! arbitration round.
//!
//! Run with: cargo run --example config_demo -p cabin-config

use cabin_config::SystemConfig;
use cabin_core::{ApplicationClass, Family, LifecycleEvent, Resource, ResourceHandle, ResourceManager, ZoneId};

fn main() {
    let config = SystemConfig::from_toml(
        r#"
        [[zones]]
        name = "driver"

        [[areas]]
        id = 0
        name = "full"
        output = 0
        output_name = "center"
        zone = "driver"
        width = 1920
        height = 1080

        [[applications]]
        appid = "org.example.navi"
        class = "navigator"
        screen_priority = 2
        screen_privilege = "system"
        "#,
    )
    .expect("demo config parses");

    let mut mgr = ResourceManager::new();
    config.apply(&mut mgr).expect("demo config installs");
    mgr.register_sink(|event| println!("event: {event}"));

    let mut surface = Resource::screen(ResourceHandle(1));
    surface.attrs_mut().set_string("appid", "org.example.navi");
    surface.attrs_mut().set_integer("surface", 101);
    surface.attrs_mut().set_string("area", "center.full");

    let zone = ZoneId(0);
    let class = ApplicationClass::new("navigator", 0);
    mgr.notify(LifecycleEvent::Created, zone, &class, &surface);
    mgr.notify(LifecycleEvent::Acquire, zone, &class, &surface);
    mgr.init(Family::Screen, zone);
    mgr.commit(Family::Screen, zone);

    println!("\n{}", mgr.dump(Family::Screen, zone));
}
