//! Purchase Portal Widgets Entry Point

mod commands;
mod components;
mod config;
mod dom;
mod logger;
mod registry;
mod widget;

use std::rc::Rc;

use config::PortalConfig;
use registry::Registry;

fn main() {
    console_error_panic_hook::set_once();

    let (config, load_error) = match PortalConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (PortalConfig::default(), Some(e)),
    };
    logger::init(config.level_filter());
    if let Some(e) = load_error {
        log::warn!("ignoring invalid {}: {}", config::CONFIG_GLOBAL, e);
    }

    Registry::new(Rc::new(config)).start();
}
