use tracing::{error, info};

use super::{
    plugin::{BoxedPlugin, Plugin},
    rtve::RtvePlugin,
    ss365::Ss365Plugin,
};
use crate::configs::Config;

/// Plugin Manager
pub struct PluginManager {
    pub plugins: Vec<BoxedPlugin>,
}

impl PluginManager {
    /// Create a new PluginManager with every plugin enabled in `config`.
    pub fn new(config: &Config) -> Self {
        let mut plugins: Vec<BoxedPlugin> = Vec::new();

        macro_rules! register_plugin {
            ($enabled:expr, $name:literal, $ctor:expr) => {
                if $enabled {
                    match $ctor {
                        Ok(plugin) => {
                            info!("Loaded plugin: {}", $name);
                            plugins.push(Box::new(plugin));
                        }
                        Err(e) => {
                            error!("{} plugin failed to initialize: {}", $name, e);
                        }
                    }
                }
            };
        }

        register_plugin!(config.plugins.rtve, "RTVE", RtvePlugin::new(config));
        register_plugin!(config.plugins.ss365, "SS365", Ss365Plugin::new(config));

        Self { plugins }
    }

    /// First plugin whose matcher accepts `url`.
    pub fn find(&self, url: &str) -> Option<&dyn Plugin> {
        self.plugins
            .iter()
            .find(|p| p.can_handle_url(url))
            .map(|p| &**p)
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }
}
