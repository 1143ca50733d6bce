use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PluginsConfig {
    pub rtve: bool,
    pub ss365: bool,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            rtve: true,
            ss365: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct RtveConfig {
    /// Attach the published subtitle tracks to HLS streams.
    pub mux_subtitles: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Ss365Config {
    /// Requested bandwidth in bit/s.
    pub bandwidth: u64,
}

impl Default for Ss365Config {
    fn default() -> Self {
        Self {
            bandwidth: 1_000_000,
        }
    }
}
