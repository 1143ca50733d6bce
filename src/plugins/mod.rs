pub mod error;
pub mod manager;
pub mod plugin;
pub mod rtve;
pub mod ss365;

pub use error::PluginError;
pub use manager::PluginManager;
pub use plugin::{Plugin, RealtimeStream, Stream, Subtitle};
