pub mod base;
pub mod http;
pub mod logging;
pub mod plugins;
pub mod stream;

pub use base::*;
pub use http::*;
pub use logging::*;
pub use plugins::*;
pub use stream::*;
