//! Infrastructure configuration modules.

pub mod logging;
pub mod settings;
pub mod sync;

pub use logging::LoggingConfig;
pub use settings::Config;
pub use sync::SyncConfig;
