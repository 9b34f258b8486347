pub mod api;
pub mod config;
pub mod error;
pub mod plate;
pub mod plugin;
pub mod provider;
pub mod state;

pub use config::ServiceConfig;
pub use error::RecognitionError;
pub use plate::{PlateEngine, PlateEngineConfig};
pub use plugin::registry::PluginRegistry;
pub use state::ServiceState;
