pub mod error;
pub mod installer;
pub mod manager;
pub mod metadata;
pub mod record;
pub mod source;
pub mod version;

pub use manager::PluginManager;
