pub mod config;
pub mod mode;
pub mod plugin_dir;
pub mod store;
