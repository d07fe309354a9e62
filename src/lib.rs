pub mod algo;
pub mod error;
pub mod ops;

#[cfg(feature = "mcp")]
pub mod mcp;

#[cfg(feature = "plugin")]
pub mod commands;

#[cfg(feature = "plugin")]
use nu_plugin::{Plugin, PluginCommand};

#[cfg(feature = "plugin")]
pub struct BiodiversityPlugin;

#[cfg(feature = "plugin")]
impl Plugin for BiodiversityPlugin {
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").into()
    }

    fn commands(&self) -> Vec<Box<dyn PluginCommand<Plugin = Self>>> {
        vec![
            Box::new(commands::Normalize),
            Box::new(commands::Frequency),
            Box::new(commands::TopSpecies),
            Box::new(commands::Dashboard),
        ]
    }
}
