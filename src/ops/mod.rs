pub mod commands;
pub mod edit;
pub mod instantiate;

pub use commands::{AccessGate, AllowAll, CommandError, TileCommand};
pub use edit::EditError;
pub use instantiate::{instantiate, mount_layout, ConfigError, InstantiationContext};
