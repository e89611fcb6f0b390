pub mod component;
pub mod config;
pub mod tree;

pub use component::*;
pub use config::*;
pub use tree::*;
