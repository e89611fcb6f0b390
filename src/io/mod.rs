pub mod export;
pub mod recovery;
pub mod store;

pub use export::{export_layout, export_layouts, import_layouts, LayoutExport};
pub use store::{FileLayoutStore, LayoutStore, MemoryLayoutStore, StoreError};
