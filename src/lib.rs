#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod hierarchy;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod records;

pub use config::LayoutConfig;
pub use layout::{Layout, LayoutError, compute_layout};
pub use records::{AffectedStatus, PedigreeRecord, Sex};

#[cfg(feature = "cli")]
pub use cli::run;
