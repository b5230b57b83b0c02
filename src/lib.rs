pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::cli::{load_staged_files, LocalSource, LocalStorage};
pub use config::package_config::PackageConfig;
pub use core::coordinator::{ExecutionCoordinator, ExecutionMode};
pub use core::engines::{FallbackEngine, NativeEngine};
pub use core::overlay::{OverlayKey, OverlayMerger};
pub use core::workbench::{Workbench, WorkbenchRun};
pub use utils::diagnostic_log::DiagnosticLog;
pub use utils::error::{FshError, Result};
