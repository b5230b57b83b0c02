pub mod coordinator;
pub mod engines;
pub mod generator;
pub mod overlay;
pub mod parser;
pub mod scanner;
pub mod workbench;

pub use crate::domain::model::{ExecutionResult, GeneratedArtifact, SourceFile, StagedFile};
pub use crate::domain::ports::{CompileEngine, NativeRuntime, RemoteSource, Storage};
pub use crate::utils::error::Result;
