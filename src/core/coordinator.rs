use crate::config::package_config::PackageConfig;
use crate::domain::model::{ExecutionResult, SourceFile};
use crate::domain::ports::{CompileConfig, CompileEngine, EngineTag};
use crate::utils::diagnostic_log::DiagnosticLog;
use crate::utils::error::{FshError, Result};
use crate::utils::timer::OperationTimer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const COMPILE_OPERATION: &str = "compile";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Auto,
    Native,
    Fallback,
}

impl FromStr for ExecutionMode {
    type Err = FshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ExecutionMode::Auto),
            "native" => Ok(ExecutionMode::Native),
            "fallback" => Ok(ExecutionMode::Fallback),
            other => Err(FshError::InvalidConfigValueError {
                field: "mode".to_string(),
                value: other.to_string(),
                reason: "Expected one of: auto, native, fallback".to_string(),
            }),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Auto => write!(f, "auto"),
            ExecutionMode::Native => write!(f, "native"),
            ExecutionMode::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    SelectingEngine,
    Running(EngineTag),
    Completed,
    Failed,
}

/// 選擇編譯引擎、計時，並在 auto 模式下於原生引擎失敗時改用備援引擎重試一次
pub struct ExecutionCoordinator {
    mode: ExecutionMode,
    native: Option<Box<dyn CompileEngine>>,
    fallback: Box<dyn CompileEngine>,
    state: CoordinatorState,
    timer: OperationTimer,
}

impl ExecutionCoordinator {
    pub fn new(mode: ExecutionMode, fallback: Box<dyn CompileEngine>) -> Self {
        Self {
            mode,
            native: None,
            fallback,
            state: CoordinatorState::Idle,
            timer: OperationTimer::new(),
        }
    }

    pub fn with_native(mut self, native: Box<dyn CompileEngine>) -> Self {
        self.native = Some(native);
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn timer(&self) -> &OperationTimer {
        &self.timer
    }

    fn native_ready(&self) -> bool {
        self.native.as_ref().is_some_and(|n| n.is_available())
    }

    /// 編譯一組原始檔。結果的 `success` 一定是明確的 true 或 false。
    pub async fn compile(
        &mut self,
        files: &[SourceFile],
        config_yaml: Option<&str>,
        log: &mut DiagnosticLog,
    ) -> ExecutionResult {
        self.state = CoordinatorState::SelectingEngine;

        let package = PackageConfig::resolve(config_yaml, log);
        let config = CompileConfig {
            package,
            raw_config: config_yaml.map(str::to_string),
        };

        if files.is_empty() {
            let message = "No files found (no .fsh sources); nothing to compile".to_string();
            log.warning(message.clone());
            self.state = CoordinatorState::Completed;
            return ExecutionResult::succeeded(Vec::new(), vec![message]);
        }

        let mode = self.mode;
        let outcome = match mode {
            ExecutionMode::Fallback => self.attempt(EngineTag::Fallback, &config, files, log).await,
            ExecutionMode::Native => self.attempt(EngineTag::Native, &config, files, log).await,
            ExecutionMode::Auto if self.native_ready() => {
                match self.attempt(EngineTag::Native, &config, files, log).await {
                    Ok(result) => Ok(result),
                    Err(e) => {
                        log.warning(format!(
                            "Native engine failed ({}); retrying with fallback engine",
                            e
                        ));
                        self.attempt(EngineTag::Fallback, &config, files, log).await
                    }
                }
            }
            ExecutionMode::Auto => {
                log.info("Native engine not initialized; using fallback engine");
                self.attempt(EngineTag::Fallback, &config, files, log).await
            }
        };

        match outcome {
            Ok(result) => {
                self.state = if result.success {
                    CoordinatorState::Completed
                } else {
                    CoordinatorState::Failed
                };
                result
            }
            Err(e) => {
                log.error(format!("Compilation failed: {}", e));
                self.state = CoordinatorState::Failed;
                ExecutionResult::failed(vec![e.to_string()])
            }
        }
    }

    async fn attempt(
        &mut self,
        tag: EngineTag,
        config: &CompileConfig,
        files: &[SourceFile],
        log: &mut DiagnosticLog,
    ) -> Result<ExecutionResult> {
        let engine: &dyn CompileEngine = match tag {
            EngineTag::Native => self
                .native
                .as_deref()
                .filter(|n| n.is_available())
                .ok_or_else(|| FshError::EngineUnavailable {
                    engine: tag.to_string(),
                })?,
            EngineTag::Fallback => self.fallback.as_ref(),
        };
        let tag = engine.tag();

        self.state = CoordinatorState::Running(tag);
        log.info(format!("Compiling {} files with {} engine", files.len(), tag));

        self.timer.start(COMPILE_OPERATION, tag);
        let outcome = engine.compile(config, files, log).await;
        let elapsed = self.timer.stop(COMPILE_OPERATION, tag);

        let result = outcome?;
        if result.success {
            log.success(format!(
                "Compiled {} resources with {} engine in {} ms",
                result.resource_count,
                tag,
                elapsed.map(|d| d.as_millis()).unwrap_or_default()
            ));
        } else if result.errors.is_empty() {
            log.error(format!("{} engine reported an unsuccessful compilation", tag));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engines::FallbackEngine;
    use crate::utils::diagnostic_log::LogLevel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FailingEngine {
        tag: EngineTag,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CompileEngine for FailingEngine {
        fn tag(&self) -> EngineTag {
            self.tag
        }

        async fn compile(
            &self,
            _config: &CompileConfig,
            _files: &[SourceFile],
            _log: &mut DiagnosticLog,
        ) -> Result<ExecutionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FshError::NativeEngineError {
                message: format!("{} exploded", self.tag),
            })
        }
    }

    fn failing(tag: EngineTag) -> (Box<dyn CompileEngine>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(FailingEngine {
                tag,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    fn files() -> Vec<SourceFile> {
        vec![SourceFile::new(
            "input/fsh/p.fsh",
            "Profile: MyPatient\nParent: Patient\nId: my-patient\n* identifier 1..1",
        )]
    }

    #[tokio::test]
    async fn test_auto_fails_over_to_fallback() {
        let (native, native_calls) = failing(EngineTag::Native);
        let mut coordinator =
            ExecutionCoordinator::new(ExecutionMode::Auto, Box::new(FallbackEngine::new()))
                .with_native(native);
        let mut log = DiagnosticLog::new();

        let result = coordinator.compile(&files(), None, &mut log).await;

        assert!(result.success);
        assert_eq!(result.resource_count, 1);
        assert_eq!(native_calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.state(), CoordinatorState::Completed);
        assert!(log
            .entries()
            .iter()
            .any(|e| e.level == LogLevel::Warning && e.message.contains("retrying with fallback")));
        let engines: Vec<EngineTag> = coordinator
            .timer()
            .history()
            .iter()
            .map(|r| r.engine)
            .collect();
        assert_eq!(engines, vec![EngineTag::Native, EngineTag::Fallback]);
    }

    #[tokio::test]
    async fn test_explicit_native_failure_is_terminal() {
        let (native, _) = failing(EngineTag::Native);
        let mut coordinator =
            ExecutionCoordinator::new(ExecutionMode::Native, Box::new(FallbackEngine::new()))
                .with_native(native);
        let mut log = DiagnosticLog::new();

        let result = coordinator.compile(&files(), None, &mut log).await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("native exploded"));
        assert!(log.has_errors());
        assert_eq!(coordinator.state(), CoordinatorState::Failed);
    }

    #[tokio::test]
    async fn test_second_failure_propagates_fallback_error() {
        let (native, native_calls) = failing(EngineTag::Native);
        let (fallback, fallback_calls) = failing(EngineTag::Fallback);
        let mut coordinator =
            ExecutionCoordinator::new(ExecutionMode::Auto, fallback).with_native(native);
        let mut log = DiagnosticLog::new();

        let result = coordinator.compile(&files(), None, &mut log).await;

        assert!(!result.success);
        assert!(result.errors[0].contains("fallback exploded"));
        assert_eq!(native_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auto_without_native_uses_fallback() {
        let mut coordinator =
            ExecutionCoordinator::new(ExecutionMode::Auto, Box::new(FallbackEngine::new()));
        let mut log = DiagnosticLog::new();

        let result = coordinator.compile(&files(), None, &mut log).await;
        assert!(result.success);
        assert_eq!(
            coordinator.timer().history()[0].engine,
            EngineTag::Fallback
        );
    }

    #[tokio::test]
    async fn test_native_mode_without_native_engine_fails() {
        let mut coordinator =
            ExecutionCoordinator::new(ExecutionMode::Native, Box::new(FallbackEngine::new()));
        let mut log = DiagnosticLog::new();

        let result = coordinator.compile(&files(), None, &mut log).await;
        assert!(!result.success);
        assert!(result.errors[0].contains("not available"));
    }

    #[tokio::test]
    async fn test_empty_input_is_not_an_error() {
        let mut coordinator =
            ExecutionCoordinator::new(ExecutionMode::Auto, Box::new(FallbackEngine::new()));
        let mut log = DiagnosticLog::new();

        let result = coordinator.compile(&[], None, &mut log).await;

        assert!(result.success);
        assert_eq!(result.resource_count, 0);
        assert!(log
            .entries()
            .iter()
            .any(|e| e.level == LogLevel::Warning && e.message.contains("No files found")));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("AUTO".parse::<ExecutionMode>().unwrap(), ExecutionMode::Auto);
        assert_eq!(
            "fallback".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::Fallback
        );
        assert!("turbo".parse::<ExecutionMode>().is_err());
        assert_eq!(ExecutionMode::Native.to_string(), "native");
    }
}
