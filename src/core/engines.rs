use crate::core::generator::ArtifactGenerator;
use crate::core::parser::DefinitionParser;
use crate::domain::model::{file_name_of, ExecutionResult, GeneratedArtifact, SourceFile};
use crate::domain::ports::{CompileConfig, CompileEngine, EngineTag, NativeFile, NativeRuntime};
use crate::utils::diagnostic_log::DiagnosticLog;
use crate::utils::error::{FshError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// 純解譯的備援引擎：DefinitionParser + ArtifactGenerator
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackEngine {
    parser: DefinitionParser,
}

impl FallbackEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompileEngine for FallbackEngine {
    fn tag(&self) -> EngineTag {
        EngineTag::Fallback
    }

    async fn compile(
        &self,
        config: &CompileConfig,
        files: &[SourceFile],
        log: &mut DiagnosticLog,
    ) -> Result<ExecutionResult> {
        let definitions = self.parser.parse_files(files);
        log.info(format!(
            "Parsed {} definitions from {} files",
            definitions.total(),
            files.len()
        ));

        let output = ArtifactGenerator::new(config.package.clone()).generate(&definitions)?;
        for warning in &output.warnings {
            log.warning(warning.clone());
        }

        Ok(ExecutionResult::succeeded(output.artifacts, output.warnings))
    }
}

/// 將外部的原生後端包成 [`CompileEngine`]
pub struct NativeEngine<R: NativeRuntime> {
    runtime: R,
    initialized: AtomicBool,
}

impl<R: NativeRuntime> NativeEngine<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            initialized: AtomicBool::new(false),
        }
    }

    /// 初始化失敗時引擎維持不可用，auto 模式會直接改用備援引擎
    pub async fn initialize(&self, log: &mut DiagnosticLog) -> Result<()> {
        match self.runtime.initialize().await {
            Ok(()) => {
                self.initialized.store(true, Ordering::SeqCst);
                log.info("Native engine initialized");
                Ok(())
            }
            Err(e) => {
                log.warning(format!("Native engine could not be initialized: {}", e));
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<R: NativeRuntime> CompileEngine for NativeEngine<R> {
    fn tag(&self) -> EngineTag {
        EngineTag::Native
    }

    fn is_available(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn compile(
        &self,
        config: &CompileConfig,
        files: &[SourceFile],
        log: &mut DiagnosticLog,
    ) -> Result<ExecutionResult> {
        if !self.is_available() {
            return Err(FshError::EngineUnavailable {
                engine: EngineTag::Native.to_string(),
            });
        }

        let output = self.runtime.run_native(config, files).await?;
        let generated_files: Vec<GeneratedArtifact> =
            output.files.iter().map(artifact_from_native).collect();

        for warning in &output.warnings {
            log.warning(warning.clone());
        }
        // 原生引擎回報的編譯錯誤屬於結果，不觸發備援
        for error in &output.errors {
            log.error(error.clone());
        }

        Ok(ExecutionResult {
            success: output.success,
            resource_count: generated_files.len(),
            warnings: output.warnings,
            errors: output.errors,
            generated_files,
        })
    }
}

fn artifact_from_native(file: &NativeFile) -> GeneratedArtifact {
    let filename = file_name_of(&file.path).to_string();
    let body: Option<serde_json::Value> = serde_json::from_str(&file.content).ok();
    let field = |key: &str| {
        body.as_ref()
            .and_then(|b| b.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let id = field("id").unwrap_or_else(|| {
        filename
            .strip_suffix(".json")
            .unwrap_or(&filename)
            .to_string()
    });

    GeneratedArtifact {
        resource_type: file.resource_type.clone(),
        content: file.content.clone(),
        id,
        name: field("name"),
        title: field("title"),
        url: field("url"),
        filename,
    }
}
