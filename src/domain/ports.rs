use crate::domain::model::{ExecutionResult, PackageContext, SourceFile};
use crate::utils::diagnostic_log::DiagnosticLog;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

/// 遠端檔案來源 (例如版本控制服務的目錄 API)
pub trait RemoteSource: Send + Sync {
    fn list_directory(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<RemoteEntry>>> + Send;
    fn get_file_content(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// 交給編譯引擎的設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileConfig {
    pub package: PackageContext,
    /// 原始 sushi-config.yaml 內容，原生引擎會自己解析
    pub raw_config: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeFile {
    pub path: String,
    pub resource_type: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeOutput {
    pub success: bool,
    pub files: Vec<NativeFile>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// 原生編譯後端。相同輸入必須可以安全重試。
#[async_trait]
pub trait NativeRuntime: Send + Sync {
    async fn initialize(&self) -> Result<()>;
    async fn run_native(&self, config: &CompileConfig, files: &[SourceFile]) -> Result<NativeOutput>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineTag {
    Native,
    Fallback,
}

impl fmt::Display for EngineTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineTag::Native => write!(f, "native"),
            EngineTag::Fallback => write!(f, "fallback"),
        }
    }
}

/// 兩種引擎共用的編譯介面
#[async_trait]
pub trait CompileEngine: Send + Sync {
    fn tag(&self) -> EngineTag;

    /// 引擎是否已初始化完成、可以接受工作
    fn is_available(&self) -> bool {
        true
    }

    async fn compile(
        &self,
        config: &CompileConfig,
        files: &[SourceFile],
        log: &mut DiagnosticLog,
    ) -> Result<ExecutionResult>;
}
