use serde::{Deserialize, Serialize};
use std::fmt;

/// FSH 原始檔案的副檔名
pub const FSH_EXTENSION: &str = "fsh";

/// 套件描述檔的檔名
pub const CONFIG_FILENAME: &str = "sushi-config.yaml";

/// 取得路徑的最後一段 (檔名)
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// 路徑是否為 FSH 原始檔
pub fn is_fsh_path(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case(FSH_EXTENSION))
        .unwrap_or(false)
}

/// 編譯器實際讀取的原始檔，由 overlay 合併產生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub path: String,
    pub content: String,
    pub is_from_staging: bool,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_name_of(&path).to_string(),
            path,
            content: content.into(),
            is_from_staging: false,
        }
    }
}

/// 暫存區的覆寫檔案，路徑不一定與來源同一個目錄樹
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    pub path: String,
    pub content: String,
}

impl StagedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DefinitionKind {
    Profile,
    Instance,
    ValueSet,
    CodeSystem,
    Extension,
}

impl DefinitionKind {
    pub const ALL: [DefinitionKind; 5] = [
        DefinitionKind::Profile,
        DefinitionKind::Extension,
        DefinitionKind::Instance,
        DefinitionKind::ValueSet,
        DefinitionKind::CodeSystem,
    ];

    /// 開啟新定義的關鍵字，例如 `Profile:`
    pub fn keyword(&self) -> &'static str {
        match self {
            DefinitionKind::Profile => "Profile:",
            DefinitionKind::Instance => "Instance:",
            DefinitionKind::ValueSet => "ValueSet:",
            DefinitionKind::CodeSystem => "CodeSystem:",
            DefinitionKind::Extension => "Extension:",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = self.keyword();
        write!(f, "{}", &keyword[..keyword.len() - 1])
    }
}

/// 從一個 FSH 區塊解析出來的定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    pub kind: DefinitionKind,
    pub name: String,
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Profile / Extension 專用
    pub parent: Option<String>,
    /// Instance 專用
    pub instance_of: Option<String>,
    /// Instance 專用
    pub usage: Option<String>,
    pub rules: Vec<String>,
}

impl DefinitionRecord {
    pub fn new(kind: DefinitionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            id: None,
            title: None,
            description: None,
            parent: None,
            instance_of: None,
            usage: None,
            rules: Vec::new(),
        }
    }
}

/// 控制 canonical URL 與識別碼的套件設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageContext {
    pub name: String,
    pub version: String,
    pub fhir_version: String,
    pub id: String,
    #[serde(rename = "canonical")]
    pub canonical_base_url: String,
    pub status: String,
}

impl Default for PackageContext {
    fn default() -> Self {
        Self {
            name: "browser-generated-ig".to_string(),
            version: "0.1.0".to_string(),
            fhir_version: "4.0.1".to_string(),
            id: "browser.generated.ig".to_string(),
            canonical_base_url: "http://example.org/fhir/ig/browser-generated".to_string(),
            status: "draft".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifact {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub filename: String,
    /// 序列化後的 JSON 內容
    pub content: String,
    pub id: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub resource_count: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub generated_files: Vec<GeneratedArtifact>,
}

impl ExecutionResult {
    pub fn succeeded(generated_files: Vec<GeneratedArtifact>, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            resource_count: generated_files.len(),
            warnings,
            errors: Vec::new(),
            generated_files,
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            success: false,
            resource_count: 0,
            warnings: Vec::new(),
            errors,
            generated_files: Vec::new(),
        }
    }
}
