use thiserror::Error;

#[derive(Error, Debug)]
pub enum FshError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to retrieve '{path}': {message}")]
    RetrievalError { path: String, message: String },

    #[error("Native engine failed: {message}")]
    NativeEngineError { message: String },

    #[error("{engine} engine is not available")]
    EngineUnavailable { engine: String },

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Retrieval,
    Engine,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FshError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FshError::ConfigError { .. }
            | FshError::InvalidConfigValueError { .. }
            | FshError::YamlError(_) => ErrorCategory::Configuration,
            FshError::RetrievalError { .. } => ErrorCategory::Retrieval,
            FshError::NativeEngineError { .. } | FshError::EngineUnavailable { .. } => {
                ErrorCategory::Engine
            }
            FshError::SerializationError(_) => ErrorCategory::Processing,
            FshError::IoError(_) | FshError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 設定問題大多可以用預設值復原
            ErrorCategory::Configuration => ErrorSeverity::Low,
            ErrorCategory::Retrieval | ErrorCategory::Engine => ErrorSeverity::Medium,
            ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FshError::ConfigError { .. }
            | FshError::InvalidConfigValueError { .. }
            | FshError::YamlError(_) => "Check sushi-config.yaml for typos and missing keys",
            FshError::RetrievalError { .. } => {
                "Verify the path exists and the source is reachable, then retry"
            }
            FshError::NativeEngineError { .. } => "Retry with --mode fallback",
            FshError::EngineUnavailable { .. } => {
                "Use --mode auto or --mode fallback when no native engine is installed"
            }
            FshError::SerializationError(_) => {
                "Inspect the FSH definitions named in the diagnostic log"
            }
            FshError::IoError(_) | FshError::ZipError(_) => {
                "Check file permissions and available disk space"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Retrieval => format!("Could not read source files: {}", self),
            ErrorCategory::Engine => format!("Compilation engine problem: {}", self),
            ErrorCategory::Processing => format!("Compilation failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, FshError>;
