use crate::domain::model::{PackageContext, CONFIG_FILENAME};
use crate::utils::diagnostic_log::DiagnosticLog;
use crate::utils::error::{FshError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, validate_version, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

/// YAML 會把 `1.0` 這類版本讀成數字，清單則取第一個值
fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Sequence(items) => items.first().and_then(scalar_text),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Publisher {
    Name(String),
    Detailed { name: Option<String>, url: Option<String> },
}

/// sushi-config.yaml 的內容，全部欄位都是選填。
/// 純量欄位保留原始 YAML 值，`id: 2024` 這類數字也能讀取。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageConfig {
    pub id: Option<serde_yaml::Value>,
    pub canonical: Option<serde_yaml::Value>,
    pub name: Option<serde_yaml::Value>,
    pub title: Option<serde_yaml::Value>,
    pub status: Option<serde_yaml::Value>,
    pub version: Option<serde_yaml::Value>,
    pub fhir_version: Option<serde_yaml::Value>,
    pub publisher: Option<Publisher>,
}

impl PackageConfig {
    /// 從 YAML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FshError::IoError)?;
        Self::from_yaml_str(&content)
    }

    /// 從 YAML 字串解析設定
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        if processed_content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${IG_VERSION})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn text(value: &Option<serde_yaml::Value>) -> Option<String> {
        value.as_ref().and_then(scalar_text)
    }

    /// 缺少的欄位逐一用預設值補上
    pub fn into_context(self) -> PackageContext {
        let defaults = PackageContext::default();
        let pick = |value: &Option<serde_yaml::Value>, default: String| {
            Self::text(value)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        PackageContext {
            name: pick(&self.name, defaults.name),
            version: pick(&self.version, defaults.version),
            fhir_version: pick(&self.fhir_version, defaults.fhir_version),
            id: pick(&self.id, defaults.id),
            canonical_base_url: pick(&self.canonical, defaults.canonical_base_url)
                .trim_end_matches('/')
                .to_string(),
            status: pick(&self.status, defaults.status),
        }
    }

    /// 解析描述檔並轉成 PackageContext。沒有描述檔或無法解析時使用預設值並記錄警告。
    pub fn resolve(yaml: Option<&str>, log: &mut DiagnosticLog) -> PackageContext {
        let Some(yaml) = yaml else {
            log.warning(format!(
                "No {} provided; using default package configuration",
                CONFIG_FILENAME
            ));
            return PackageContext::default();
        };

        match Self::from_yaml_str(yaml) {
            Ok(config) => {
                if let Err(e) = config.validate() {
                    log.warning(format!("{}: {}", CONFIG_FILENAME, e));
                }
                let context = config.into_context();
                log.info(format!(
                    "Using package {} {} ({})",
                    context.id, context.version, context.canonical_base_url
                ));
                context
            }
            Err(e) => {
                log.warning(format!(
                    "Could not parse {} ({}); using default package configuration",
                    CONFIG_FILENAME, e
                ));
                PackageContext::default()
            }
        }
    }
}

impl Validate for PackageConfig {
    fn validate(&self) -> Result<()> {
        if let Some(canonical) = Self::text(&self.canonical) {
            validate_url("canonical", &canonical)?;
        }
        if let Some(id) = Self::text(&self.id) {
            validate_non_empty_string("id", &id)?;
        }
        if let Some(version) = Self::text(&self.version) {
            validate_version("version", &version)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::diagnostic_log::LogLevel;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SUSHI_CONFIG: &str = r#"
id: example.fhir.ig
canonical: http://example.org/fhir/ig/example/
name: ExampleIG
status: active
version: 1.2.0
fhirVersion: 4.0.1
publisher:
  name: Example Publisher
"#;

    #[test]
    fn test_parse_sushi_config() {
        let config = PackageConfig::from_yaml_str(SUSHI_CONFIG).unwrap();
        assert_eq!(PackageConfig::text(&config.id).as_deref(), Some("example.fhir.ig"));
        assert!(matches!(config.publisher, Some(Publisher::Detailed { .. })));

        let context = config.into_context();
        assert_eq!(context.canonical_base_url, "http://example.org/fhir/ig/example");
        assert_eq!(context.fhir_version, "4.0.1");
        assert_eq!(context.status, "active");
    }

    #[test]
    fn test_fhir_version_list() {
        let config = PackageConfig::from_yaml_str("fhirVersion: [4.3.0, 5.0.0]").unwrap();
        assert_eq!(config.into_context().fhir_version, "4.3.0");
    }

    #[test]
    fn test_numeric_version_is_kept_as_text() {
        let context = PackageConfig::from_yaml_str("version: 1.0").unwrap().into_context();
        assert_eq!(context.version, "1.0");
    }

    #[test]
    fn test_numeric_scalars_do_not_discard_descriptor() {
        let mut log = DiagnosticLog::new();
        let context = PackageConfig::resolve(
            Some("id: 2024\nname: 42\nstatus: active\ncanonical: http://example.org/ig"),
            &mut log,
        );
        assert_eq!(context.id, "2024");
        assert_eq!(context.name, "42");
        assert_eq!(context.canonical_base_url, "http://example.org/ig");
        assert_eq!(log.count(LogLevel::Warning), 0);
    }

    #[test]
    fn test_missing_keys_fall_back_individually() {
        let context = PackageConfig::from_yaml_str("name: OnlyName")
            .unwrap()
            .into_context();
        let defaults = PackageContext::default();
        assert_eq!(context.name, "OnlyName");
        assert_eq!(context.canonical_base_url, defaults.canonical_base_url);
        assert_eq!(context.version, defaults.version);
    }

    #[test]
    fn test_resolve_without_config_warns_once() {
        let mut log = DiagnosticLog::new();
        let context = PackageConfig::resolve(None, &mut log);

        assert_eq!(context.name, "browser-generated-ig");
        assert_eq!(context.fhir_version, "4.0.1");
        assert_eq!(
            context.canonical_base_url,
            "http://example.org/fhir/ig/browser-generated"
        );
        assert_eq!(log.count(LogLevel::Warning), 1);
    }

    #[test]
    fn test_resolve_with_broken_yaml_uses_defaults() {
        let mut log = DiagnosticLog::new();
        let context = PackageConfig::resolve(Some("id: [unclosed"), &mut log);
        assert_eq!(context, PackageContext::default());
        assert_eq!(log.count(LogLevel::Warning), 1);
    }

    #[test]
    fn test_invalid_canonical_is_reported() {
        let config = PackageConfig::from_yaml_str("canonical: not-a-url").unwrap();
        assert!(config.validate().is_err());

        let mut log = DiagnosticLog::new();
        PackageConfig::resolve(Some("canonical: not-a-url"), &mut log);
        assert_eq!(log.count(LogLevel::Warning), 1);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FSH_WORKBENCH_TEST_VERSION", "9.9.9");
        let config =
            PackageConfig::from_yaml_str("version: ${FSH_WORKBENCH_TEST_VERSION}").unwrap();
        assert_eq!(config.into_context().version, "9.9.9");
        std::env::remove_var("FSH_WORKBENCH_TEST_VERSION");
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(SUSHI_CONFIG.as_bytes()).unwrap();

        let config = PackageConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(PackageConfig::text(&config.name).as_deref(), Some("ExampleIG"));
    }
}
