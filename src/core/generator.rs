use crate::core::parser::ParsedDefinitions;
use crate::domain::model::{DefinitionKind, DefinitionRecord, GeneratedArtifact, PackageContext};
use crate::utils::error::Result;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

const FHIR_BASE: &str = "http://hl7.org/fhir/StructureDefinition";

/// 有特別處理的常見資源名稱
const WELL_KNOWN_RESOURCES: &[&str] = &[
    "Patient",
    "Practitioner",
    "PractitionerRole",
    "Organization",
    "Observation",
    "Condition",
    "Encounter",
    "Procedure",
    "MedicationRequest",
    "AllergyIntolerance",
    "DiagnosticReport",
    "Immunization",
    "Location",
];

/// Profile 的 Parent 不在常見清單時使用的基底型別
const GENERIC_BASE_TYPE: &str = "DomainResource";

/// Instance 的 InstanceOf 不在常見清單時使用的型別
const BASELINE_INSTANCE_TYPE: &str = "Patient";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutput {
    pub artifacts: Vec<GeneratedArtifact>,
    pub warnings: Vec<String>,
}

/// 名稱轉識別碼：小寫，空白換成連字號
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn well_known(name: Option<&str>) -> Option<&'static str> {
    let name = name?.trim();
    WELL_KNOWN_RESOURCES.iter().copied().find(|r| *r == name)
}

fn insert_opt(body: &mut Map<String, Value>, key: &str, value: Option<&String>) {
    if let Some(value) = value {
        body.insert(key.to_string(), Value::String(value.clone()));
    }
}

/// 把規則轉成 differential element。第一個空白前的字串當作路徑。
fn differential_element(resource_type: &str, rule: &str) -> Option<Value> {
    let mut tokens = rule.split_whitespace();
    let path_token = tokens.next()?;
    if path_token.starts_with('^') {
        return None;
    }

    let path = format!("{}.{}", resource_type, path_token);
    let mut element = Map::new();
    element.insert("id".to_string(), Value::String(path.clone()));
    element.insert("path".to_string(), Value::String(path));

    let rest: Vec<&str> = tokens.collect();
    if let Some((min, max)) = rest.first().and_then(|t| t.split_once("..")) {
        if let Ok(min) = min.parse::<u64>() {
            if max == "*" || max.parse::<u64>().is_ok() {
                element.insert("min".to_string(), json!(min));
                element.insert("max".to_string(), json!(max));
            }
        }
    }
    if rest.contains(&"MS") {
        element.insert("mustSupport".to_string(), Value::Bool(true));
    }

    Some(Value::Object(element))
}

#[derive(Debug, Clone)]
pub struct ArtifactGenerator {
    context: PackageContext,
}

impl ArtifactGenerator {
    pub fn new(context: PackageContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &PackageContext {
        &self.context
    }

    fn canonical(&self, resource_type: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.context.canonical_base_url, resource_type, id
        )
    }

    pub fn generate(&self, definitions: &ParsedDefinitions) -> Result<GenerationOutput> {
        let mut output = GenerationOutput::default();
        let mut seen = HashSet::new();

        for record in definitions.iter() {
            let Some(artifact) = self.generate_record(record, &mut output.warnings)? else {
                continue;
            };
            // 重複的檔名照樣輸出，只提出警告
            if !seen.insert(artifact.filename.clone()) {
                output.warnings.push(format!(
                    "Duplicate artifact {} generated from {} {}",
                    artifact.filename, record.kind, record.name
                ));
            }
            output.artifacts.push(artifact);
        }

        Ok(output)
    }

    /// 單一定義轉成產出物。空名稱的定義不產生任何東西。
    pub fn generate_record(
        &self,
        record: &DefinitionRecord,
        warnings: &mut Vec<String>,
    ) -> Result<Option<GeneratedArtifact>> {
        if record.name.is_empty() {
            return Ok(None);
        }

        let artifact = match record.kind {
            DefinitionKind::Profile => self.structure_definition(record, warnings)?,
            DefinitionKind::Extension => self.structure_definition(record, warnings)?,
            DefinitionKind::Instance => self.instance(record)?,
            DefinitionKind::ValueSet => self.value_set(record)?,
            DefinitionKind::CodeSystem => self.code_system(record)?,
        };
        Ok(Some(artifact))
    }

    fn identifier(record: &DefinitionRecord) -> String {
        record
            .id
            .as_ref()
            .filter(|id| !id.trim().is_empty())
            .map(|id| id.trim().to_string())
            .unwrap_or_else(|| slugify(&record.name))
    }

    fn structure_definition(
        &self,
        record: &DefinitionRecord,
        warnings: &mut Vec<String>,
    ) -> Result<GeneratedArtifact> {
        let id = Self::identifier(record);
        let url = self.canonical("StructureDefinition", &id);

        let sd_type = if record.kind == DefinitionKind::Extension {
            "Extension"
        } else {
            match well_known(record.parent.as_deref()) {
                Some(resource) => resource,
                None => {
                    let parent = record.parent.as_deref().unwrap_or("(none)");
                    warnings.push(format!(
                        "Profile {} has parent {} which is not a known resource; using {}",
                        record.name, parent, GENERIC_BASE_TYPE
                    ));
                    GENERIC_BASE_TYPE
                }
            }
        };

        let mut body = Map::new();
        body.insert("resourceType".into(), json!("StructureDefinition"));
        body.insert("id".into(), json!(id));
        body.insert("url".into(), json!(url));
        body.insert("version".into(), json!(self.context.version));
        body.insert("name".into(), json!(record.name));
        insert_opt(&mut body, "title", record.title.as_ref());
        body.insert("status".into(), json!(self.context.status));
        insert_opt(&mut body, "description", record.description.as_ref());
        body.insert("fhirVersion".into(), json!(self.context.fhir_version));
        body.insert(
            "kind".into(),
            json!(if sd_type == "Extension" {
                "complex-type"
            } else {
                "resource"
            }),
        );
        body.insert("abstract".into(), json!(false));
        body.insert("type".into(), json!(sd_type));
        body.insert(
            "baseDefinition".into(),
            json!(format!("{}/{}", FHIR_BASE, sd_type)),
        );
        body.insert("derivation".into(), json!("constraint"));

        if !record.rules.is_empty() {
            let elements: Vec<Value> = record
                .rules
                .iter()
                .filter_map(|rule| differential_element(sd_type, rule))
                .collect();
            body.insert("differential".into(), json!({ "element": elements }));
        }

        Ok(GeneratedArtifact {
            resource_type: "StructureDefinition".to_string(),
            filename: format!("StructureDefinition-{}.json", id),
            content: serde_json::to_string_pretty(&Value::Object(body))?,
            id,
            name: Some(record.name.clone()),
            title: record.title.clone(),
            url: Some(url),
        })
    }

    fn instance(&self, record: &DefinitionRecord) -> Result<GeneratedArtifact> {
        let id = slugify(&record.name);
        let declared = record.instance_of.as_deref();
        let resource_type = well_known(declared).unwrap_or(BASELINE_INSTANCE_TYPE);

        let mut body = Map::new();
        body.insert("resourceType".into(), json!(resource_type));
        body.insert("id".into(), json!(id));

        // InstanceOf 指向自訂 profile 時掛上 meta.profile
        if let Some(profile) = declared.filter(|d| well_known(Some(d)).is_none()) {
            body.insert(
                "meta".into(),
                json!({ "profile": [self.canonical("StructureDefinition", &slugify(profile))] }),
            );
        }

        if resource_type == BASELINE_INSTANCE_TYPE {
            let mut parts: Vec<&str> = record
                .name
                .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
                .filter(|p| !p.is_empty())
                .collect();
            let family = parts.pop().unwrap_or(record.name.as_str());
            let mut name = Map::new();
            name.insert("family".into(), json!(family));
            if !parts.is_empty() {
                name.insert("given".into(), json!(parts));
            }
            body.insert("name".into(), json!([name]));
        }

        Ok(GeneratedArtifact {
            resource_type: resource_type.to_string(),
            filename: format!("{}.json", id),
            content: serde_json::to_string_pretty(&Value::Object(body))?,
            id,
            name: Some(record.name.clone()),
            title: record.title.clone(),
            url: None,
        })
    }

    fn value_set(&self, record: &DefinitionRecord) -> Result<GeneratedArtifact> {
        let id = Self::identifier(record);
        let url = self.canonical("ValueSet", &id);

        let mut body = self.terminology_header("ValueSet", &id, &url, record);
        body.insert(
            "compose".into(),
            json!({
                "include": [{
                    "system": self.canonical("CodeSystem", &id),
                    "concept": placeholder_concepts(),
                }]
            }),
        );

        self.terminology_artifact("ValueSet", id, url, record, body)
    }

    fn code_system(&self, record: &DefinitionRecord) -> Result<GeneratedArtifact> {
        let id = Self::identifier(record);
        let url = self.canonical("CodeSystem", &id);

        let mut body = self.terminology_header("CodeSystem", &id, &url, record);
        body.insert("content".into(), json!("complete"));
        body.insert("count".into(), json!(2));
        body.insert("concept".into(), placeholder_concepts());

        self.terminology_artifact("CodeSystem", id, url, record, body)
    }

    fn terminology_header(
        &self,
        resource_type: &str,
        id: &str,
        url: &str,
        record: &DefinitionRecord,
    ) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("resourceType".into(), json!(resource_type));
        body.insert("id".into(), json!(id));
        body.insert("url".into(), json!(url));
        body.insert("version".into(), json!(self.context.version));
        body.insert("name".into(), json!(record.name));
        insert_opt(&mut body, "title", record.title.as_ref());
        body.insert("status".into(), json!(self.context.status));
        insert_opt(&mut body, "description", record.description.as_ref());
        body
    }

    fn terminology_artifact(
        &self,
        resource_type: &str,
        id: String,
        url: String,
        record: &DefinitionRecord,
        body: Map<String, Value>,
    ) -> Result<GeneratedArtifact> {
        Ok(GeneratedArtifact {
            resource_type: resource_type.to_string(),
            filename: format!("{}-{}.json", resource_type, id),
            content: serde_json::to_string_pretty(&Value::Object(body))?,
            id,
            name: Some(record.name.clone()),
            title: record.title.clone(),
            url: Some(url),
        })
    }
}

// 示意用的固定內容，不是從規則推導出來的
fn placeholder_concepts() -> Value {
    json!([
        { "code": "code1", "display": "Code 1" },
        { "code": "code2", "display": "Code 2" }
    ])
}
