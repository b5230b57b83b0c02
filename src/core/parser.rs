//! 逐行掃描的 FSH 定義擷取器。
//!
//! 這不是完整的文法解析：只辨識定義關鍵字、少數屬性與規則行。其他帶冒號的行
//! 視為定義邊界，會先提交目前的定義，再以「沒有開啟中定義」的狀態重新判斷同一行。

use crate::domain::model::{DefinitionKind, DefinitionRecord, SourceFile};
use std::collections::BTreeMap;

const RULE_MARKER: &str = "* ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
    Parent,
    InstanceOf,
    Usage,
    Id,
    Title,
    Description,
}

impl Property {
    const ALL: [(Property, &'static str); 6] = [
        (Property::Parent, "Parent:"),
        (Property::InstanceOf, "InstanceOf:"),
        (Property::Usage, "Usage:"),
        (Property::Id, "Id:"),
        (Property::Title, "Title:"),
        (Property::Description, "Description:"),
    ];
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Start(DefinitionKind, &'a str),
    Property(Property, &'a str),
    Rule(&'a str),
    Boundary,
    Ignored,
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();

    for kind in DefinitionKind::ALL {
        if let Some(rest) = trimmed.strip_prefix(kind.keyword()) {
            return Line::Start(kind, rest.trim());
        }
    }

    for (property, marker) in Property::ALL {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return Line::Property(property, rest.trim());
        }
    }

    if let Some(rule) = trimmed.strip_prefix(RULE_MARKER) {
        return Line::Rule(rule.trim());
    }

    if trimmed.contains(':') {
        Line::Boundary
    } else {
        Line::Ignored
    }
}

fn strip_quotes(value: &str) -> String {
    value.trim().trim_matches('"').trim().to_string()
}

/// 解析結果：依種類分組、保留原始順序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDefinitions {
    by_kind: BTreeMap<DefinitionKind, Vec<DefinitionRecord>>,
}

impl ParsedDefinitions {
    pub fn get(&self, kind: DefinitionKind) -> &[DefinitionRecord] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 依 Profile、Extension、Instance、ValueSet、CodeSystem 的順序走訪
    pub fn iter(&self) -> impl Iterator<Item = &DefinitionRecord> {
        DefinitionKind::ALL
            .into_iter()
            .flat_map(move |kind| self.get(kind).iter())
    }

    pub fn total(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// 空名稱的定義直接丟棄
    pub fn push(&mut self, record: DefinitionRecord) {
        if record.name.is_empty() {
            tracing::debug!("Dropping unnamed {} definition", record.kind);
            return;
        }
        self.by_kind.entry(record.kind).or_default().push(record);
    }

    pub fn extend(&mut self, other: ParsedDefinitions) {
        for (kind, records) in other.by_kind {
            self.by_kind.entry(kind).or_default().extend(records);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionParser;

impl DefinitionParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> ParsedDefinitions {
        let lines: Vec<&str> = text.lines().collect();
        let mut parsed = ParsedDefinitions::default();
        let mut current: Option<DefinitionRecord> = None;
        let mut index = 0;

        while index < lines.len() {
            match classify(lines[index]) {
                Line::Start(kind, name) => {
                    if let Some(record) = current.take() {
                        parsed.push(record);
                    }
                    current = Some(DefinitionRecord::new(kind, name));
                }
                Line::Property(property, value) => {
                    if let Some(record) = current.as_mut() {
                        apply_property(record, property, value);
                    }
                }
                Line::Rule(rule) => {
                    if let Some(record) = current.as_mut() {
                        record.rules.push(rule.to_string());
                    }
                }
                Line::Boundary => {
                    // 提交後不前進，讓同一行在沒有開啟中定義的狀態下再判斷一次
                    if let Some(record) = current.take() {
                        parsed.push(record);
                        continue;
                    }
                }
                Line::Ignored => {}
            }
            index += 1;
        }

        if let Some(record) = current {
            parsed.push(record);
        }

        parsed
    }

    /// 解析多個檔案並依檔案順序合併
    pub fn parse_files(&self, files: &[SourceFile]) -> ParsedDefinitions {
        let mut all = ParsedDefinitions::default();
        for file in files {
            let parsed = self.parse(&file.content);
            tracing::debug!("Parsed {} definitions from {}", parsed.total(), file.path);
            all.extend(parsed);
        }
        all
    }
}

fn apply_property(record: &mut DefinitionRecord, property: Property, value: &str) {
    let value = value.to_string();
    match property {
        Property::Id => record.id = Some(value),
        Property::Title => record.title = Some(strip_quotes(&value)),
        Property::Description => record.description = Some(strip_quotes(&value)),
        Property::Parent => {
            if matches!(
                record.kind,
                DefinitionKind::Profile | DefinitionKind::Extension
            ) {
                record.parent = Some(value);
            }
        }
        Property::InstanceOf => {
            if record.kind == DefinitionKind::Instance {
                record.instance_of = Some(value);
            }
        }
        Property::Usage => {
            if record.kind == DefinitionKind::Instance {
                record.usage = Some(value);
            }
        }
    }
}
