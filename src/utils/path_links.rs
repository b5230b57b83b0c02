//! 在診斷訊息中辨識檔案路徑。
//!
//! 只有確定存在的檔案才會成為可點擊的參照，其餘看起來像路徑的字串一律當成純文字。

use crate::domain::model::{file_name_of, SourceFile, CONFIG_FILENAME};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static PATH_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9_./\\-]+\.(?:fsh|ya?ml|json)\b").expect("valid path token regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    BaseFile,
    StagingFile,
    ConfigFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSegment {
    Text(String),
    Path { text: String, kind: PathKind },
}

#[derive(Debug, Clone, Default)]
pub struct PathClassifier {
    base: HashSet<String>,
    staging: HashSet<String>,
    config_names: HashSet<String>,
}

impl PathClassifier {
    pub fn new<B, S>(base_paths: B, staging_paths: S) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let mut classifier = Self::default();
        for path in base_paths {
            insert_with_name(&mut classifier.base, path.as_ref());
        }
        for path in staging_paths {
            insert_with_name(&mut classifier.staging, path.as_ref());
        }
        classifier.config_names.insert(CONFIG_FILENAME.to_string());
        classifier
    }

    /// 由合併後的檔案清單建立
    pub fn from_sources(files: &[SourceFile]) -> Self {
        let (staged, base): (Vec<&SourceFile>, Vec<&SourceFile>) =
            files.iter().partition(|f| f.is_from_staging);
        Self::new(
            base.iter().map(|f| f.path.as_str()),
            staged.iter().map(|f| f.path.as_str()),
        )
    }

    pub fn classify(&self, token: &str) -> Option<PathKind> {
        let token = token.trim_start_matches("./");
        if self.staging.contains(token) {
            Some(PathKind::StagingFile)
        } else if self.base.contains(token) {
            Some(PathKind::BaseFile)
        } else if self.config_names.contains(file_name_of(token)) {
            Some(PathKind::ConfigFile)
        } else {
            None
        }
    }

    /// 將訊息切成文字與已辨識的路徑片段。相鄰的文字會合併。
    pub fn segments(&self, message: &str) -> Vec<MessageSegment> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut last = 0;

        for found in PATH_TOKEN.find_iter(message) {
            text.push_str(&message[last..found.start()]);
            last = found.end();
            match self.classify(found.as_str()) {
                Some(kind) => {
                    if !text.is_empty() {
                        segments.push(MessageSegment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(MessageSegment::Path {
                        text: found.as_str().to_string(),
                        kind,
                    });
                }
                None => text.push_str(found.as_str()),
            }
        }

        text.push_str(&message[last..]);
        if !text.is_empty() {
            segments.push(MessageSegment::Text(text));
        }
        segments
    }
}

fn insert_with_name(set: &mut HashSet<String>, path: &str) {
    set.insert(path.to_string());
    set.insert(file_name_of(path).to_string());
}
