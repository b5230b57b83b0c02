use crate::domain::model::{file_name_of, is_fsh_path, SourceFile, StagedFile};
use serde::{Deserialize, Serialize};

/// 暫存檔與來源檔比對的方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKey {
    /// 只比對最後一段檔名；不同目錄下的同名檔案會一起被覆寫
    #[default]
    FileName,
    /// 比對完整相對路徑
    RelativePath,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayMerger {
    key: OverlayKey,
}

impl OverlayMerger {
    pub fn new(key: OverlayKey) -> Self {
        Self { key }
    }

    fn matches(&self, file: &SourceFile, staged_path: &str) -> bool {
        match self.key {
            OverlayKey::FileName => file.name == file_name_of(staged_path),
            OverlayKey::RelativePath => file.path == staged_path,
        }
    }

    /// 以暫存檔覆寫來源檔。只處理 `.fsh`；來源檔不會被移除，也保留原本的路徑與順序，
    /// 沒有對應來源的暫存檔依序附加在最後。
    pub fn merge(&self, base: Vec<SourceFile>, staging: &[StagedFile]) -> Vec<SourceFile> {
        let mut merged = base;

        for staged in staging.iter().filter(|s| is_fsh_path(&s.path)) {
            let mut replaced = 0;
            for file in merged.iter_mut().filter(|f| self.matches(f, &staged.path)) {
                file.content = staged.content.clone();
                file.is_from_staging = true;
                replaced += 1;
            }

            if replaced == 0 {
                tracing::debug!("📝 Adding staged file {}", staged.path);
                let mut file = SourceFile::new(staged.path.clone(), staged.content.clone());
                file.is_from_staging = true;
                merged.push(file);
            } else {
                tracing::debug!("📝 Staged {} overrides {} file(s)", staged.path, replaced);
            }
        }

        merged
    }
}
