use crate::domain::model::{is_fsh_path, SourceFile, CONFIG_FILENAME};
use crate::domain::ports::{EntryType, RemoteSource};
use crate::utils::diagnostic_log::DiagnosticLog;
use crate::utils::error::Result;

pub const DEFAULT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub files: Vec<SourceFile>,
    /// 第一個找到的 sushi-config.yaml 內容
    pub config: Option<String>,
    /// 超過深度上限而被略過的目錄
    pub truncated: Vec<String>,
}

/// 深度優先掃描來源目錄，收集 `.fsh` 檔案
pub struct SourceScanner<'a, R: RemoteSource> {
    source: &'a R,
    max_depth: usize,
}

impl<'a, R: RemoteSource> SourceScanner<'a, R> {
    pub fn new(source: &'a R) -> Self {
        Self {
            source,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 目錄列表失敗時略過該子樹；檔案讀取失敗則中止整個掃描
    pub async fn scan(&self, root: &str, log: &mut DiagnosticLog) -> Result<ScanResult> {
        let mut result = ScanResult::default();
        // 明確的堆疊取代遞迴；反向推入以維持目錄列表的順序
        let mut pending: Vec<(String, usize)> = vec![(root.to_string(), 0)];

        while let Some((dir, depth)) = pending.pop() {
            let entries = match self.source.list_directory(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    log.warning(format!("Skipping directory {}: {}", dir, e));
                    continue;
                }
            };

            let mut subdirs = Vec::new();
            for entry in entries {
                match entry.entry_type {
                    EntryType::Dir => {
                        if depth + 1 > self.max_depth {
                            log.warning(format!(
                                "Directory {} exceeds max depth {}; not scanned",
                                entry.path, self.max_depth
                            ));
                            result.truncated.push(entry.path);
                        } else {
                            subdirs.push((entry.path, depth + 1));
                        }
                    }
                    EntryType::File if is_fsh_path(&entry.path) => {
                        let content = self.fetch(&entry.path, log).await?;
                        result.files.push(SourceFile::new(entry.path, content));
                    }
                    EntryType::File if entry.name == CONFIG_FILENAME && result.config.is_none() => {
                        result.config = Some(self.fetch(&entry.path, log).await?);
                        log.info(format!("Found {}", entry.path));
                    }
                    EntryType::File => {}
                }
            }
            pending.extend(subdirs.into_iter().rev());
        }

        if result.files.is_empty() {
            log.warning(format!("No files found under {} (no .fsh sources)", root));
        } else {
            log.info(format!("Found {} FSH files under {}", result.files.len(), root));
        }
        Ok(result)
    }

    async fn fetch(&self, path: &str, log: &mut DiagnosticLog) -> Result<String> {
        match self.source.get_file_content(path).await {
            Ok(content) => Ok(content),
            Err(e) => {
                log.error(format!("Failed to fetch {}: {}", path, e));
                Err(e)
            }
        }
    }
}
