use crate::core::coordinator::ExecutionCoordinator;
use crate::core::overlay::{OverlayKey, OverlayMerger};
use crate::core::scanner::{SourceScanner, DEFAULT_MAX_DEPTH};
use crate::domain::model::{ExecutionResult, GeneratedArtifact, SourceFile, StagedFile};
use crate::domain::ports::{RemoteSource, Storage};
use crate::utils::diagnostic_log::DiagnosticLog;
use crate::utils::error::Result;
use std::collections::HashMap;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const PACKAGE_ARCHIVE: &str = "fsh-generated.zip";

#[derive(Debug, Clone)]
pub struct WorkbenchRun {
    pub result: ExecutionResult,
    /// overlay 合併後實際編譯的檔案
    pub files: Vec<SourceFile>,
    /// 寫入 storage 的路徑
    pub written: Vec<String>,
}

/// 掃描 → overlay → 編譯 → 輸出
pub struct Workbench<R: RemoteSource, S: Storage> {
    source: R,
    storage: S,
    coordinator: ExecutionCoordinator,
    merger: OverlayMerger,
    max_depth: usize,
    package_zip: bool,
}

impl<R: RemoteSource, S: Storage> Workbench<R, S> {
    pub fn new(source: R, storage: S, coordinator: ExecutionCoordinator) -> Self {
        Self {
            source,
            storage,
            coordinator,
            merger: OverlayMerger::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            package_zip: false,
        }
    }

    pub fn with_overlay_key(mut self, key: OverlayKey) -> Self {
        self.merger = OverlayMerger::new(key);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_zip_package(mut self, enabled: bool) -> Self {
        self.package_zip = enabled;
        self
    }

    pub fn coordinator(&self) -> &ExecutionCoordinator {
        &self.coordinator
    }

    pub async fn run(
        &mut self,
        root: &str,
        staging: &[StagedFile],
        log: &mut DiagnosticLog,
    ) -> Result<WorkbenchRun> {
        // Extract
        log.info(format!("Scanning {} (max depth {})", root, self.max_depth));
        let scan = SourceScanner::new(&self.source)
            .with_max_depth(self.max_depth)
            .scan(root, log)
            .await?;

        // Overlay
        let files = self.merger.merge(scan.files, staging);
        let staged = files.iter().filter(|f| f.is_from_staging).count();
        if staged > 0 {
            log.info(format!("{} of {} files come from staging", staged, files.len()));
        }

        // Compile
        let mut result = self
            .coordinator
            .compile(&files, scan.config.as_deref(), log)
            .await;
        self.coordinator.timer().log_final_stats();

        // Load
        let mut written = Vec::new();
        if result.success && !result.generated_files.is_empty() {
            let exported = self
                .export(&result.generated_files, &mut written, log)
                .await;
            match exported {
                Ok(warnings) => result.warnings.extend(warnings),
                Err(e) => {
                    // 編譯成功但輸出失敗，整體結果視為失敗
                    log.error(format!("Export failed: {}", e));
                    result.success = false;
                    result.errors.push(e.to_string());
                }
            }
        }

        Ok(WorkbenchRun {
            result,
            files,
            written,
        })
    }

    /// 寫出所有產出物；回傳輸出時產生的警告。失敗前已寫入的路徑仍會留在 `written`。
    async fn export(
        &self,
        artifacts: &[GeneratedArtifact],
        written: &mut Vec<String>,
        log: &mut DiagnosticLog,
    ) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        for artifact in artifacts {
            self.storage
                .write_file(&artifact.filename, artifact.content.as_bytes())
                .await?;
            written.push(artifact.filename.clone());
        }

        if self.package_zip {
            let zip_data = package_archive(artifacts, &mut warnings)?;
            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(PACKAGE_ARCHIVE, &zip_data).await?;
            written.push(PACKAGE_ARCHIVE.to_string());
        }

        for warning in &warnings {
            log.warning(warning.clone());
        }
        log.success(format!("Wrote {} files", written.len()));
        Ok(warnings)
    }
}

/// 將所有產出物打包成單一 ZIP。同名的產出物只保留最後一個，與依序寫入 storage 的結果相同。
pub fn package_archive(
    artifacts: &[GeneratedArtifact],
    warnings: &mut Vec<String>,
) -> Result<Vec<u8>> {
    let last_index: HashMap<&str, usize> = artifacts
        .iter()
        .enumerate()
        .map(|(i, a)| (a.filename.as_str(), i))
        .collect();

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (i, artifact) in artifacts.iter().enumerate() {
        if last_index.get(artifact.filename.as_str()) != Some(&i) {
            warnings.push(format!(
                "{} appears more than once; only the last copy is packed into {}",
                artifact.filename, PACKAGE_ARCHIVE
            ));
            continue;
        }
        zip.start_file::<_, ()>(artifact.filename.as_str(), FileOptions::default())?;
        zip.write_all(artifact.content.as_bytes())?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
