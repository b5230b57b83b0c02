use crate::domain::model::{is_fsh_path, StagedFile};
use crate::domain::ports::{EntryType, RemoteEntry, RemoteSource, Storage};
use crate::utils::error::{FshError, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}

/// 本機目錄當作 [`RemoteSource`]；路徑一律相對於 root，以 '/' 分隔
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match path.trim_matches('/') {
            "" | "." => self.root.clone(),
            relative => self.root.join(relative),
        }
    }
}

impl RemoteSource for LocalSource {
    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let dir = self.resolve(path);
        let read_dir = fs::read_dir(&dir).map_err(|e| FshError::RetrievalError {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let prefix = path.trim_matches('/');
        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_type = if entry.file_type()?.is_dir() {
                EntryType::Dir
            } else {
                EntryType::File
            };
            let path = if prefix.is_empty() || prefix == "." {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            entries.push(RemoteEntry {
                name,
                path,
                entry_type,
            });
        }
        // read_dir 的順序依平台而定
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn get_file_content(&self, path: &str) -> Result<String> {
        let full_path = self.resolve(path);
        fs::read_to_string(&full_path).map_err(|e| FshError::RetrievalError {
            path: full_path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// 讀取 staging 目錄下所有 `.fsh` 檔案，路徑相對於該目錄
pub fn load_staged_files(dir: &Path) -> Result<Vec<StagedFile>> {
    let mut staged = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        // file_type 不跟隨符號連結，連結成環的目錄不會被重複走訪
        let mut children: Vec<(PathBuf, bool)> = fs::read_dir(&current)?
            .map(|entry| -> std::io::Result<(PathBuf, bool)> {
                let entry = entry?;
                Ok((entry.path(), entry.file_type()?.is_dir()))
            })
            .collect::<std::io::Result<_>>()?;
        children.sort();

        for (child, is_dir) in children {
            if is_dir {
                pending.push(child);
                continue;
            }
            let relative = child
                .strip_prefix(dir)
                .unwrap_or(child.as_path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if is_fsh_path(&relative) && child.is_file() {
                let content = fs::read_to_string(&child)?;
                staged.push(StagedFile::new(relative, content));
            }
        }
    }

    staged.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(staged)
}
