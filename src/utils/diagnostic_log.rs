use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Info,
        LogLevel::Success,
        LogLevel::Warning,
        LogLevel::Error,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub message: String,
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
}

/// 編譯過程的診斷紀錄
///
/// 只能附加；唯一的刪除方式是 [`DiagnosticLog::clear`]。每筆紀錄同時寫到
/// `tracing`，讓行程日誌與畫面上的紀錄一致。過濾都是投影，不會改動紀錄本身。
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Vec<LogEntry>,
    next_id: u64,
    hidden_levels: HashSet<LogLevel>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) -> &LogEntry {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }

        self.next_id += 1;
        self.entries.push(LogEntry {
            id: self.next_id,
            message,
            level,
            timestamp: Utc::now(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空紀錄並恢復所有等級為可見。id 不會重新計算。
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hidden_levels.clear();
    }

    pub fn set_level_visible(&mut self, level: LogLevel, visible: bool) {
        if visible {
            self.hidden_levels.remove(&level);
        } else {
            self.hidden_levels.insert(level);
        }
    }

    pub fn is_level_visible(&self, level: LogLevel) -> bool {
        !self.hidden_levels.contains(&level)
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.entries.iter().filter(|e| e.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(LogLevel::Error) > 0
    }

    /// 依可見等級與關鍵字 (不分大小寫) 過濾
    pub fn filter(&self, search: Option<&str>) -> Vec<&LogEntry> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.entries
            .iter()
            .filter(|entry| self.is_level_visible(entry.level))
            .filter(|entry| match &needle {
                Some(needle) => entry.message.to_lowercase().contains(needle),
                None => true,
            })
            .collect()
    }

    /// 每一行一筆紀錄的純文字輸出
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "[{}] {:<7} {}",
                    entry.timestamp.format("%H:%M:%S%.3f"),
                    format!("{:?}", entry.level).to_uppercase(),
                    entry.message
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
