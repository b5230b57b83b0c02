use crate::domain::ports::EngineTag;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct TimingRecord {
    pub operation: String,
    pub engine: EngineTag,
    pub elapsed: Duration,
}

/// 以 (操作名稱, 引擎) 為鍵的單調計時器
#[derive(Debug, Default)]
pub struct OperationTimer {
    running: HashMap<(String, EngineTag), Instant>,
    completed: Vec<TimingRecord>,
}

impl OperationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 開始計時；同一個鍵重複呼叫會重新起算
    pub fn start(&mut self, operation: &str, engine: EngineTag) {
        self.running
            .insert((operation.to_string(), engine), Instant::now());
    }

    /// 停止計時並回傳經過時間；沒有對應的 start 時回傳 None
    pub fn stop(&mut self, operation: &str, engine: EngineTag) -> Option<Duration> {
        let started = self.running.remove(&(operation.to_string(), engine))?;
        let elapsed = started.elapsed();
        self.completed.push(TimingRecord {
            operation: operation.to_string(),
            engine,
            elapsed,
        });
        Some(elapsed)
    }

    pub fn is_running(&self, operation: &str, engine: EngineTag) -> bool {
        self.running.contains_key(&(operation.to_string(), engine))
    }

    pub fn history(&self) -> &[TimingRecord] {
        &self.completed
    }

    pub fn log_final_stats(&self) {
        let total: Duration = self.completed.iter().map(|r| r.elapsed).sum();
        tracing::info!(
            "📊 Final Stats - {} timed attempts, Total Time: {:?}",
            self.completed.len(),
            total
        );
    }
}
