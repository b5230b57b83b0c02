use clap::Parser;
use fsh_workbench::utils::error::{ErrorSeverity, FshError};
use fsh_workbench::utils::path_links::{MessageSegment, PathClassifier, PathKind};
use fsh_workbench::utils::{diagnostic_log::LogLevel, logger, validation::Validate};
use fsh_workbench::{
    load_staged_files, CliConfig, DiagnosticLog, ExecutionCoordinator, FallbackEngine,
    LocalSource, LocalStorage, Workbench,
};
use std::path::Path;

fn exit_code(e: &FshError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 可重試
        ErrorSeverity::High => 1,     // 處理錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}

fn fail(e: &FshError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(exit_code(e).max(1));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting fsh-workbench CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let staged = match &config.staging {
        Some(dir) => load_staged_files(Path::new(dir)).unwrap_or_else(|e| fail(&e)),
        None => Vec::new(),
    };
    if !staged.is_empty() {
        tracing::info!("📝 {} staged files loaded", staged.len());
    }

    // 此建置沒有原生後端，auto 模式直接使用備援引擎
    let coordinator = ExecutionCoordinator::new(config.mode, Box::new(FallbackEngine::new()));
    let mut workbench = Workbench::new(
        LocalSource::new(&config.input),
        LocalStorage::new(config.output.clone()),
        coordinator,
    )
    .with_max_depth(config.max_depth)
    .with_zip_package(config.zip);

    let mut log = DiagnosticLog::new();
    let run = match workbench.run(".", &staged, &mut log).await {
        Ok(run) => run,
        Err(e) => fail(&e),
    };

    let result = &run.result;
    if result.success {
        println!(
            "✅ Compiled {} resources ({} warnings)",
            result.resource_count,
            result.warnings.len()
        );
        if !run.written.is_empty() {
            println!("📁 Output saved to: {}", config.output);
        }
        return Ok(());
    }

    // 錯誤訊息中出現的檔案標示來源
    let classifier = PathClassifier::from_sources(&run.files);
    log.set_level_visible(LogLevel::Info, false);
    log.set_level_visible(LogLevel::Success, false);
    for entry in log.filter(None) {
        let mut line = String::new();
        for segment in classifier.segments(&entry.message) {
            match segment {
                MessageSegment::Text(text) => line.push_str(&text),
                MessageSegment::Path { text, kind } => {
                    let tag = match kind {
                        PathKind::BaseFile => "input",
                        PathKind::StagingFile => "staging",
                        PathKind::ConfigFile => "config",
                    };
                    line.push_str(&format!("{} [{}]", text, tag));
                }
            }
        }
        eprintln!("{:?}: {}", entry.level, line);
    }
    eprintln!("❌ Run failed with {} errors", result.errors.len());
    std::process::exit(1);
}
