use fsh_workbench::core::workbench::PACKAGE_ARCHIVE;
use fsh_workbench::utils::path_links::{MessageSegment, PathClassifier, PathKind};
use fsh_workbench::{
    load_staged_files, DiagnosticLog, ExecutionCoordinator, ExecutionMode, FallbackEngine,
    LocalSource, LocalStorage, OverlayKey, Workbench,
};
use std::fs;
use std::io::Read;
use tempfile::TempDir;

fn write(dir: &TempDir, path: &str, content: &str) {
    let full = dir.path().join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "sushi-config.yaml",
        "id: local.ig\ncanonical: http://local.test/fhir/\nname: LocalIG\nfhirVersion: 4.0.1\n",
    );
    write(
        &dir,
        "input/fsh/terminology.fsh",
        "ValueSet: Colors\nTitle: \"Color codes\"\n\nCodeSystem: Color System\nId: colors-cs\n",
    );
    write(
        &dir,
        "input/fsh/extensions.fsh",
        "Extension: Birth Place\nId: birth-place\n* value[x] only string\n",
    );
    dir
}

#[tokio::test]
async fn test_local_project_round_trip() -> anyhow::Result<()> {
    let input = project();
    let output = TempDir::new()?;
    let output_path = output.path().to_string_lossy().into_owned();

    let coordinator =
        ExecutionCoordinator::new(ExecutionMode::Auto, Box::new(FallbackEngine::new()));
    let mut workbench = Workbench::new(
        LocalSource::new(input.path()),
        LocalStorage::new(output_path.clone()),
        coordinator,
    )
    .with_zip_package(true);
    let mut log = DiagnosticLog::new();

    let run = workbench.run(".", &[], &mut log).await?;

    assert!(run.result.success);
    assert_eq!(run.result.resource_count, 3);

    // Extension 排在 ValueSet 與 CodeSystem 之前
    let order: Vec<&str> = run
        .result
        .generated_files
        .iter()
        .map(|a| a.filename.as_str())
        .collect();
    assert_eq!(
        order,
        vec![
            "StructureDefinition-birth-place.json",
            "ValueSet-colors.json",
            "CodeSystem-colors-cs.json"
        ]
    );

    let value_set: serde_json::Value = serde_json::from_str(&fs::read_to_string(
        output.path().join("ValueSet-colors.json"),
    )?)?;
    assert_eq!(value_set["url"], "http://local.test/fhir/ValueSet/colors");
    assert_eq!(value_set["title"], "Color codes");

    let zip_path = output.path().join(PACKAGE_ARCHIVE);
    assert!(zip_path.exists());
    let mut archive = zip::ZipArchive::new(fs::File::open(zip_path)?)?;
    assert_eq!(archive.len(), 3);

    let mut content = String::new();
    archive
        .by_name("StructureDefinition-birth-place.json")?
        .read_to_string(&mut content)?;
    let extension: serde_json::Value = serde_json::from_str(&content)?;
    assert_eq!(extension["type"], "Extension");
    assert_eq!(extension["kind"], "complex-type");
    Ok(())
}

#[tokio::test]
async fn test_staging_directory_overlay_by_relative_path() -> anyhow::Result<()> {
    let input = project();
    let staging = TempDir::new()?;
    // 相對路徑與基底相同才會覆蓋
    write(
        &staging,
        "input/fsh/terminology.fsh",
        "ValueSet: Sizes\n",
    );
    write(&staging, "terminology.fsh", "ValueSet: Elsewhere\n");
    let output = TempDir::new()?;

    let staged = load_staged_files(staging.path())?;
    assert_eq!(staged.len(), 2);

    let coordinator =
        ExecutionCoordinator::new(ExecutionMode::Fallback, Box::new(FallbackEngine::new()));
    let mut workbench = Workbench::new(
        LocalSource::new(input.path()),
        LocalStorage::new(output.path().to_string_lossy().into_owned()),
        coordinator,
    )
    .with_overlay_key(OverlayKey::RelativePath);
    let mut log = DiagnosticLog::new();

    let run = workbench.run(".", &staged, &mut log).await?;

    assert_eq!(run.files.len(), 3);
    let overridden = run
        .files
        .iter()
        .find(|f| f.path == "input/fsh/terminology.fsh")
        .unwrap();
    assert!(overridden.is_from_staging);
    assert_eq!(overridden.content, "ValueSet: Sizes\n");

    assert!(output.path().join("ValueSet-sizes.json").exists());
    assert!(output.path().join("ValueSet-elsewhere.json").exists());
    assert!(!output.path().join("ValueSet-colors.json").exists());

    // 診斷訊息中的檔案依來源分類
    let classifier = PathClassifier::from_sources(&run.files);
    let segments = classifier.segments("see input/fsh/terminology.fsh and missing.fsh");
    assert!(segments.contains(&MessageSegment::Path {
        text: "input/fsh/terminology.fsh".to_string(),
        kind: PathKind::StagingFile,
    }));
    assert!(!segments
        .iter()
        .any(|s| matches!(s, MessageSegment::Path { text, .. } if text == "missing.fsh")));
    Ok(())
}

#[tokio::test]
async fn test_zip_export_with_duplicate_artifacts() -> anyhow::Result<()> {
    let input = TempDir::new()?;
    write(&input, "dup.fsh", "Instance: Same\nInstance: Same");
    let output = TempDir::new()?;

    let coordinator =
        ExecutionCoordinator::new(ExecutionMode::Fallback, Box::new(FallbackEngine::new()));
    let mut workbench = Workbench::new(
        LocalSource::new(input.path()),
        LocalStorage::new(output.path().to_string_lossy().into_owned()),
        coordinator,
    )
    .with_zip_package(true);
    let mut log = DiagnosticLog::new();

    let run = workbench.run(".", &[], &mut log).await?;

    assert!(run.result.success);
    assert_eq!(run.result.resource_count, 2);
    assert!(run.written.contains(&PACKAGE_ARCHIVE.to_string()));
    assert!(run
        .result
        .warnings
        .iter()
        .any(|w| w.contains("only the last copy")));
    assert!(!log.has_errors());

    let archive = zip::ZipArchive::new(fs::File::open(output.path().join(PACKAGE_ARCHIVE))?)?;
    assert_eq!(archive.len(), 1);
    assert!(output.path().join("same.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_depth_limit_is_a_warning() -> anyhow::Result<()> {
    let input = TempDir::new()?;
    write(&input, "a/b/c/deep.fsh", "Profile: Deep\nParent: Patient\n");
    write(&input, "top.fsh", "Profile: Top\nParent: Patient\n");
    let output = TempDir::new()?;

    let coordinator =
        ExecutionCoordinator::new(ExecutionMode::Fallback, Box::new(FallbackEngine::new()));
    let mut workbench = Workbench::new(
        LocalSource::new(input.path()),
        LocalStorage::new(output.path().to_string_lossy().into_owned()),
        coordinator,
    )
    .with_max_depth(2);
    let mut log = DiagnosticLog::new();

    let run = workbench.run(".", &[], &mut log).await?;

    assert!(run.result.success);
    assert_eq!(run.result.resource_count, 1);
    assert!(!log.filter(Some("exceeds max depth")).is_empty());
    assert!(!log.has_errors());
    Ok(())
}
