//! End-to-end pipeline runs against an in-memory host.

mod common;

use common::{harness, offline, with_model, FakeHost};
use repoinsight::models::DerivationSource;
use repoinsight::{
    AnalysisMode, AnalysisStatus, Error, ExportFormat, ExportRenderer, InsightGenerator,
};

const URL: &str = "https://github.com/octocat/Hello-World";

#[tokio::test]
async fn test_analysis_completes_with_model_insights() {
    let h = with_model(FakeHost::hello_world());

    let analysis = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();

    assert_eq!(analysis.status, AnalysisStatus::Completed);
    assert_eq!(analysis.owner, "octocat");
    assert_eq!(analysis.repository_name, "Hello-World");
    assert_eq!(analysis.stars, 2500);
    assert!(analysis.error_message.is_none());

    let insights = analysis.insights.as_ref().unwrap();
    assert!(insights.error.is_none());
    assert_eq!(insights.summary.value, "Hello-World is a minimal greeting app.");
    assert_eq!(
        insights.summary.source,
        DerivationSource::Model {
            model: "canned-model".to_string()
        }
    );
    assert_eq!(insights.tech_stack.value.frameworks, vec!["Express"]);
    assert!(insights.setup_instructions.value.contains("npm install"));

    let structure = analysis.file_structure.as_ref().unwrap();
    assert_eq!(structure.total_files, 5);
    assert!(structure.breakdown.directories.contains(&"src".to_string()));
    assert!(structure.breakdown.important_files.contains(&"package.json".to_string()));

    let stored = h.pipeline.get(analysis.id).unwrap();
    assert_eq!(stored.status, AnalysisStatus::Completed);
}

#[tokio::test]
async fn test_analysis_without_model_uses_heuristics() {
    let h = offline(FakeHost::hello_world());

    let analysis = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();

    assert_eq!(analysis.status, AnalysisStatus::Completed);
    let insights = analysis.insights.unwrap();
    assert!(insights.error.is_some());
    assert!(!insights.summary.is_model_derived());
    assert!(insights.summary.value.contains("Hello-World"));
    assert!(insights
        .tech_stack
        .value
        .primary_languages
        .contains(&"JavaScript".to_string()));
    assert!(insights.setup_instructions.value.contains("git clone"));
}

#[tokio::test]
async fn test_bare_repository_still_completes() {
    let h = offline(FakeHost::bare());

    let analysis = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();

    assert_eq!(analysis.status, AnalysisStatus::Completed);
    let snapshot = analysis.repository_data.unwrap();
    assert!(snapshot.readme_file.is_none());
    assert!(snapshot.manifest_files.is_empty());
    let structure = analysis.file_structure.unwrap();
    assert_eq!(structure.total_files, 0);
    assert!(structure.breakdown.directories.is_empty());
}

#[tokio::test]
async fn test_missing_repository_records_failure() {
    let h = offline(FakeHost::missing());

    let err = h
        .pipeline
        .analyze("https://github.com/octocat/Hello-World.git", AnalysisMode::Reuse)
        .await
        .unwrap_err();

    let Error::AnalysisFailed { analysis_id, .. } = &err else {
        panic!("unexpected error: {}", err);
    };
    assert!(err.is_not_found());

    let stored = h.pipeline.get(*analysis_id).unwrap();
    assert_eq!(stored.status, AnalysisStatus::Failed);
    assert!(stored
        .error_message
        .as_deref()
        .unwrap()
        .contains("octocat/Hello-World"));
    assert!(stored.insights.is_none());
}

#[tokio::test]
async fn test_invalid_url_creates_no_record() {
    let h = offline(FakeHost::hello_world());

    let err = h
        .pipeline
        .analyze("https://gitlab.com/octocat/Hello-World", AnalysisMode::Reuse)
        .await
        .unwrap_err();

    assert!(err.is_invalid_input());
    assert_eq!(h.host.metadata_calls(), 0);
    let (_, total) = h.pipeline.list(None, None).unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_reuse_returns_existing_completed_analysis() {
    let h = offline(FakeHost::hello_world());

    let first = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();
    let second = h
        .pipeline
        .analyze("https://github.com/octocat/Hello-World/", AnalysisMode::Reuse)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(h.host.metadata_calls(), 1);

    let outcome = h.pipeline.submit(URL, AnalysisMode::Reuse).await.unwrap();
    assert!(outcome.is_reused());
    assert_eq!(outcome.into_analysis().id, first.id);
}

#[tokio::test]
async fn test_first_submission_is_created() {
    let h = offline(FakeHost::hello_world());

    let outcome = h.pipeline.submit(URL, AnalysisMode::Reuse).await.unwrap();

    assert!(!outcome.is_reused());
    assert_eq!(outcome.into_analysis().status, AnalysisStatus::Completed);
}

#[tokio::test]
async fn test_reanalyze_replaces_earlier_records() {
    let h = harness(FakeHost::hello_world(), InsightGenerator::offline(), true);

    let first = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();
    let first_dir = h.dir.path().join("exports").join(first.id.to_string());
    assert!(first_dir.exists());

    let second = h.pipeline.reanalyze(URL).await.unwrap();

    assert_ne!(first.id, second.id);
    assert!(matches!(
        h.pipeline.get(first.id),
        Err(Error::AnalysisNotFound(id)) if id == first.id
    ));
    assert!(!first_dir.exists());

    let (analyses, total) = h.pipeline.list(None, None).unwrap();
    assert_eq!(total, 1);
    assert_eq!(analyses[0].id, second.id);
}

#[tokio::test]
async fn test_eager_exports_cover_every_format() {
    let h = harness(FakeHost::hello_world(), InsightGenerator::offline(), true);

    let analysis = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();
    let exports = h.pipeline.exports(analysis.id).unwrap();

    assert_eq!(exports.len(), ExportFormat::ALL.len());
    for format in ExportFormat::ALL {
        let export = exports.iter().find(|e| e.format == format).unwrap();
        assert_eq!(
            export.filename,
            format!("Hello-World_octocat_analysis.{}", format.as_str())
        );
        assert!(export.file_size > 0);
    }
}

#[tokio::test]
async fn test_repeated_export_keeps_one_row_per_format() {
    let h = offline(FakeHost::hello_world());
    let analysis = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();

    let first = h.pipeline.export(analysis.id, ExportFormat::Markdown).await.unwrap();
    let second = h.pipeline.export(analysis.id, ExportFormat::Markdown).await.unwrap();

    assert_eq!(first.filename, second.filename);
    assert_eq!(first.file_size, second.file_size);
    let exports = h.pipeline.exports(analysis.id).unwrap();
    assert_eq!(exports.len(), 1);
}

#[tokio::test]
async fn test_download_generates_missing_exports_on_demand() {
    let h = offline(FakeHost::hello_world());
    let analysis = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();
    assert!(h.pipeline.exports(analysis.id).unwrap().is_empty());

    let download = h.pipeline.download(analysis.id, ExportFormat::Text).await.unwrap();
    assert_eq!(download.content_type, "text/plain");
    assert_eq!(download.export.filename, "Hello-World_octocat_analysis.txt");

    let again = h.pipeline.download(analysis.id, ExportFormat::Text).await.unwrap();
    assert_eq!(download.bytes, again.bytes);
    assert_eq!(h.pipeline.exports(analysis.id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_download_matches_explicit_export_bytes() {
    let h = offline(FakeHost::hello_world());
    let analysis = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();
    let stored = h.pipeline.get(analysis.id).unwrap();
    let renderer = ExportRenderer::new();

    for format in [ExportFormat::Markdown, ExportFormat::Text] {
        let downloaded = h.pipeline.download(analysis.id, format).await.unwrap();
        let rendered = renderer.render(&stored, format).unwrap();
        assert_eq!(downloaded.bytes, rendered.bytes, "{} download", format);

        let export = h.pipeline.export(analysis.id, format).await.unwrap();
        let on_disk = std::fs::read(
            h.dir
                .path()
                .join("exports")
                .join(analysis.id.to_string())
                .join(&export.filename),
        )
        .unwrap();
        assert_eq!(downloaded.bytes, on_disk, "{} export file", format);
        assert_eq!(export.file_size, on_disk.len() as u64);
    }
}

#[tokio::test]
async fn test_download_regenerates_when_file_is_gone() {
    let h = offline(FakeHost::hello_world());
    let analysis = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();
    let export = h.pipeline.export(analysis.id, ExportFormat::Markdown).await.unwrap();

    let path = h
        .dir
        .path()
        .join("exports")
        .join(analysis.id.to_string())
        .join(&export.filename);
    std::fs::remove_file(&path).unwrap();

    let download = h.pipeline.download(analysis.id, ExportFormat::Markdown).await.unwrap();
    assert!(String::from_utf8(download.bytes).unwrap().contains("Hello-World"));
    assert!(path.exists());
}

#[tokio::test]
async fn test_export_of_failed_analysis_is_rejected() {
    let h = offline(FakeHost::missing());
    let err = h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap_err();
    let Error::AnalysisFailed { analysis_id, .. } = err else {
        panic!("expected a recorded failure");
    };

    let err = h
        .pipeline
        .export(analysis_id, ExportFormat::Pdf)
        .await
        .unwrap_err();
    assert!(err.is_invalid_input());
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let h = offline(FakeHost::hello_world());
    h.pipeline.analyze(URL, AnalysisMode::Reuse).await.unwrap();

    let (completed, total) = h.pipeline.list(Some(10), Some(AnalysisStatus::Completed)).unwrap();
    assert_eq!(total, 1);
    assert_eq!(completed.len(), 1);

    let (failed, total) = h.pipeline.list(Some(10), Some(AnalysisStatus::Failed)).unwrap();
    assert_eq!(total, 0);
    assert!(failed.is_empty());
}

#[tokio::test]
async fn test_health_reports_each_service() {
    let h = offline(FakeHost::hello_world());

    let report = h.pipeline.health().await;

    assert_eq!(report.status, "degraded");
    assert!(report.services["github"].is_available());
    assert!(report.services["database"].is_available());
    assert!(!report.services["gemini"].is_available());

    let h = with_model(FakeHost::hello_world());
    assert_eq!(h.pipeline.health().await.status, "healthy");
}
