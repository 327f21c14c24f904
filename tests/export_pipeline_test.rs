//! End-to-end pipeline tests against a mock export service
//!
//! The mock serves the token endpoint, the export submission/status
//! endpoints, and the rendered files; the run coordinator is exercised
//! through its public API with delivery disabled.

use easel::config::{
    secret_string, EaselConfig, Environment, ExportConfig, FailurePolicy, PagesConfig,
    PowerBiConfig,
};
use easel::core::export::RunCoordinator;
use easel::core::merge::{DeckBuilder, MergedSlide, SourceDeck};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::path::Path;

/// Bytes of a single-slide deck with a recognizable text marker
fn fixture_deck_bytes(dir: &Path, marker: &str) -> Vec<u8> {
    let shape = format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"2\" name=\"Title\"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>\
         <p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{marker}</a:t></a:r></a:p></p:txBody></p:sp>"
    );
    let mut builder = DeckBuilder::new();
    builder.add_slide(MergedSlide {
        shapes_xml: vec![shape.into_bytes()],
        pictures: Vec::new(),
        namespaces: Vec::new(),
    });
    let path = dir.join(format!("fixture-{marker}.pptx"));
    builder.save(&path).unwrap();
    std::fs::read(&path).unwrap()
}

fn pipeline_config(
    server_url: &str,
    work_dir: &Path,
    pages_path: &Path,
    on_page_failure: FailurePolicy,
) -> EaselConfig {
    EaselConfig {
        application: Default::default(),
        environment: Environment::Development,
        powerbi: PowerBiConfig {
            tenant_id: "t1".to_string(),
            client_id: "c1".to_string(),
            client_secret: secret_string("s1".to_string()),
            workspace_id: "ws1".to_string(),
            report_id: "rpt1".to_string(),
            api_base_url: server_url.to_string(),
            authority_host: server_url.to_string(),
            timeout_seconds: 10,
            poll_interval_seconds: 1,
            max_poll_attempts: 5,
            filter_table: "scd_Measure".to_string(),
            filter_column: "Measure_ID".to_string(),
        },
        pages: PagesConfig {
            file_path: pages_path.to_string_lossy().into_owned(),
            ..Default::default()
        },
        export: ExportConfig {
            chunk_size: 2,
            work_dir: work_dir.to_string_lossy().into_owned(),
            output_name: None,
            on_page_failure,
        },
        delivery: Default::default(),
        logging: Default::default(),
    }
}

async fn mock_token(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/t1/oauth2/v2.0/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
            Matcher::UrlEncoded("client_id".into(), "c1".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token":"tok","token_type":"Bearer","expires_in":3599}"#)
        .create_async()
        .await
}

/// Mock the submit/poll/download chain for one page
async fn mock_page_export(
    server: &mut ServerGuard,
    export_id: &str,
    request_body: serde_json::Value,
    deck_bytes: Vec<u8>,
) -> Vec<mockito::Mock> {
    let base = server.url();
    let submit = server
        .mock("POST", "/v1.0/myorg/groups/ws1/reports/rpt1/ExportTo")
        .match_body(Matcher::Json(request_body))
        .with_status(202)
        .with_body(format!(r#"{{"id":"{export_id}"}}"#))
        .create_async()
        .await;
    let poll = server
        .mock(
            "GET",
            format!("/v1.0/myorg/groups/ws1/reports/rpt1/exports/{export_id}").as_str(),
        )
        .with_status(200)
        .with_body(format!(
            r#"{{"status":"Succeeded","percentComplete":100,"resourceLocation":"{base}/files/{export_id}"}}"#
        ))
        .create_async()
        .await;
    let download = server
        .mock("GET", format!("/files/{export_id}").as_str())
        .with_status(200)
        .with_body(deck_bytes)
        .create_async()
        .await;
    vec![submit, poll, download]
}

fn unfiltered_request(page_name: &str) -> serde_json::Value {
    json!({
        "format": "PPTX",
        "powerBIReportConfiguration": {"pages": [{"pageName": page_name}]}
    })
}

#[tokio::test]
async fn test_full_run_exports_filters_and_merges_in_order() {
    let mut server = Server::new_async().await;
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();

    let token = mock_token(&mut server).await;

    // Page s2 carries measure BR007; its export request must narrow by it.
    let _m1 = mock_page_export(
        &mut server,
        "exp-1",
        unfiltered_request("s1"),
        fixture_deck_bytes(fixtures.path(), "ONE"),
    )
    .await;
    let _m2 = mock_page_export(
        &mut server,
        "exp-2",
        json!({
            "format": "PPTX",
            "powerBIReportConfiguration": {
                "pages": [{"pageName": "s2"}],
                "reportLevelFilters": [{"filter": "scd_Measure/Measure_ID in ('BR007')"}]
            }
        }),
        fixture_deck_bytes(fixtures.path(), "TWO"),
    )
    .await;
    let _m3 = mock_page_export(
        &mut server,
        "exp-3",
        unfiltered_request("s3"),
        fixture_deck_bytes(fixtures.path(), "THREE"),
    )
    .await;

    let pages_path = fixtures.path().join("pages.json");
    std::fs::write(
        &pages_path,
        r#"[
            {"pageName": "s3", "displayName": "Three", "pageOrder": 3},
            {"pageName": "s1", "displayName": "One", "pageOrder": 1},
            {"pageName": "s2", "displayName": "Two", "pageOrder": 2, "measureId": "BR007"}
        ]"#,
    )
    .unwrap();

    let config = pipeline_config(
        &server.url(),
        work.path(),
        &pages_path,
        FailurePolicy::Abort,
    );
    let coordinator = RunCoordinator::new(config).unwrap();
    let summary = coordinator.execute_run().await.unwrap();

    assert!(summary.is_successful());
    assert_eq!(summary.total_pages, 3);
    assert_eq!(summary.exported_pages, 3);
    assert_eq!(summary.failed_pages, 0);
    assert_eq!(summary.merged_slides, 3);

    // Output lands in the run directory, DEV_-prefixed outside production.
    let output = summary.output_path.expect("run produced an output path");
    assert_eq!(
        output.file_name().unwrap().to_string_lossy(),
        "DEV_Full Report.pptx"
    );
    assert!(output.exists());

    // Slides follow page order regardless of page-file ordering.
    let mut merged = SourceDeck::open(&output).unwrap();
    assert_eq!(merged.slide_count(), 3);
    for (index, marker) in ["ONE", "TWO", "THREE"].iter().enumerate() {
        let xml = String::from_utf8(merged.slide(index).unwrap().xml).unwrap();
        assert!(xml.contains(marker), "slide {index} should contain {marker}");
    }

    token.assert_async().await;
}

#[tokio::test]
async fn test_failed_page_aborts_run_by_default() {
    let mut server = Server::new_async().await;
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();

    let _token = mock_token(&mut server).await;

    // s1 fails on the service side; s2 renders fine.
    let _submit = server
        .mock("POST", "/v1.0/myorg/groups/ws1/reports/rpt1/ExportTo")
        .match_body(Matcher::Json(unfiltered_request("s1")))
        .with_status(202)
        .with_body(r#"{"id":"exp-bad"}"#)
        .create_async()
        .await;
    let _poll = server
        .mock("GET", "/v1.0/myorg/groups/ws1/reports/rpt1/exports/exp-bad")
        .with_status(200)
        .with_body(r#"{"status":"Failed","error":{"code":"Render","message":"visual exploded"}}"#)
        .create_async()
        .await;
    let _ok = mock_page_export(
        &mut server,
        "exp-ok",
        unfiltered_request("s2"),
        fixture_deck_bytes(fixtures.path(), "OK"),
    )
    .await;

    let pages_path = fixtures.path().join("pages.json");
    std::fs::write(
        &pages_path,
        r#"[
            {"pageName": "s1", "displayName": "One", "pageOrder": 1},
            {"pageName": "s2", "displayName": "Two", "pageOrder": 2}
        ]"#,
    )
    .unwrap();

    let config = pipeline_config(
        &server.url(),
        work.path(),
        &pages_path,
        FailurePolicy::Abort,
    );
    let coordinator = RunCoordinator::new(config).unwrap();
    let result = coordinator.execute_run().await;

    assert!(result.is_err());
    let message = result.unwrap_err().to_string();
    assert!(message.contains("visual exploded"), "got: {message}");
}

#[tokio::test]
async fn test_skip_policy_merges_surviving_pages() {
    let mut server = Server::new_async().await;
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();

    let _token = mock_token(&mut server).await;

    let _submit = server
        .mock("POST", "/v1.0/myorg/groups/ws1/reports/rpt1/ExportTo")
        .match_body(Matcher::Json(unfiltered_request("s1")))
        .with_status(202)
        .with_body(r#"{"id":"exp-bad"}"#)
        .create_async()
        .await;
    let _poll = server
        .mock("GET", "/v1.0/myorg/groups/ws1/reports/rpt1/exports/exp-bad")
        .with_status(200)
        .with_body(r#"{"status":"Failed","error":{"message":"no data"}}"#)
        .create_async()
        .await;
    let _ok = mock_page_export(
        &mut server,
        "exp-ok",
        unfiltered_request("s2"),
        fixture_deck_bytes(fixtures.path(), "SURVIVOR"),
    )
    .await;

    let pages_path = fixtures.path().join("pages.json");
    std::fs::write(
        &pages_path,
        r#"[
            {"pageName": "s1", "displayName": "One", "pageOrder": 1},
            {"pageName": "s2", "displayName": "Two", "pageOrder": 2}
        ]"#,
    )
    .unwrap();

    let config = pipeline_config(
        &server.url(),
        work.path(),
        &pages_path,
        FailurePolicy::Skip,
    );
    let coordinator = RunCoordinator::new(config).unwrap();
    let summary = coordinator.execute_run().await.unwrap();

    assert!(!summary.is_successful());
    assert_eq!(summary.exported_pages, 1);
    assert_eq!(summary.failed_pages, 1);
    assert_eq!(summary.merged_slides, 1);

    let output = summary.output_path.unwrap();
    let mut merged = SourceDeck::open(&output).unwrap();
    let xml = String::from_utf8(merged.slide(0).unwrap().xml).unwrap();
    assert!(xml.contains("SURVIVOR"));
}
