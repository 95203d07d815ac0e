use serde_json::json;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zephyr_client::models::{AttachmentEntity, ReportOptions};
use zephyr_client::{ApiVersion, QueryParams, SessionConfig, ZephyrScale, ZephyrSquad};

fn create_scale_client(server: &MockServer, version: ApiVersion) -> ZephyrScale {
    ZephyrScale::new(
        SessionConfig::new(format!("{}/", server.uri())).with_token("test_token"),
        version,
    )
    .expect("Failed to create client")
}

fn create_squad_client(server: &MockServer) -> ZephyrSquad {
    ZephyrSquad::new(
        SessionConfig::new(format!("{}/", server.uri())).with_basic_auth("admin", "admin"),
    )
    .expect("Failed to create client")
}

/// Helper to create a unique temp file path
fn temp_path(name: &str) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("zephyr_apis_{}_{}", timestamp, name))
}

#[tokio::test]
async fn test_cloud_healthcheck_and_test_cases() {
    let _ = env_logger::try_init();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/healthcheck"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testcases"))
        .and(query_param("projectKey", "PRJ"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"key": "PRJ-T1"}, {"key": "PRJ-T2"}],
            "isLast": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/testcases/PRJ-T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "PRJ-T1"})))
        .mount(&server)
        .await;

    let zephyr = create_scale_client(&server, ApiVersion::Cloud);
    let api = zephyr.cloud().unwrap();

    assert_eq!(api.healthcheck().get_health().await.unwrap(), json!(""));

    let mut params = QueryParams::new();
    params.insert("projectKey".to_string(), "PRJ".to_string());
    let cases = api.test_cases().get_test_cases(params).collect_all().await.unwrap();
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[1]["key"], "PRJ-T2");

    let case = api.test_cases().get_test_case("PRJ-T1").await.unwrap();
    assert_eq!(case["key"], "PRJ-T1");
}

#[tokio::test]
async fn test_cloud_create_test_case_merges_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/testcases"))
        .and(body_json(json!({
            "projectKey": "PRJ",
            "name": "Login works",
            "statusName": "Draft"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1, "key": "PRJ-T3"})))
        .expect(1)
        .mount(&server)
        .await;

    let zephyr = create_scale_client(&server, ApiVersion::Cloud);
    let created = zephyr
        .cloud()
        .unwrap()
        .test_cases()
        .create_test_case("PRJ", "Login works", Some(json!({"statusName": "Draft"})))
        .await
        .unwrap();
    assert_eq!(created["key"], "PRJ-T3");
}

#[tokio::test]
async fn test_cloud_automation_upload_and_zip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/automations/executions/junit"))
        .and(query_param("projectKey", "PRJ"))
        .and(query_param("autoCreateTestCases", "true"))
        .and(body_string_contains("name=\"testCycle\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"testCycle": {"key": "PRJ-R7"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/automations/testcases"))
        .and(query_param("projectKey", "PRJ"))
        .and(header("Accept", "application/zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK-feature-files".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let report = temp_path("junit.zip");
    std::fs::write(&report, b"<testsuite/>").unwrap();

    let zephyr = create_scale_client(&server, ApiVersion::Cloud);
    let automations = zephyr.cloud().unwrap().automations();
    let options = ReportOptions {
        auto_create: true,
        test_cycle: Some(json!({"name": "CI run"})),
    };
    let result = automations
        .post_junit_xml_format("PRJ", &report, options)
        .await
        .unwrap();
    assert_eq!(result["testCycle"]["key"], "PRJ-R7");

    let archive = automations.get_testcases_zip("PRJ").await.unwrap();
    assert_eq!(archive.bytes().await.unwrap().as_ref(), b"PK-feature-files");

    std::fs::remove_file(&report).ok();
}

#[tokio::test]
async fn test_server_search_and_delete() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/testcase/search"))
        .and(query_param("query", "projectKey = \"PRJ\""))
        .and(query_param("maxResults", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"key": "PRJ-T1"}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/testcase/PRJ-T1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let zephyr = create_scale_client(&server, ApiVersion::Server);
    let cases = zephyr.server().unwrap().test_cases();

    let mut params = QueryParams::new();
    params.insert("maxResults".to_string(), "5".to_string());
    let found = cases.search_cases("projectKey = \"PRJ\"", &params).await.unwrap();
    assert_eq!(found[0]["key"], "PRJ-T1");

    assert_eq!(cases.delete_test_case("PRJ-T1").await.unwrap(), json!(""));
}

#[tokio::test]
async fn test_squad_tests_by_label() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/zapi/latest/test/summary/testsbylabel"))
        .and(query_param("projectId", "10000"))
        .and(query_param("labelName", "smoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"name": "No Label"}, {"name": "smoke"}, {"name": "smoke-ui"}],
            "totalCount": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let squad = create_squad_client(&server);
    let labels = squad
        .tests()
        .fetch_tests_by_label("10000", "smoke", QueryParams::new())
        .collect_all()
        .await
        .unwrap();

    assert_eq!(labels, vec![json!({"name": "smoke"}), json!({"name": "smoke-ui"})]);
}

#[tokio::test]
async fn test_squad_execution_search_wraps_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/zapi/latest/zql/executeSearch"))
        .and(query_param("zqlQuery", "(project = 'PRJ')"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "executions": [{"id": 11}],
            "maxResultAllowed": 20,
            "currentIndex": 1,
            "linksNew": [1],
            "totalCount": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let squad = create_squad_client(&server);
    let executions = squad
        .execution_search()
        .execute_search("project = 'PRJ'", QueryParams::new())
        .collect_all()
        .await
        .unwrap();

    assert_eq!(executions, vec![json!({"id": 11})]);
}

#[tokio::test]
async fn test_squad_create_test_case_merges_required_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/zapi/latest/util/zephyrTestIssueType"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"testcaseIssueTypeId": "10100"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/latest/issue"))
        .and(body_json(json!({
            "fields": {
                "project": {"id": "10000"},
                "issuetype": {"id": "10100"},
                "summary": "Checkout",
                "labels": ["smoke"]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"key": "PRJ-42"})))
        .expect(1)
        .mount(&server)
        .await;

    let squad = create_squad_client(&server);
    let data = json!({"fields": {"labels": ["smoke"], "summary": "ignored"}});
    let created = squad
        .test_cases()
        .create_test_case("10000", "Checkout", &data)
        .await
        .unwrap();
    assert_eq!(created["key"], "PRJ-42");
}

#[tokio::test]
async fn test_squad_attachments() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/zapi/latest/attachment"))
        .and(query_param("entityId", "77"))
        .and(query_param("entityType", "execution"))
        .and(body_string_contains("name=\"file\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/zapi/latest/attachment/5/file"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"screenshot".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let upload = temp_path("screen.png");
    std::fs::write(&upload, b"png").unwrap();
    let download = temp_path("downloaded.png");

    let squad = create_squad_client(&server);
    let attachments = squad.attachments();
    let uploaded = attachments
        .add_attachment_into_entity(&upload, "77", AttachmentEntity::Execution)
        .await
        .unwrap();
    assert_eq!(uploaded["success"], "ok");

    let content = attachments
        .get_attachment_file("5", Some(download.as_path()))
        .await
        .unwrap();
    assert_eq!(content.as_ref(), b"screenshot");
    assert_eq!(std::fs::read(&download).unwrap(), b"screenshot");

    std::fs::remove_file(&upload).ok();
    std::fs::remove_file(&download).ok();
}
