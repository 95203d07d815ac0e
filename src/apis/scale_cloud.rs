//! Zephyr Scale Cloud (API v2) endpoint groups.
//!
//! See <https://support.smartbear.com/zephyr-scale-cloud/api-docs/>.

use crate::{
    error::ZephyrResult,
    models::ReportOptions,
    pagination::{PaginationMode, Paginator},
    session::{accept_zip, QueryParams, ZephyrSession},
    utils::extend_object,
};
use log::{debug, info};
use reqwest::Response;
use serde_json::{json, Value};
use std::path::Path;

const HEALTHCHECK: &str = "healthcheck";
const CASES: &str = "testcases";
const AUTOMATION_TESTCASES: &str = "automations/testcases";
const AUTOMATION_CUSTOM: &str = "automations/executions/custom";
const AUTOMATION_CUCUMBER: &str = "automations/executions/cucumber";
const AUTOMATION_JUNIT: &str = "automations/executions/junit";

/// Healthcheck API operations
pub struct HealthcheckApi<'a> {
    session: &'a ZephyrSession,
}

impl<'a> HealthcheckApi<'a> {
    pub fn new(session: &'a ZephyrSession) -> Self {
        Self { session }
    }

    /// Check the health of the API
    pub async fn get_health(&self) -> ZephyrResult<Value> {
        self.session.get(HEALTHCHECK, &QueryParams::new()).await
    }
}

/// Test case API operations
pub struct TestCaseApi<'a> {
    session: &'a ZephyrSession,
}

impl<'a> TestCaseApi<'a> {
    pub fn new(session: &'a ZephyrSession) -> Self {
        Self { session }
    }

    /// Walk all test cases matching the filters
    ///
    /// # Arguments
    /// * `params` - `projectKey`, `folderId`, `maxResults`, `startAt`
    pub fn get_test_cases(&self, params: QueryParams) -> Paginator<'a> {
        self.session
            .fetch_paginated(CASES, PaginationMode::CursorUrl, params)
    }

    /// Get a test case by key
    pub async fn get_test_case(&self, test_case_key: &str) -> ZephyrResult<Value> {
        let path = format!("{}/{}", CASES, urlencoding::encode(test_case_key));
        self.session.get(&path, &QueryParams::new()).await
    }

    /// Create a test case
    ///
    /// # Arguments
    /// * `project_key` - Jira project key
    /// * `name` - Test case name
    /// * `fields` - Optional object with extra fields (`objective`, `statusName`, ...)
    pub async fn create_test_case(
        &self,
        project_key: &str,
        name: &str,
        fields: Option<Value>,
    ) -> ZephyrResult<Value> {
        info!("Creating test case {} in {}", name, project_key);
        let mut body = json!({"projectKey": project_key, "name": name});
        extend_object(&mut body, fields);
        self.session.post(CASES, Some(body)).await
    }
}

/// Automation API operations
pub struct AutomationApi<'a> {
    session: &'a ZephyrSession,
}

impl<'a> AutomationApi<'a> {
    pub fn new(session: &'a ZephyrSession) -> Self {
        Self { session }
    }

    /// Upload results in Zephyr Scale's custom format
    ///
    /// # Arguments
    /// * `project_key` - Jira project key
    /// * `file_path` - `.zip` archive with report files
    /// * `options` - Test case auto-creation and test cycle description
    pub async fn post_custom_format(
        &self,
        project_key: &str,
        file_path: impl AsRef<Path>,
        options: ReportOptions,
    ) -> ZephyrResult<Value> {
        self.post_report(AUTOMATION_CUSTOM, project_key, file_path.as_ref(), options)
            .await
    }

    /// Upload results in the Cucumber format
    pub async fn post_cucumber_format(
        &self,
        project_key: &str,
        file_path: impl AsRef<Path>,
        options: ReportOptions,
    ) -> ZephyrResult<Value> {
        self.post_report(AUTOMATION_CUCUMBER, project_key, file_path.as_ref(), options)
            .await
    }

    /// Upload results in the JUnit XML format
    pub async fn post_junit_xml_format(
        &self,
        project_key: &str,
        file_path: impl AsRef<Path>,
        options: ReportOptions,
    ) -> ZephyrResult<Value> {
        self.post_report(AUTOMATION_JUNIT, project_key, file_path.as_ref(), options)
            .await
    }

    /// Download a zip of Cucumber feature files for the project
    pub async fn get_testcases_zip(&self, project_key: &str) -> ZephyrResult<Response> {
        let mut params = QueryParams::new();
        params.insert("projectKey".to_string(), project_key.to_string());
        self.session
            .get_raw(AUTOMATION_TESTCASES, &params, accept_zip())
            .await
    }

    async fn post_report(
        &self,
        path: &str,
        project_key: &str,
        file_path: &Path,
        options: ReportOptions,
    ) -> ZephyrResult<Value> {
        let mut params = QueryParams::new();
        params.insert("projectKey".to_string(), project_key.to_string());
        if options.auto_create {
            params.insert("autoCreateTestCases".to_string(), "true".to_string());
        }

        let extra_parts = options
            .test_cycle
            .map(|cycle| vec![("testCycle".to_string(), cycle)])
            .unwrap_or_default();
        debug!("Posting report to {} with params {:?}", path, params);

        self.session
            .post_file(path, file_path, extra_parts, params)
            .await
    }
}
