//! Zephyr Scale Server (API v1) endpoint groups.
//!
//! The base URL is expected to point at `<jira>/rest/atm/1.0/`.

use crate::{
    error::ZephyrResult,
    session::{QueryParams, ZephyrSession},
    utils::extend_object,
};
use log::info;
use serde_json::{json, Value};
use std::path::Path;

const CASE: &str = "testcase";
const CASE_SEARCH: &str = "testcase/search";

fn case_path(test_case_key: &str) -> String {
    format!("{}/{}", CASE, urlencoding::encode(test_case_key))
}

/// Test case API operations
pub struct TestCaseApi<'a> {
    session: &'a ZephyrSession,
}

impl<'a> TestCaseApi<'a> {
    pub fn new(session: &'a ZephyrSession) -> Self {
        Self { session }
    }

    /// Create a new test case
    pub async fn create_test_case(
        &self,
        project_key: &str,
        name: &str,
        fields: Option<Value>,
    ) -> ZephyrResult<Value> {
        info!("Creating test case {} in {}", name, project_key);
        let mut body = json!({"projectKey": project_key, "name": name});
        extend_object(&mut body, fields);
        self.session.post(CASE, Some(body)).await
    }

    /// Retrieve the test case matching the given key
    ///
    /// # Arguments
    /// * `test_case_key` - Test case key, e.g. `PRJ-T1`
    /// * `params` - Extra query parameters such as `fields`
    pub async fn get_test_case(&self, test_case_key: &str, params: &QueryParams) -> ZephyrResult<Value> {
        self.session.get(&case_path(test_case_key), params).await
    }

    pub async fn delete_test_case(&self, test_case_key: &str) -> ZephyrResult<Value> {
        info!("Deleting test case {}", test_case_key);
        self.session.delete(&case_path(test_case_key)).await
    }

    /// Retrieve the test cases matching a TQL query
    pub async fn search_cases(&self, query: &str, params: &QueryParams) -> ZephyrResult<Value> {
        let mut params = params.clone();
        params.insert("query".to_string(), query.to_string());
        self.session.get(CASE_SEARCH, &params).await
    }

    /// Attach a local file to a test case
    pub async fn create_attachment(
        &self,
        test_case_key: &str,
        file_path: impl AsRef<Path>,
    ) -> ZephyrResult<Value> {
        let path = format!("{}/attachments", case_path(test_case_key));
        self.session
            .post_file(&path, file_path, Vec::new(), QueryParams::new())
            .await
    }
}
