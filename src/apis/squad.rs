//! Zephyr Squad Server endpoint groups.
//!
//! Paths are relative to the Jira root, e.g. `https://jira.example.com/`.

use crate::{
    error::{ZephyrError, ZephyrResult},
    models::AttachmentEntity,
    pagination::{PaginationMode, Paginator},
    session::{QueryParams, ZephyrSession},
    utils::merge_json,
};
use bytes::Bytes;
use log::{debug, info};
use serde_json::{json, Value};
use std::path::Path;

const JIRA_API: &str = "rest/api/latest";
const ZEPHYR_API: &str = "rest/zapi/latest";

fn zapi(path: &str) -> String {
    format!("{}/{}", ZEPHYR_API, path)
}

/// Test summary API operations
pub struct TestApi<'a> {
    session: &'a ZephyrSession,
}

impl<'a> TestApi<'a> {
    pub fn new(session: &'a ZephyrSession) -> Self {
        Self { session }
    }

    /// Walk the tests grouped by label.
    ///
    /// `label_name` matches as a substring. Tests without any label come back
    /// in a "No Label" entry, which is only yielded when it is the sole entry
    /// of its page.
    pub fn fetch_tests_by_label(
        &self,
        project_id: &str,
        label_name: &str,
        params: QueryParams,
    ) -> Paginator<'a> {
        let mut params = params;
        params.insert("projectId".to_string(), project_id.to_string());
        params.insert("labelName".to_string(), label_name.to_string());
        self.session.fetch_paginated(
            zapi("test/summary/testsbylabel"),
            PaginationMode::TestLabel,
            params,
        )
    }
}

/// ZQL execution search API operations
pub struct ExecutionSearchApi<'a> {
    session: &'a ZephyrSession,
}

impl<'a> ExecutionSearchApi<'a> {
    pub fn new(session: &'a ZephyrSession) -> Self {
        Self { session }
    }

    /// Walk the executions matching a ZQL query
    ///
    /// # Arguments
    /// * `query` - ZQL expression, sent wrapped in parentheses
    /// * `params` - Extra parameters (`maxRecords`, `offset`, `expand`)
    pub fn execute_search(&self, query: &str, params: QueryParams) -> Paginator<'a> {
        let mut params = params;
        params.insert("zqlQuery".to_string(), format!("({})", query));
        self.session.fetch_paginated(
            zapi("zql/executeSearch"),
            PaginationMode::Execution,
            params,
        )
    }
}

/// Attachment API operations
pub struct AttachmentApi<'a> {
    session: &'a ZephyrSession,
}

impl<'a> AttachmentApi<'a> {
    pub fn new(session: &'a ZephyrSession) -> Self {
        Self { session }
    }

    /// Attach a local file to an execution or step result
    pub async fn add_attachment_into_entity(
        &self,
        file_path: impl AsRef<Path>,
        entity_id: &str,
        entity_type: AttachmentEntity,
    ) -> ZephyrResult<Value> {
        self.session
            .post_file(
                &zapi("attachment"),
                file_path,
                Vec::new(),
                entity_params(entity_id, entity_type),
            )
            .await
    }

    /// List attachments of an execution or step result
    pub async fn get_attachment_by_entity(
        &self,
        entity_id: &str,
        entity_type: AttachmentEntity,
    ) -> ZephyrResult<Value> {
        self.session
            .get(
                &zapi("attachment/attachmentsByEntity"),
                &entity_params(entity_id, entity_type),
            )
            .await
    }

    /// Download an attachment, optionally saving it to `save_to`
    pub async fn get_attachment_file(
        &self,
        attach_file_id: &str,
        save_to: Option<&Path>,
    ) -> ZephyrResult<Bytes> {
        let path = zapi(&format!("attachment/{}/file", urlencoding::encode(attach_file_id)));
        let response = self
            .session
            .get_raw(&path, &QueryParams::new(), Default::default())
            .await?;
        let content = response.bytes().await?;

        if let Some(target) = save_to {
            debug!("Saving attachment {} to {}", attach_file_id, target.display());
            tokio::fs::write(target, &content).await?;
        }
        Ok(content)
    }
}

fn entity_params(entity_id: &str, entity_type: AttachmentEntity) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("entityId".to_string(), entity_id.to_string());
    params.insert("entityType".to_string(), entity_type.as_str().to_string());
    params
}

/// Test case actions built on the Jira issue API
pub struct SquadTestCaseApi<'a> {
    session: &'a ZephyrSession,
}

impl<'a> SquadTestCaseApi<'a> {
    pub fn new(session: &'a ZephyrSession) -> Self {
        Self { session }
    }

    /// Issue type id Zephyr uses for tests
    pub async fn get_zephyr_issue_type(&self) -> ZephyrResult<String> {
        let body = self
            .session
            .get(&zapi("util/zephyrTestIssueType"), &QueryParams::new())
            .await?;
        match body.get("testcaseIssueTypeId") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(ZephyrError::protocol(
                "zephyrTestIssueType response has no testcaseIssueTypeId",
            )),
        }
    }

    /// Create a test issue.
    ///
    /// `data` may carry any Jira issue fields; project, issue type and summary
    /// always take the given values.
    pub async fn create_test_case(
        &self,
        project_id: &str,
        summary: &str,
        data: &Value,
    ) -> ZephyrResult<Value> {
        info!("Creating test case {:?} in project {}", summary, project_id);
        let case_type = self.get_zephyr_issue_type().await?;
        let required = json!({
            "fields": {
                "project": {"id": project_id},
                "issuetype": {"id": case_type},
                "summary": summary,
            }
        });
        let body = merge_json(data, &required);
        self.session
            .post(&format!("{}/issue", JIRA_API), Some(body))
            .await
    }

    /// Retrieve the test issue matching the given key
    pub async fn get_test_case(&self, test_case_key: &str, params: &QueryParams) -> ZephyrResult<Value> {
        let path = format!("{}/issue/{}", JIRA_API, urlencoding::encode(test_case_key));
        self.session.get(&path, params).await
    }
}
