use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cursor page of the Scale Cloud API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage {
    pub values: Option<Vec<Value>>,
    #[serde(rename = "isLast")]
    pub is_last: Option<bool>,
    pub next: Option<String>,
}

/// Squad "tests by label" summary page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelPage {
    pub values: Option<Vec<Value>>,
    #[serde(rename = "totalCount")]
    pub total_count: Option<u64>,
}

/// Squad ZQL execution search page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPage {
    pub executions: Option<Vec<Value>>,
    #[serde(rename = "maxResultAllowed")]
    pub max_result_allowed: Option<u64>,
    #[serde(rename = "currentIndex")]
    pub current_index: Option<i64>,
    #[serde(rename = "linksNew")]
    pub links_new: Option<Vec<i64>>,
    #[serde(rename = "totalCount")]
    pub total_count: Option<u64>,
}

/// Options for posting automation result archives
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Create test cases that don't exist yet
    pub auto_create: bool,
    /// Description of the test cycle to create, sent as the `testCycle` part
    pub test_cycle: Option<Value>,
}

/// Entity an attachment belongs to in Zephyr Squad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentEntity {
    Execution,
    StepResult,
}

impl AttachmentEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Execution => "execution",
            Self::StepResult => "stepresult",
        }
    }
}
