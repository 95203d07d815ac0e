pub mod scale_cloud;
pub mod scale_server;
pub mod squad;

// Re-export all APIs
pub use scale_cloud::{AutomationApi, HealthcheckApi, TestCaseApi as CloudTestCaseApi};
pub use scale_server::TestCaseApi as ServerTestCaseApi;
pub use squad::{AttachmentApi, ExecutionSearchApi, SquadTestCaseApi, TestApi};
