use crate::{
    apis::{
        AttachmentApi, AutomationApi, CloudTestCaseApi, ExecutionSearchApi, HealthcheckApi,
        ServerTestCaseApi, SquadTestCaseApi, TestApi,
    },
    config::SessionConfig,
    error::{ZephyrError, ZephyrResult},
    session::ZephyrSession,
};
use std::fmt;
use std::str::FromStr;

/// Default Zephyr Scale Cloud endpoint
pub const SCALE_CLOUD_BASE_URL: &str = "https://api.zephyrscale.smartbear.com/v2/";

/// Placeholder Jira root used by Zephyr Squad when no base URL is given
pub const SQUAD_DEFAULT_BASE_URL: &str = "https://jira.hosted.com/";

/// Zephyr Scale API flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    /// `v2`, Zephyr Scale Cloud (token auth only)
    #[default]
    Cloud,
    /// `v1`, Zephyr Scale Server / Data Center (any Jira auth)
    Server,
}

impl FromStr for ApiVersion {
    type Err = ZephyrError;

    fn from_str(version: &str) -> Result<Self, Self::Err> {
        match version.to_ascii_lowercase().as_str() {
            "v2" => Ok(Self::Cloud),
            "v1" => Ok(Self::Server),
            _ => Err(ZephyrError::config(
                "API version should be either 'v1' (Server) or 'v2' (Cloud)",
            )),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloud => f.write_str("v2"),
            Self::Server => f.write_str("v1"),
        }
    }
}

/// Zephyr Scale client
#[derive(Debug, Clone)]
pub struct ZephyrScale {
    session: ZephyrSession,
    version: ApiVersion,
}

impl ZephyrScale {
    /// Create a client; an empty base URL falls back to the Cloud endpoint
    pub fn new(mut config: SessionConfig, version: ApiVersion) -> ZephyrResult<Self> {
        if config.base_url.is_empty() {
            config.base_url = SCALE_CLOUD_BASE_URL.to_string();
        }
        Ok(Self {
            session: ZephyrSession::new(config)?,
            version,
        })
    }

    /// Create a Zephyr Scale Server client
    pub fn server_api(config: SessionConfig) -> ZephyrResult<Self> {
        Self::new(config, ApiVersion::Server)
    }

    /// Wrap an already opened session
    pub fn with_session(session: ZephyrSession, version: ApiVersion) -> Self {
        Self { session, version }
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// Get the underlying session for raw calls
    pub fn session(&self) -> &ZephyrSession {
        &self.session
    }

    /// Get the Cloud endpoint groups
    pub fn cloud(&self) -> ZephyrResult<CloudApi<'_>> {
        match self.version {
            ApiVersion::Cloud => Ok(CloudApi {
                session: &self.session,
            }),
            ApiVersion::Server => Err(ZephyrError::config("client was built for the Server API (v1)")),
        }
    }

    /// Get the Server endpoint groups
    pub fn server(&self) -> ZephyrResult<ServerApi<'_>> {
        match self.version {
            ApiVersion::Server => Ok(ServerApi {
                session: &self.session,
            }),
            ApiVersion::Cloud => Err(ZephyrError::config("client was built for the Cloud API (v2)")),
        }
    }
}

/// Zephyr Scale Cloud endpoint groups
pub struct CloudApi<'a> {
    session: &'a ZephyrSession,
}

impl<'a> CloudApi<'a> {
    pub fn healthcheck(&self) -> HealthcheckApi<'a> {
        HealthcheckApi::new(self.session)
    }

    pub fn test_cases(&self) -> CloudTestCaseApi<'a> {
        CloudTestCaseApi::new(self.session)
    }

    pub fn automations(&self) -> AutomationApi<'a> {
        AutomationApi::new(self.session)
    }
}

/// Zephyr Scale Server endpoint groups
pub struct ServerApi<'a> {
    session: &'a ZephyrSession,
}

impl<'a> ServerApi<'a> {
    pub fn test_cases(&self) -> ServerTestCaseApi<'a> {
        ServerTestCaseApi::new(self.session)
    }
}

/// Zephyr Squad Server client
#[derive(Debug, Clone)]
pub struct ZephyrSquad {
    session: ZephyrSession,
}

impl ZephyrSquad {
    /// Create a client; an empty base URL falls back to [`SQUAD_DEFAULT_BASE_URL`]
    pub fn new(mut config: SessionConfig) -> ZephyrResult<Self> {
        if config.base_url.is_empty() {
            config.base_url = SQUAD_DEFAULT_BASE_URL.to_string();
        }
        Ok(Self {
            session: ZephyrSession::new(config)?,
        })
    }

    pub fn with_session(session: ZephyrSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &ZephyrSession {
        &self.session
    }

    pub fn tests(&self) -> TestApi<'_> {
        TestApi::new(&self.session)
    }

    pub fn execution_search(&self) -> ExecutionSearchApi<'_> {
        ExecutionSearchApi::new(&self.session)
    }

    pub fn attachments(&self) -> AttachmentApi<'_> {
        AttachmentApi::new(&self.session)
    }

    /// Higher level actions on test issues
    pub fn test_cases(&self) -> SquadTestCaseApi<'_> {
        SquadTestCaseApi::new(&self.session)
    }
}
