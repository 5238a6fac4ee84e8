use serde::{Deserialize, Serialize};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// STS session name used when assuming a role without an explicit name.
pub const DEFAULT_SESSION_NAME: &str = "spill-dispatcher";

/// Connection settings shared by the SQS and S3 collaborators.
///
/// Loaded from the `[aws]` table of the dispatcher config file:
///
/// ```toml
/// [aws]
/// region = "eu-west-1"
/// endpoint_url = "http://localhost:4566"
/// role_arn = "arn:aws:iam::123456789012:role/spill"
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct AwsBaseConfig {
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,

    /// IAM role to assume via STS before talking to SQS and S3.
    #[serde(default)]
    pub role_arn: Option<String>,

    /// Endpoint override, e.g. `LocalStack`.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// STS session name (defaults to [`DEFAULT_SESSION_NAME`]).
    #[serde(default)]
    pub session_name: Option<String>,

    /// External ID required by the role's trust policy.
    #[serde(default)]
    pub external_id: Option<String>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_owned()
}

impl std::fmt::Debug for AwsBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsBaseConfig")
            .field("region", &self.region)
            .field("role_arn", &self.role_arn.as_ref().map(|_| "[REDACTED]"))
            .field("endpoint_url", &self.endpoint_url)
            .field("session_name", &self.session_name)
            .field(
                "external_id",
                &self.external_id.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl AwsBaseConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.role_arn = Some(role_arn.into());
        self
    }

    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    #[must_use]
    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = Some(session_name.into());
        self
    }

    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// The STS session name to use when assuming `role_arn`.
    pub fn session_name_or_default(&self) -> &str {
        self.session_name.as_deref().unwrap_or(DEFAULT_SESSION_NAME)
    }
}

impl Default for AwsBaseConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            role_arn: None,
            endpoint_url: None,
            session_name: None,
            external_id: None,
        }
    }
}
