use aws_config::{ConfigLoader, Region, SdkConfig};
use tracing::{debug, info};

use crate::config::AwsBaseConfig;

/// Build the shared SDK configuration for the SQS and S3 clients.
///
/// Credentials come from the standard environment chain. When `role_arn` is
/// set, that role is assumed through STS with credentials refreshed by the
/// SDK before they expire.
///
/// ```no_run
/// use spill_aws::auth::build_sdk_config;
/// use spill_aws::config::AwsBaseConfig;
///
/// # async fn example() {
/// let config = AwsBaseConfig::new("us-east-1").with_endpoint_url("http://localhost:4566");
/// let sdk_config = build_sdk_config(&config).await;
/// # }
/// ```
pub async fn build_sdk_config(config: &AwsBaseConfig) -> SdkConfig {
    let base = loader(config).load().await;

    let Some(role_arn) = &config.role_arn else {
        return base;
    };

    let session_name = config.session_name_or_default();
    info!(role_arn = %role_arn, session_name = %session_name, "assuming IAM role via STS");

    let mut provider = aws_config::sts::AssumeRoleProvider::builder(role_arn)
        .session_name(session_name)
        .region(Region::new(config.region.clone()));
    if let Some(external_id) = &config.external_id {
        provider = provider.external_id(external_id);
    }
    let provider = provider.configure(&base).build().await;

    loader(config).credentials_provider(provider).load().await
}

fn loader(config: &AwsBaseConfig) -> ConfigLoader {
    let loader = aws_config::from_env().region(Region::new(config.region.clone()));
    match &config.endpoint_url {
        Some(endpoint) => {
            debug!(endpoint = %endpoint, "using custom AWS endpoint");
            loader.endpoint_url(endpoint)
        }
        None => loader,
    }
}
