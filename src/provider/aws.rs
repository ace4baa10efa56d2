//! Shared AWS SDK configuration.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::Region;

/// Load SDK configuration from the default credential chain.
///
/// `region` and `profile` override whatever the environment resolves.
pub async fn load_sdk_config(region: Option<&str>, profile: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region_str) = region {
        loader = loader.region(Region::new(region_str.to_string()));
    }
    if let Some(profile_name) = profile {
        loader = loader.profile_name(profile_name);
    }

    loader.load().await
}

/// Copy of `config` pointed at `region`
pub fn with_region(config: &SdkConfig, region: Option<&str>) -> SdkConfig {
    match region {
        Some(region_str) => config
            .to_builder()
            .region(Region::new(region_str.to_string()))
            .build(),
        None => config.clone(),
    }
}

/// Render an SDK error with its full source chain
pub fn describe_error<E>(err: &E) -> String
where
    E: std::error::Error,
{
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
