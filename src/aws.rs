//! AWS-related code shared by the Textract and Bedrock clients.

use aws_config::BehaviorVersion;

use crate::prelude::*;

/// Load the user's AWS configuration using standard conventions.
///
/// This is called once per client, and the resulting client is handed to
/// whoever needs it.
pub async fn load_aws_config() -> Result<aws_config::SdkConfig> {
    let config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
    debug!(region = ?config.region(), "Loaded AWS config");
    Ok(config)
}
