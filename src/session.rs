//! Credential/session establishment.
//!
//! Thin factory over the aws-config default chain. An explicit profile wins;
//! otherwise aws-config itself honors `AWS_PROFILE` and then the ambient
//! default credentials (env keys, shared config, SSO, IMDS). No role
//! assumption or privilege elevation is ever requested.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_types::region::Region;
use tracing::debug;

/// Load an SDK config for the run.
pub async fn make_session(region: &str, profile: Option<&str>) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
    if let Some(profile) = profile {
        debug!("Using named credential profile '{}'", profile);
        loader = loader.profile_name(profile);
    }
    loader.load().await
}
