//! Threshold configuration port.

use crate::domain::{GroupId, ThresholdLimits, ThresholdProfile, ThresholdProfileId};
use crate::error::RepoError;

#[async_trait::async_trait]
pub trait ThresholdRepository: Send + Sync + 'static {
    async fn insert_profile(&self, profile: &ThresholdProfile) -> Result<(), RepoError>;

    async fn get_profile(
        &self,
        id: &ThresholdProfileId,
    ) -> Result<Option<ThresholdProfile>, RepoError>;

    /// Inserts or replaces the limits of one (profile, group).
    async fn upsert_limits(&self, limits: &ThresholdLimits) -> Result<(), RepoError>;

    async fn get_limits(
        &self,
        profile: &ThresholdProfileId,
        group: &GroupId,
    ) -> Result<Option<ThresholdLimits>, RepoError>;
}
