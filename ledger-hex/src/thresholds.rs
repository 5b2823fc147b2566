//! Threshold guard: limit evaluation and profile administration.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use ledger_types::{
    AccountDirectory, AccountType, AppError, GroupId, IdGenerator, LedgerRepository, Money,
    OwnerId, Role, ThresholdCheck, ThresholdLimits, ThresholdProfile, ThresholdProfileId,
    Window, WindowAllowance, prefix,
};

/// Evaluates proposed amounts against a party's configured limits.
///
/// Read-only with respect to the ledger: it aggregates SUCCESS transfers but
/// never writes transfer or wallet state.
pub struct ThresholdGuard<R: LedgerRepository> {
    repo: Arc<R>,
    directory: Arc<dyn AccountDirectory>,
    ids: Arc<dyn IdGenerator>,
}

impl<R: LedgerRepository> ThresholdGuard<R> {
    pub fn new(
        repo: Arc<R>,
        directory: Arc<dyn AccountDirectory>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            repo,
            directory,
            ids,
        }
    }

    /// Checks `amount` against every window at the current time.
    pub async fn validate(
        &self,
        owner: &OwnerId,
        amount: Money,
        role: Role,
        group: &GroupId,
    ) -> Result<ThresholdCheck, AppError> {
        self.validate_at(owner, amount, role, group, Utc::now())
            .await
    }

    /// Checks `amount` against every window containing `now`.
    ///
    /// All windows are evaluated and every violation is reported.
    #[tracing::instrument(skip(self, now), fields(owner = %owner, role = role.as_str(), amount = amount.minor()))]
    pub async fn validate_at(
        &self,
        owner: &OwnerId,
        amount: Money,
        role: Role,
        group: &GroupId,
        now: DateTime<Utc>,
    ) -> Result<ThresholdCheck, AppError> {
        let limits = self.limits_for(owner, group).await?;

        let mut violations = Vec::new();
        for window in Window::ALL {
            let (start, end) = window.bounds(now);
            let usage = self.repo.usage(owner, role, start, end).await?;
            violations.extend(limits.check(role, window, amount, usage));
        }

        let check = ThresholdCheck::from_violations(violations);
        if !check.valid {
            tracing::warn!(violations = check.violations.len(), "Threshold check failed");
        }
        Ok(check)
    }

    /// Used and remaining allowance per window.
    pub async fn remaining(
        &self,
        owner: &OwnerId,
        role: Role,
        group: &GroupId,
    ) -> Result<Vec<WindowAllowance>, AppError> {
        let limits = self.limits_for(owner, group).await?;
        let now = Utc::now();

        let mut allowances = Vec::with_capacity(Window::ALL.len());
        for window in Window::ALL {
            let (start, end) = window.bounds(now);
            let usage = self.repo.usage(owner, role, start, end).await?;
            allowances.push(limits.allowance(role, window, usage));
        }
        Ok(allowances)
    }

    // owner -> account -> profile id -> ACTIVE profile -> limits of the group
    async fn limits_for(
        &self,
        owner: &OwnerId,
        group: &GroupId,
    ) -> Result<ThresholdLimits, AppError> {
        let account = self
            .directory
            .get_account(owner)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {}", owner)))?;

        let profile_id = account.threshold_profile_id.ok_or_else(|| {
            AppError::NotFound(format!("No threshold profile assigned to {}", owner))
        })?;

        let profile = self
            .repo
            .get_profile(&profile_id)
            .await?
            .filter(ThresholdProfile::is_active)
            .ok_or_else(|| AppError::NotFound(format!("Active threshold profile {}", profile_id)))?;

        self.repo
            .get_limits(&profile.id, group)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Limits for profile {} and group {}",
                    profile.id, group
                ))
            })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profile administration
    // ─────────────────────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self))]
    pub async fn create_profile(
        &self,
        name: String,
        owner_type: AccountType,
    ) -> Result<ThresholdProfile, AppError> {
        let id = ThresholdProfileId::new(self.ids.new_id(prefix::PROFILE));
        let profile = ThresholdProfile::new(id, name, owner_type)?;
        self.repo.insert_profile(&profile).await?;

        tracing::info!(profile_id = %profile.id, "Threshold profile created");
        Ok(profile)
    }

    /// Inserts or replaces the daily caps of one (profile, group).
    #[tracing::instrument(skip(self, limits), fields(profile = %limits.profile_id, group = %limits.group_id))]
    pub async fn set_limits(&self, limits: ThresholdLimits) -> Result<ThresholdLimits, AppError> {
        self.repo.upsert_limits(&limits).await.map_err(|e| match e {
            ledger_types::RepoError::NotFound => {
                AppError::NotFound(format!("Threshold profile {}", limits.profile_id))
            }
            other => other.into(),
        })?;
        Ok(limits)
    }
}
