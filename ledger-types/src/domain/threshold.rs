//! Threshold profiles, limits and rolling-window evaluation.
//!
//! A profile carries one limit set per group. Limits are configured as daily
//! caps; weekly and monthly caps are derived as `daily × 7` and `daily × 30`
//! for both counts and amounts. All windows are calendar windows in UTC.

use chrono::{DateTime, Datelike, Days, Months, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::account::{AccountStatus, AccountType};
use super::id::{GroupId, ThresholdProfileId};
use super::money::Money;
use crate::error::DomainError;

/// Calendar window over which transfer history is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Window {
    Daily,
    Weekly,
    Monthly,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::Daily, Window::Weekly, Window::Monthly];

    /// Factor applied to the daily cap.
    pub fn multiplier(self) -> i64 {
        match self {
            Window::Daily => 1,
            Window::Weekly => 7,
            Window::Monthly => 30,
        }
    }

    /// Half-open `[start, end)` bounds of the window containing `now`.
    ///
    /// Weeks start on Monday.
    pub fn bounds(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.date_naive();
        let (start, end) = match self {
            Window::Daily => (today, today.checked_add_days(Days::new(1))),
            Window::Weekly => {
                let back = u64::from(today.weekday().num_days_from_monday());
                let monday = today.checked_sub_days(Days::new(back)).unwrap_or(today);
                (monday, monday.checked_add_days(Days::new(7)))
            }
            Window::Monthly => {
                let first = today.with_day(1).unwrap_or(today);
                (first, first.checked_add_months(Months::new(1)))
            }
        };

        let start = start.and_time(NaiveTime::MIN).and_utc();
        let end = end
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (start, end)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Daily => "DAILY",
            Window::Weekly => "WEEKLY",
            Window::Monthly => "MONTHLY",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Window::Daily => "Daily",
            Window::Weekly => "Weekly",
            Window::Monthly => "Monthly",
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of the transfer a party is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Payer,
    Payee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Payer => "PAYER",
            Role::Payee => "PAYEE",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PAYER" => Ok(Role::Payer),
            "PAYEE" => Ok(Role::Payee),
            other => Err(DomainError::ValidationError(format!(
                "unknown role: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// The single requested amount exceeds the window's amount cap.
    Amount,
    /// The number of transfers already in the window has reached the cap.
    Count,
    /// Window total plus the requested amount would exceed the amount cap.
    Cumulative,
}

/// One failed threshold check.
///
/// `limit` and `current` are transfer counts for [`ViolationKind::Count`] and
/// minor units otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub window: Window,
    pub kind: ViolationKind,
    pub limit: i64,
    pub current: i64,
    pub message: String,
}

/// Outcome of evaluating one party against its limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdCheck {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ThresholdCheck {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }
}

/// Count and sum of a party's SUCCESS transfers inside one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowUsage {
    pub count: i64,
    pub amount: Money,
}

/// Count and amount caps for one (role, window).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caps {
    pub count: i64,
    pub amount: Money,
}

/// Used and remaining allowance for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAllowance {
    pub window: Window,
    pub caps: Caps,
    pub used: WindowUsage,
    pub remaining_count: i64,
    pub remaining_amount: Money,
}

/// A named bundle of limit sets for one owner category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdProfile {
    pub id: ThresholdProfileId,
    pub name: String,
    pub owner_type: AccountType,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl ThresholdProfile {
    pub fn new(
        id: ThresholdProfileId,
        name: String,
        owner_type: AccountType,
    ) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Profile name cannot be empty".into(),
            ));
        }

        Ok(Self {
            id,
            name,
            owner_type,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Daily caps of one (profile, group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdLimits {
    pub profile_id: ThresholdProfileId,
    pub group_id: GroupId,
    pub payer_count: i64,
    pub payer_amount: Money,
    pub payee_count: i64,
    pub payee_amount: Money,
}

impl ThresholdLimits {
    pub fn new(
        profile_id: ThresholdProfileId,
        group_id: GroupId,
        payer_count: i64,
        payer_amount: Money,
        payee_count: i64,
        payee_amount: Money,
    ) -> Result<Self, DomainError> {
        if payer_count < 0 || payee_count < 0 {
            return Err(DomainError::ValidationError(
                "Count limits cannot be negative".into(),
            ));
        }

        Ok(Self {
            profile_id,
            group_id,
            payer_count,
            payer_amount,
            payee_count,
            payee_amount,
        })
    }

    /// Caps for a role in a window, derived from the daily caps.
    pub fn caps(&self, role: Role, window: Window) -> Caps {
        let (count, amount) = match role {
            Role::Payer => (self.payer_count, self.payer_amount),
            Role::Payee => (self.payee_count, self.payee_amount),
        };
        let factor = window.multiplier();
        Caps {
            count: count.saturating_mul(factor),
            amount: amount.times(factor),
        }
    }

    /// Runs the AMOUNT, COUNT and CUMULATIVE checks for one window.
    ///
    /// Every failed check is reported; none short-circuits another.
    pub fn check(
        &self,
        role: Role,
        window: Window,
        amount: Money,
        usage: WindowUsage,
    ) -> Vec<Violation> {
        let caps = self.caps(role, window);
        let mut violations = Vec::new();

        if amount > caps.amount {
            violations.push(Violation {
                window,
                kind: ViolationKind::Amount,
                limit: caps.amount.minor(),
                current: amount.minor(),
                message: format!(
                    "{} amount limit exceeded. Limit: {}, Requested: {}",
                    window.label(),
                    caps.amount,
                    amount
                ),
            });
        }

        // A zero cap does not block the first transfer of a window.
        if usage.count > 0 && usage.count >= caps.count {
            violations.push(Violation {
                window,
                kind: ViolationKind::Count,
                limit: caps.count,
                current: usage.count,
                message: format!(
                    "{} transaction count limit exceeded. Limit: {}, Current: {}",
                    window.label(),
                    caps.count,
                    usage.count
                ),
            });
        }

        let projected = usage.amount.minor().saturating_add(amount.minor());
        if projected > caps.amount.minor() {
            violations.push(Violation {
                window,
                kind: ViolationKind::Cumulative,
                limit: caps.amount.minor(),
                current: projected,
                message: format!(
                    "{} cumulative amount limit exceeded. Limit: {}, Would be: {}",
                    window.label(),
                    caps.amount,
                    Money::from_minor(projected).unwrap_or_default()
                ),
            });
        }

        violations
    }

    /// Used and remaining allowance for a window; remainders floor at zero.
    pub fn allowance(&self, role: Role, window: Window, used: WindowUsage) -> WindowAllowance {
        let caps = self.caps(role, window);
        WindowAllowance {
            window,
            caps,
            used,
            remaining_count: (caps.count - used.count).max(0),
            remaining_amount: caps.amount.checked_sub(used.amount).unwrap_or_default(),
        }
    }
}
