//! Plan and quota tables
//!
//! Static limits per plan, plus the usage summary derived from a profile row.

use crate::db::Profile;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    Free,
    Basic,
    Pro,
    Ultra,
}

impl PlanType {
    pub const ALL: [PlanType; 4] = [PlanType::Free, PlanType::Basic, PlanType::Pro, PlanType::Ultra];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Free => "free",
            PlanType::Basic => "basic",
            PlanType::Pro => "pro",
            PlanType::Ultra => "ultra",
        }
    }

    /// Plan stored on a profile row
    ///
    /// Absent or unrecognised values fall back to `Free`.
    pub fn from_column(value: Option<&str>) -> Self {
        match value {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(plan_type = raw, "Unrecognised plan_type on profile, treating as free");
                PlanType::Free
            }),
            None => PlanType::Free,
        }
    }

    pub fn limits(&self) -> PlanLimits {
        PlanLimits::for_plan(*self)
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PlanType::Free),
            "basic" => Ok(PlanType::Basic),
            "pro" => Ok(PlanType::Pro),
            "ultra" => Ok(PlanType::Ultra),
            other => Err(Error::UnknownPlan(other.to_string())),
        }
    }
}

/// Word and transformation allowance for one billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanLimits {
    pub words: u64,
    pub transformations: u64,
}

impl PlanLimits {
    pub const fn for_plan(plan: PlanType) -> Self {
        match plan {
            PlanType::Free => Self { words: 500, transformations: 5 },
            PlanType::Basic => Self { words: 10_000, transformations: 100 },
            PlanType::Pro => Self { words: 50_000, transformations: 500 },
            PlanType::Ultra => Self { words: 150_000, transformations: 2_000 },
        }
    }
}

/// Usage against one limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allowance {
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
}

impl Allowance {
    fn new(used: u64, limit: u64) -> Self {
        Self {
            used,
            limit,
            remaining: limit.saturating_sub(used),
        }
    }
}

/// Quota summary for a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub plan: PlanType,
    pub has_access: bool,
    pub words: Allowance,
    pub transformations: Allowance,
    pub exhausted: bool,
}

impl QuotaUsage {
    /// Summarise a profile row
    ///
    /// Stored limits win when they are positive; otherwise the plan table applies.
    pub fn from_profile(profile: &Profile) -> Self {
        let plan = PlanType::from_column(profile.plan_type.as_deref());
        let defaults = plan.limits();

        let words = Allowance::new(
            clamp_counter(profile.words_used),
            effective_limit(profile.words_limit, defaults.words),
        );
        let transformations = Allowance::new(
            clamp_counter(profile.transformations_used),
            effective_limit(profile.transformations_limit, defaults.transformations),
        );

        Self {
            plan,
            has_access: profile.has_access,
            exhausted: words.remaining == 0 || transformations.remaining == 0,
            words,
            transformations,
        }
    }
}

fn clamp_counter(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn effective_limit(stored: Option<i64>, plan_default: u64) -> u64 {
    match stored {
        Some(limit) if limit > 0 => limit as u64,
        _ => plan_default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(plan: Option<&str>) -> Profile {
        Profile {
            id: "u1".to_string(),
            has_access: true,
            plan_type: plan.map(str::to_string),
            words_used: 0,
            words_limit: None,
            transformations_used: 0,
            transformations_limit: None,
        }
    }

    #[test]
    fn test_plan_table() {
        assert_eq!(PlanLimits::for_plan(PlanType::Free), PlanLimits { words: 500, transformations: 5 });
        assert_eq!(PlanLimits::for_plan(PlanType::Basic).words, 10_000);
        assert_eq!(PlanLimits::for_plan(PlanType::Pro).transformations, 500);
        assert_eq!(PlanLimits::for_plan(PlanType::Ultra).words, 150_000);
    }

    #[test]
    fn test_limits_grow_with_plan() {
        for pair in PlanType::ALL.windows(2) {
            let (lower, higher) = (pair[0].limits(), pair[1].limits());
            assert!(lower.words < higher.words);
            assert!(lower.transformations < higher.transformations);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("PRO".parse::<PlanType>().unwrap(), PlanType::Pro);
        assert_eq!(" basic ".parse::<PlanType>().unwrap(), PlanType::Basic);
        assert!("enterprise".parse::<PlanType>().is_err());
    }

    #[test]
    fn test_from_column_falls_back_to_free() {
        assert_eq!(PlanType::from_column(None), PlanType::Free);
        assert_eq!(PlanType::from_column(Some("gold")), PlanType::Free);
        assert_eq!(PlanType::from_column(Some("ultra")), PlanType::Ultra);
    }

    #[test]
    fn test_display_matches_column_value() {
        for plan in PlanType::ALL {
            assert_eq!(plan.to_string().parse::<PlanType>().unwrap(), plan);
        }
    }

    #[test]
    fn test_usage_uses_plan_defaults_without_stored_limits() {
        let mut p = profile(Some("basic"));
        p.words_used = 2_500;
        p.transformations_used = 10;

        let usage = QuotaUsage::from_profile(&p);
        assert_eq!(usage.plan, PlanType::Basic);
        assert_eq!(usage.words.limit, 10_000);
        assert_eq!(usage.words.remaining, 7_500);
        assert_eq!(usage.transformations.remaining, 90);
        assert!(!usage.exhausted);
    }

    #[test]
    fn test_usage_prefers_positive_stored_limits() {
        let mut p = profile(Some("pro"));
        p.words_limit = Some(75_000);
        p.transformations_limit = Some(0);

        let usage = QuotaUsage::from_profile(&p);
        assert_eq!(usage.words.limit, 75_000);
        assert_eq!(usage.transformations.limit, 500);
    }

    #[test]
    fn test_usage_never_goes_negative() {
        let mut p = profile(None);
        p.words_used = 900;
        p.transformations_used = -3;

        let usage = QuotaUsage::from_profile(&p);
        assert_eq!(usage.words.remaining, 0);
        assert_eq!(usage.transformations.used, 0);
        assert!(usage.exhausted);
    }
}
