//! Entitlement lookup and post-login destination

use soundreal_common::db::{Profile, ProfileStore};
use std::time::Duration;
use tracing::{debug, error};

/// Where a caller ends up after the post-login callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Home,
    Humanize,
    Pricing,
}

impl Destination {
    pub fn path(&self) -> &'static str {
        match self {
            Destination::Home => "/",
            Destination::Humanize => "/dashboard/humanize",
            Destination::Pricing => "/pricing",
        }
    }
}

/// Result of reading a caller's profile row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementLookup {
    Granted(Profile),
    Denied(Profile),
    /// No profile row for this identity
    Missing,
    /// The store could not answer
    Unavailable(String),
}

impl EntitlementLookup {
    pub fn has_access(&self) -> bool {
        matches!(self, EntitlementLookup::Granted(_))
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            EntitlementLookup::Granted(_) => "granted",
            EntitlementLookup::Denied(_) => "denied",
            EntitlementLookup::Missing => "missing",
            EntitlementLookup::Unavailable(_) => "unavailable",
        }
    }
}

/// Read the caller's profile and classify it
///
/// Read-only. Store failures are logged here and returned as `Unavailable`
/// so callers can tell them apart from a missing row. `limit` bounds the whole
/// lookup, connection wait and query together.
pub async fn lookup_entitlement(store: &ProfileStore, user_id: &str, limit: Duration) -> EntitlementLookup {
    let fetched = match tokio::time::timeout(limit, store.fetch_profile(user_id)).await {
        Ok(fetched) => fetched,
        Err(_) => {
            error!(user_id, ?limit, "Profile lookup timed out");
            return EntitlementLookup::Unavailable(format!("profile lookup timed out after {:?}", limit));
        }
    };

    match fetched {
        Ok(Some(profile)) if profile.has_access => EntitlementLookup::Granted(profile),
        Ok(Some(profile)) => EntitlementLookup::Denied(profile),
        Ok(None) => {
            debug!(user_id, "No profile row");
            EntitlementLookup::Missing
        }
        Err(e) => {
            error!(user_id, error = %e, "Profile lookup failed");
            EntitlementLookup::Unavailable(e.to_string())
        }
    }
}

/// Two-way choice made after a successful code exchange
///
/// Only a granted entitlement reaches the app; denied, missing and unavailable
/// all land on pricing.
pub fn post_login_destination(lookup: &EntitlementLookup) -> Destination {
    if lookup.has_access() {
        Destination::Humanize
    } else {
        Destination::Pricing
    }
}
