//! Admin allow-list classification
//!
//! Two allow-lists (emails and user ids) are loaded once at start-up and
//! handed to whoever needs to classify an identity. An identity is an admin
//! when it matches either list.

use std::collections::HashSet;

/// The parts of an identity the classifier looks at
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity<'a> {
    pub email: Option<&'a str>,
    pub id: Option<&'a str>,
}

impl<'a> Identity<'a> {
    pub fn new(email: Option<&'a str>, id: Option<&'a str>) -> Self {
        Self { email, id }
    }
}

/// Immutable admin allow-lists
///
/// Emails are stored lowercased and compared case-insensitively.
/// Ids are compared exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    emails: HashSet<String>,
    ids: HashSet<String>,
}

impl AdminAllowList {
    pub fn new<E, I>(emails: E, ids: I) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .filter_map(|e| normalize(e.as_ref()).map(|e| e.to_lowercase()))
            .collect();
        let ids = ids
            .into_iter()
            .filter_map(|i| normalize(i.as_ref()).map(str::to_string))
            .collect();
        Self { emails, ids }
    }

    /// Build from the comma-separated form used by `ADMIN_EMAILS` / `ADMIN_IDS`
    pub fn from_comma_separated(emails: &str, ids: &str) -> Self {
        Self::new(split_list(emails), split_list(ids))
    }

    pub fn is_admin(&self, identity: Identity<'_>) -> bool {
        let by_email = identity
            .email
            .and_then(normalize)
            .map(|e| self.emails.contains(&e.to_lowercase()))
            .unwrap_or(false);

        let by_id = identity
            .id
            .and_then(normalize)
            .map(|i| self.ids.contains(i))
            .unwrap_or(false);

        by_email || by_id
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.ids.is_empty()
    }

    pub fn email_count(&self) -> usize {
        self.emails.len()
    }

    pub fn id_count(&self) -> usize {
        self.ids.len()
    }
}

/// Split a comma-separated list, trimming entries and dropping empties
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(normalize)
        .map(str::to_string)
        .collect()
}

fn normalize(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
