//! # SoundReal Common Library
//!
//! Shared code for the SoundReal services:
//! - Configuration loading and validation
//! - Admin allow-list classification
//! - Plan and quota tables
//! - Profile model and read-only profile queries

pub mod admin;
pub mod config;
pub mod db;
pub mod error;
pub mod plans;

pub use admin::{AdminAllowList, Identity};
pub use error::{Error, Result};
pub use plans::{PlanLimits, PlanType, QuotaUsage};
