//! OSPM Services Layer
//!
//! Lifecycle managers for organizations and subscriber groups. Each public
//! operation runs in exactly one store transaction and reports failures as
//! `ospm_core::AppError`; raw store errors never leave this crate. Keep thin
//! HTTP handling in ospm-api.

pub mod services;

pub use services::{
    organization::{OrganizationService, RecoverOutcome},
    subscriber_group::SubscriberGroupService,
};
