//! Creation rules for organizations
//!
//! A new organization must open with a zero balance, no overdraft and a zero
//! overdraft threshold, and must name itself and a reachable, identifiable
//! owner. Every rule is evaluated so a client sees all problems at once.

use rust_decimal::Decimal;

use crate::error::{AppError, FieldViolation};
use crate::models::organization::{
    NewOrganization, NewOrganizationDetails, NewOrganizationOwner, OrganizationDraft, OwnerType,
};
use crate::models::non_empty;

/// Evaluate all creation rules in a fixed order and return every violation.
pub fn check_organization_draft(draft: &OrganizationDraft) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if draft.balance != Decimal::ZERO {
        violations.push(FieldViolation::new(
            "balance",
            format!(
                "organization balance can not accept any values but 0 while creating the organization. given value is: {}",
                draft.balance
            ),
        ));
    }

    if draft.allow_negative_balance {
        violations.push(FieldViolation::new(
            "allow_negative_balance",
            "organization allow_negative_balance can not be true while creating the organization",
        ));
    }

    if draft.negative_balance_threshold != Decimal::ZERO {
        violations.push(FieldViolation::new(
            "negative_balance_threshold",
            format!(
                "organization negative_balance_threshold can not accept any values but 0 while creating the organization. given value is: {}",
                draft.negative_balance_threshold
            ),
        ));
    }

    if draft.details.name.trim().is_empty() {
        violations.push(FieldViolation::new(
            "details.name",
            "organization name can not be empty while creating the organization",
        ));
    }

    if draft.owner.email.trim().is_empty() {
        violations.push(FieldViolation::new(
            "owner.email",
            "organization's owner email address can not be empty while creating the organization",
        ));
    }

    if draft.owner.mobile.trim().is_empty() {
        violations.push(FieldViolation::new(
            "owner.mobile",
            "organization's owner mobile can not be empty while creating the organization",
        ));
    }

    if draft.owner.owner_type.parse::<OwnerType>().is_err() {
        violations.push(FieldViolation::new(
            "owner.type",
            format!(
                "organization's owner type should be either individual or legal while creating the organization. given value is: '{}'",
                draft.owner.owner_type
            ),
        ));
    }

    if draft.owner.legal_national_id.trim().is_empty() {
        violations.push(FieldViolation::new(
            "owner.legal_national_id",
            "organization's owner legal national ID can not be empty while creating the organization",
        ));
    }

    violations
}

impl TryFrom<OrganizationDraft> for NewOrganization {
    type Error = AppError;

    fn try_from(draft: OrganizationDraft) -> Result<Self, Self::Error> {
        let violations = check_organization_draft(&draft);
        if !violations.is_empty() {
            return Err(AppError::validation(violations));
        }

        let owner_type = draft
            .owner
            .owner_type
            .parse::<OwnerType>()
            .map_err(|e| AppError::validation(vec![FieldViolation::new("owner.type", e.to_string())]))?;

        Ok(NewOrganization {
            details: NewOrganizationDetails {
                name: draft.details.name.trim().to_string(),
                address: non_empty(&draft.details.address),
                email: non_empty(&draft.details.email),
                mobile: non_empty(&draft.details.mobile),
                phone: non_empty(&draft.details.phone),
            },
            owner: NewOrganizationOwner {
                owner_type,
                name: non_empty(&draft.owner.name),
                address: non_empty(&draft.owner.address),
                email: draft.owner.email.trim().to_string(),
                mobile: draft.owner.mobile.trim().to_string(),
                phone: non_empty(&draft.owner.phone),
                legal_national_id: draft.owner.legal_national_id.trim().to_string(),
            },
        })
    }
}
