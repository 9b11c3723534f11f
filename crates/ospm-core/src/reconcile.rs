//! Permission reconciliation
//!
//! Diffs the permissions a client submits for a subscriber group against the
//! rows already stored for it. The result is a plan; applying it is the
//! caller's job and happens inside the caller's transaction.

use uuid::Uuid;

use crate::models::{Permission, PermissionEntry};

/// What to do with one incoming permission entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionAction {
    /// A stored row already carries the same value
    Ignore { existing_id: Uuid },
    /// A stored row has the same category and name but another value
    Update { existing_id: Uuid, value: String },
    /// No stored row has this category and name
    Create(PermissionEntry),
}

/// Decide, for each incoming entry in order, whether it is new, changed or
/// unchanged.
///
/// Only the first stored row with the same `(category, name)` is considered.
/// Stored rows that no incoming entry mentions are left alone.
pub fn reconcile(incoming: &[PermissionEntry], existing: &[Permission]) -> Vec<PermissionAction> {
    incoming
        .iter()
        .map(|entry| {
            let matched = existing
                .iter()
                .find(|row| row.category == entry.category && row.name == entry.name);

            match matched {
                Some(row) if row.value == entry.value => PermissionAction::Ignore {
                    existing_id: row.id,
                },
                Some(row) => PermissionAction::Update {
                    existing_id: row.id,
                    value: entry.value.clone(),
                },
                None => PermissionAction::Create(entry.clone()),
            }
        })
        .collect()
}

/// Counts of a reconciliation result, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub created: usize,
    pub updated: usize,
    pub ignored: usize,
}

impl ReconcilePlan {
    pub fn summarize(actions: &[PermissionAction]) -> Self {
        actions.iter().fold(Self::default(), |mut plan, action| {
            match action {
                PermissionAction::Ignore { .. } => plan.ignored += 1,
                PermissionAction::Update { .. } => plan.updated += 1,
                PermissionAction::Create(_) => plan.created += 1,
            }
            plan
        })
    }

    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stored(category: &str, name: &str, value: &str) -> Permission {
        Permission {
            id: Uuid::new_v4(),
            subscriber_group_id: Uuid::nil(),
            category: category.to_string(),
            name: name.to_string(),
            value: value.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn same_value_is_ignored() {
        let existing = vec![stored("REPORT_LEVEL", "CAN_VIEW", "yes")];
        let incoming = vec![PermissionEntry::new("REPORT_LEVEL", "CAN_VIEW", "yes")];

        assert_eq!(
            reconcile(&incoming, &existing),
            vec![PermissionAction::Ignore {
                existing_id: existing[0].id
            }]
        );
    }

    #[test]
    fn changed_value_is_updated() {
        let existing = vec![stored("REPORT_LEVEL", "CAN_VIEW", "yes")];
        let incoming = vec![PermissionEntry::new("REPORT_LEVEL", "CAN_VIEW", "no")];

        assert_eq!(
            reconcile(&incoming, &existing),
            vec![PermissionAction::Update {
                existing_id: existing[0].id,
                value: "no".to_string()
            }]
        );
    }

    #[test]
    fn unknown_name_is_created() {
        let existing = vec![stored("REPORT_LEVEL", "CAN_VIEW", "yes")];
        let entry = PermissionEntry::new("REPORT_LEVEL", "CAN_EXPORT", "yes");

        assert_eq!(
            reconcile(std::slice::from_ref(&entry), &existing),
            vec![PermissionAction::Create(entry)]
        );
    }

    #[test]
    fn category_is_part_of_the_key() {
        let existing = vec![stored("REPORT_LEVEL", "CAN_VIEW", "yes")];
        let entry = PermissionEntry::new("PAYMENT_LEVEL", "CAN_VIEW", "yes");

        assert_eq!(
            reconcile(std::slice::from_ref(&entry), &existing),
            vec![PermissionAction::Create(entry)]
        );
    }

    #[test]
    fn first_matching_row_wins() {
        let existing = vec![
            stored("REPORT_LEVEL", "CAN_VIEW", "no"),
            stored("REPORT_LEVEL", "CAN_VIEW", "yes"),
        ];
        let incoming = vec![PermissionEntry::new("REPORT_LEVEL", "CAN_VIEW", "yes")];

        assert_eq!(
            reconcile(&incoming, &existing),
            vec![PermissionAction::Update {
                existing_id: existing[0].id,
                value: "yes".to_string()
            }]
        );
    }

    #[test]
    fn empty_inputs() {
        let existing = vec![stored("REPORT_LEVEL", "CAN_VIEW", "yes")];
        assert!(reconcile(&[], &existing).is_empty());

        let incoming = vec![PermissionEntry::new("REPORT_LEVEL", "CAN_VIEW", "yes")];
        assert!(matches!(
            reconcile(&incoming, &[]).as_slice(),
            [PermissionAction::Create(_)]
        ));
    }

    #[test]
    fn plan_counts() {
        let existing = vec![
            stored("REPORT_LEVEL", "A", "yes"),
            stored("REPORT_LEVEL", "B", "yes"),
        ];
        let incoming = vec![
            PermissionEntry::new("REPORT_LEVEL", "A", "yes"),
            PermissionEntry::new("REPORT_LEVEL", "B", "no"),
            PermissionEntry::new("REPORT_LEVEL", "C", "yes"),
        ];
        let plan = ReconcilePlan::summarize(&reconcile(&incoming, &existing));
        assert_eq!(
            plan,
            ReconcilePlan {
                created: 1,
                updated: 1,
                ignored: 1
            }
        );
        assert!(!plan.is_noop());
    }
}
