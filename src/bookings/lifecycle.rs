//! Booking status tables: which moves exist, and who may request them.

use crate::auth::{Policy, Relation};
use crate::db::{BookingStatus, Role};

/// Client of the booking cancels
pub const CANCEL: Policy = Policy::All(&[
    Policy::Roles(&[Role::Client]),
    Policy::Owner(Relation::Client),
]);

/// Freelancer of the booking confirms
pub const CONFIRM: Policy = Policy::All(&[
    Policy::Roles(&[Role::Freelancer]),
    Policy::Owner(Relation::Freelancer),
]);

// Any freelancer may complete, not only the booking's own. Kept as-is
// until product decides whether completion should require ownership.
pub const COMPLETE: Policy = Policy::Roles(&[Role::Admin, Role::Freelancer]);

/// Policy guarding a move into `target`. `None` means nobody may request it.
pub fn transition_policy(target: BookingStatus) -> Option<&'static Policy> {
    match target {
        BookingStatus::Canceled => Some(&CANCEL),
        BookingStatus::Confirmed => Some(&CONFIRM),
        BookingStatus::Completed => Some(&COMPLETE),
        BookingStatus::Pending => None,
    }
}

/// Statuses reachable from `from` in one regular transition
pub fn next_statuses(from: BookingStatus) -> &'static [BookingStatus] {
    match from {
        BookingStatus::Pending => &[BookingStatus::Confirmed, BookingStatus::Canceled],
        BookingStatus::Confirmed => &[BookingStatus::Completed, BookingStatus::Canceled],
        BookingStatus::Canceled | BookingStatus::Completed => &[],
    }
}

pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    next_statuses(from).contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_table() {
        use BookingStatus::*;

        let allowed = [
            (Pending, Confirmed),
            (Pending, Canceled),
            (Confirmed, Completed),
            (Confirmed, Canceled),
        ];
        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                assert_eq!(
                    can_transition(from, to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for status in BookingStatus::ALL {
            assert_eq!(status.is_terminal(), next_statuses(status).is_empty());
        }
    }

    #[test]
    fn test_pending_is_never_a_target() {
        assert!(transition_policy(BookingStatus::Pending).is_none());
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Canceled,
            BookingStatus::Completed,
        ] {
            assert!(transition_policy(status).is_some());
        }
    }
}
