//! Reward ladder: qualifying group count → premium duration.

/// Minimum live member count for an added group to qualify.
pub const MIN_GROUP_MEMBERS: u32 = 20;

/// Smallest counter that earns any grant.
pub const MIN_LADDER_GROUPS: u32 = 2;

/// Length of a "permanent" grant.
pub const PERMANENT_GRANT_DAYS: i64 = 3650;

const DAY_SECS: i64 = 86_400;

/// Premium duration awarded for a counter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantDuration {
    Days(u32),
    Permanent,
}

impl GrantDuration {
    /// Human-readable form used in notices.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::Days(1) => "1 day".to_owned(),
            Self::Days(days) => format!("{days} days"),
            Self::Permanent => "PERMANENT".to_owned(),
        }
    }
}

/// Maps the user's group counter onto the ladder.
#[must_use]
pub const fn grant_for(count: u32) -> Option<GrantDuration> {
    match count {
        10.. => Some(GrantDuration::Permanent),
        8..=9 => Some(GrantDuration::Days(7)),
        6..=7 => Some(GrantDuration::Days(5)),
        4..=5 => Some(GrantDuration::Days(3)),
        2..=3 => Some(GrantDuration::Days(1)),
        _ => None,
    }
}

/// Extends `current` by `secs`, counting from `now` when it is absent or expired.
#[must_use]
pub fn extend_expiry(current: Option<i64>, now: i64, secs: i64) -> i64 {
    let base = current.filter(|&expiry| expiry > now).unwrap_or(now);
    base.saturating_add(secs)
}

/// Computes the new expiry for a grant. Permanent grants never stack.
#[must_use]
pub fn apply_grant(current: Option<i64>, now: i64, grant: GrantDuration) -> i64 {
    match grant {
        GrantDuration::Permanent => {
            let permanent = now.saturating_add(PERMANENT_GRANT_DAYS * DAY_SECS);
            current.map_or(permanent, |c| c.max(permanent))
        }
        GrantDuration::Days(days) => extend_expiry(current, now, i64::from(days) * DAY_SECS),
    }
}
