//! Group-invite rewards.
//!
//! Tracks which groups the bot is in, counts qualifying adds per user and
//! converts the count into premium time.

mod engine;
mod ladder;

pub use engine::{
    Actor, GroupRef, JoinOutcome, LeaveOutcome, MembershipEvent, RewardEngine, RewardOutcome,
    Transition, apply_join, apply_leave,
};
pub use ladder::{
    GrantDuration, MIN_GROUP_MEMBERS, MIN_LADDER_GROUPS, PERMANENT_GRANT_DAYS, apply_grant,
    extend_expiry, grant_for,
};
