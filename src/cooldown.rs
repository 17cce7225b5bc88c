//! Per-action, per-user cooldown gate.

use crate::access::AccountTier;
use crate::state::{CooldownKind, CooldownTable, GlobalSettings, UserId};

/// Outcome of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownDecision {
    Allowed,
    Wait { remaining_secs: i64 },
}

impl CooldownDecision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Gate applying one window to every gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownGate {
    window_secs: i64,
}

impl CooldownGate {
    #[must_use]
    pub const fn new(window_secs: i64) -> Self {
        Self { window_secs }
    }

    /// Builds the gate from the global minutes setting.
    #[must_use]
    pub fn from_settings(settings: &GlobalSettings) -> Self {
        Self::new(settings.cooldown_window_secs())
    }

    #[must_use]
    pub const fn window_secs(&self) -> i64 {
        self.window_secs
    }

    /// Checks whether `user` may run `kind` at `now`. Only reads the `(kind, user)` cell.
    #[must_use]
    pub fn check(
        &self,
        kind: CooldownKind,
        user: UserId,
        tier: AccountTier,
        now: i64,
        table: &CooldownTable,
    ) -> CooldownDecision {
        if tier.bypasses_gates() {
            return CooldownDecision::Allowed;
        }

        let Some(last_use) = table.last_use(kind, user) else {
            return CooldownDecision::Allowed;
        };

        // A last use in the future counts as zero elapsed.
        let elapsed = now.saturating_sub(last_use).max(0);
        if elapsed >= self.window_secs {
            CooldownDecision::Allowed
        } else {
            CooldownDecision::Wait {
                remaining_secs: self.window_secs.saturating_sub(elapsed),
            }
        }
    }

    /// Records a use of `kind`. Main owners are never recorded.
    pub fn record(
        &self,
        kind: CooldownKind,
        user: UserId,
        tier: AccountTier,
        now: i64,
        table: &mut CooldownTable,
    ) {
        if !tier.bypasses_gates() {
            table.record(kind, user, now);
        }
    }
}

/// Formats a wait as `"M min S sec"`.
#[must_use]
pub fn format_wait(remaining_secs: i64) -> String {
    let remaining = remaining_secs.max(0);
    format!("{} min {} sec", remaining / 60, remaining % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: i64 = 900;
    const T: i64 = 1_000_000;

    fn table_with(kind: CooldownKind, user: UserId, at: i64) -> CooldownTable {
        let mut table = CooldownTable::default();
        table.record(kind, user, at);
        table
    }

    #[test]
    fn test_boundary() {
        let gate = CooldownGate::new(W);
        let table = table_with(CooldownKind::Share, 5, T);

        assert_eq!(
            gate.check(CooldownKind::Share, 5, AccountTier::Premium, T + W - 1, &table),
            CooldownDecision::Wait { remaining_secs: 1 }
        );
        assert_eq!(
            gate.check(CooldownKind::Share, 5, AccountTier::Premium, T + W, &table),
            CooldownDecision::Allowed
        );
    }

    #[test]
    fn test_cells_are_independent() {
        let gate = CooldownGate::new(W);
        let table = table_with(CooldownKind::Share, 5, T);

        assert!(gate.check(CooldownKind::Broadcast, 5, AccountTier::Executive, T, &table).is_allowed());
        assert!(gate.check(CooldownKind::Share, 6, AccountTier::Premium, T, &table).is_allowed());
    }

    #[test]
    fn test_main_owner_bypasses_and_is_never_recorded() {
        let gate = CooldownGate::new(W);
        let mut table = table_with(CooldownKind::Share, 1, T);

        assert!(gate.check(CooldownKind::Share, 1, AccountTier::MainOwner, T, &table).is_allowed());

        gate.record(CooldownKind::Broadcast, 1, AccountTier::MainOwner, T, &mut table);
        assert_eq!(table.last_use(CooldownKind::Broadcast, 1), None);

        gate.record(CooldownKind::Broadcast, 2, AccountTier::DelegatedOwner, T, &mut table);
        assert_eq!(table.last_use(CooldownKind::Broadcast, 2), Some(T));
    }

    #[test]
    fn test_window_from_settings() {
        let gate = CooldownGate::from_settings(&GlobalSettings::default());
        assert_eq!(gate.window_secs(), 15 * 60);
    }

    #[test]
    fn test_future_last_use_with_huge_window() {
        let mut settings = GlobalSettings::default();
        settings.cooldown.default = 153_722_867_280_912_930;
        let gate = CooldownGate::from_settings(&settings);
        let table = table_with(CooldownKind::Share, 5, T + 10);

        assert_eq!(
            gate.check(CooldownKind::Share, 5, AccountTier::Premium, T, &table),
            CooldownDecision::Wait {
                remaining_secs: gate.window_secs()
            }
        );
    }

    #[test]
    fn test_future_last_use_waits_full_window() {
        let gate = CooldownGate::new(W);
        let table = table_with(CooldownKind::Share, 5, T + 100);

        assert_eq!(
            gate.check(CooldownKind::Share, 5, AccountTier::Premium, T, &table),
            CooldownDecision::Wait { remaining_secs: W }
        );
    }

    #[test]
    fn test_format_wait() {
        assert_eq!(format_wait(61), "1 min 1 sec");
        assert_eq!(format_wait(1), "0 min 1 sec");
        assert_eq!(format_wait(-3), "0 min 0 sec");
    }
}
