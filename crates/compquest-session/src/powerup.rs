//! Per-session, per-ability one-shot usage tracking.
//!
//! The ledger answers one question — "may I still spend this power-up?" —
//! and keeps the answer honest against three inputs: the session-ready
//! seed, local optimism, and server confirmations. It does no I/O and
//! knows nothing about phases; gating against the round state is the
//! state machine's job.

use compquest_protocol::PowerUp;

/// Tracks which of the local player's power-ups have been spent.
///
/// Invariant: once a flag is `true` it never reverts within a session,
/// except through [`seed`](Self::seed), which adopts the server's view
/// verbatim at session start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerUpLedger {
    turing_used: bool,
    memory_stick_used: bool,
}

impl PowerUpLedger {
    /// A fresh ledger with nothing spent.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` iff the ability has never been marked used this session.
    pub fn can_use(&self, power_up: PowerUp) -> bool {
        !*self.flag(power_up)
    }

    /// Marks the ability as spent. Idempotent — marking an already-used
    /// ability is a no-op, never an error.
    pub fn mark_used(&mut self, power_up: PowerUp) {
        let flag = self.flag_mut(power_up);
        if !*flag {
            *flag = true;
            tracing::debug!(%power_up, "power-up marked used");
        }
    }

    /// Adopts the server-reported usage flag from the session-ready
    /// snapshot. The server's word wins over any local default — this is
    /// the one path that may set a flag back to `false`.
    pub fn seed(&mut self, power_up: PowerUp, used: bool) {
        *self.flag_mut(power_up) = used;
    }

    fn flag(&self, power_up: PowerUp) -> &bool {
        match power_up {
            PowerUp::Turing => &self.turing_used,
            PowerUp::MemoryStick => &self.memory_stick_used,
        }
    }

    fn flag_mut(&mut self, power_up: PowerUp) -> &mut bool {
        match power_up {
            PowerUp::Turing => &mut self.turing_used,
            PowerUp::MemoryStick => &mut self.memory_stick_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ledger_allows_both_abilities() {
        let ledger = PowerUpLedger::new();
        assert!(ledger.can_use(PowerUp::Turing));
        assert!(ledger.can_use(PowerUp::MemoryStick));
    }

    #[test]
    fn test_mark_used_is_permanent_and_independent() {
        let mut ledger = PowerUpLedger::new();
        ledger.mark_used(PowerUp::Turing);
        assert!(!ledger.can_use(PowerUp::Turing));
        // The other ability is untouched.
        assert!(ledger.can_use(PowerUp::MemoryStick));
    }

    #[test]
    fn test_mark_used_is_idempotent() {
        let mut ledger = PowerUpLedger::new();
        ledger.mark_used(PowerUp::MemoryStick);
        ledger.mark_used(PowerUp::MemoryStick);
        assert!(!ledger.can_use(PowerUp::MemoryStick));
    }

    #[test]
    fn test_seed_adopts_prior_usage() {
        let mut ledger = PowerUpLedger::new();
        ledger.seed(PowerUp::Turing, true);
        assert!(!ledger.can_use(PowerUp::Turing));
        assert!(ledger.can_use(PowerUp::MemoryStick));
    }

    #[test]
    fn test_seed_overrides_local_state() {
        // The server is the source of truth at session start, in both
        // directions.
        let mut ledger = PowerUpLedger::new();
        ledger.mark_used(PowerUp::Turing);
        ledger.seed(PowerUp::Turing, false);
        assert!(ledger.can_use(PowerUp::Turing));
    }
}
