//! Re-entrancy guard
//!
//! The vault is single-threaded; the only way to observe it mid-operation is
//! for an adapter or hook to call back into it. Every entry point enters a
//! [`Phase`] through [`PhaseGuard`], and any entry while the phase is not
//! [`Phase::Idle`] is rejected with `VaultError::Reentrancy`.

use crate::error::{VaultError, VaultResult};
use serde::Serialize;
use std::cell::Cell;
use std::fmt;

/// What the vault is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Idle,
    Configuring,
    Executing,
    Refreshing,
    Withdrawing,
    RunningPreHooks,
    Validating,
    RunningProtectedCall,
    RunningPostHooks,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Configuring => "configuring",
            Self::Executing => "executing batch",
            Self::Refreshing => "refreshing balances",
            Self::Withdrawing => "routing withdrawal",
            Self::RunningPreHooks => "running pre-hooks",
            Self::Validating => "validating exchange rate",
            Self::RunningProtectedCall => "running protected call",
            Self::RunningPostHooks => "running post-hooks",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Holds the vault out of [`Phase::Idle`] until dropped
pub(crate) struct PhaseGuard<'a> {
    cell: &'a Cell<Phase>,
}

impl<'a> PhaseGuard<'a> {
    pub(crate) fn enter(cell: &'a Cell<Phase>, phase: Phase) -> VaultResult<Self> {
        let current = cell.get();
        if current != Phase::Idle {
            return Err(VaultError::Reentrancy { phase: current });
        }
        cell.set(phase);
        Ok(Self { cell })
    }

    /// Move to the next step of the same operation
    pub(crate) fn advance(&self, phase: Phase) {
        self.cell.set(phase);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.cell.set(Phase::Idle);
    }
}

/// Reject reads while an operation is in flight
pub(crate) fn ensure_idle(cell: &Cell<Phase>) -> VaultResult<()> {
    match cell.get() {
        Phase::Idle => Ok(()),
        phase => Err(VaultError::Reentrancy { phase }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_resets_on_drop() {
        let cell = Cell::new(Phase::Idle);
        {
            let guard = PhaseGuard::enter(&cell, Phase::RunningPreHooks).unwrap();
            assert_eq!(cell.get(), Phase::RunningPreHooks);
            guard.advance(Phase::Validating);
            assert_eq!(cell.get(), Phase::Validating);
        }
        assert_eq!(cell.get(), Phase::Idle);
    }

    #[test]
    fn test_nested_entry_rejected() {
        let cell = Cell::new(Phase::Idle);
        let _outer = PhaseGuard::enter(&cell, Phase::Executing).unwrap();
        let err = PhaseGuard::enter(&cell, Phase::Configuring).err().unwrap();
        assert!(matches!(err, VaultError::Reentrancy { phase: Phase::Executing }));
        assert!(ensure_idle(&cell).is_err());
    }
}
