//! Caller authorization
//!
//! Every vault entry point names a [`VaultOperation`]; the configured
//! [`AccessControl`] decides whether a caller may perform it. The default
//! [`RoleAccessControl`] maps operations to the role that owns them.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::info;
use types::Address;

/// Operation a caller asks the vault to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VaultOperation {
    Execute,
    ConfigureFuses,
    ConfigureBalanceFuses,
    ConfigureSubstrates,
    ConfigureDependencies,
    ConfigureHooks,
    ConfigureInstantWithdrawal,
    RefreshBalances,
    InstantWithdraw,
    Deposit,
    Withdraw,
    Mint,
    Redeem,
    Restore,
}

impl VaultOperation {
    /// Role that owns this operation
    pub fn required_role(self) -> Role {
        match self {
            Self::Execute | Self::InstantWithdraw => Role::Alpha,
            Self::ConfigureFuses
            | Self::ConfigureBalanceFuses
            | Self::ConfigureSubstrates
            | Self::ConfigureDependencies
            | Self::ConfigureInstantWithdrawal => Role::FuseManager,
            Self::ConfigureHooks => Role::Atomist,
            Self::RefreshBalances => Role::BalanceUpdater,
            Self::Deposit | Self::Withdraw | Self::Mint | Self::Redeem => Role::Public,
            Self::Restore => Role::Owner,
        }
    }
}

impl fmt::Display for VaultOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Capability a caller may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Holds every role
    Owner,
    /// Configures hooks and validators
    Atomist,
    /// Executes strategy batches and instant withdrawals
    Alpha,
    /// Manages fuses, balance fuses, substrates and dependencies
    FuseManager,
    /// Triggers balance refreshes
    BalanceUpdater,
    /// Granted to everyone
    Public,
}

/// Authorization seam consumed by the vault
pub trait AccessControl {
    fn authorize(&self, caller: &Address, operation: VaultOperation) -> bool;
}

/// Role table keyed by caller
#[derive(Debug, Clone, Default)]
pub struct RoleAccessControl {
    grants: HashMap<Address, HashSet<Role>>,
}

impl RoleAccessControl {
    pub fn new(owner: Address) -> Self {
        let mut access = Self::default();
        access.grant_role(owner, Role::Owner);
        access
    }

    pub fn with_role(mut self, caller: Address, role: Role) -> Self {
        self.grant_role(caller, role);
        self
    }

    /// Returns true if the role was newly granted
    pub fn grant_role(&mut self, caller: Address, role: Role) -> bool {
        let granted = self.grants.entry(caller).or_default().insert(role);
        if granted {
            info!(caller = %caller, ?role, "role granted");
        }
        granted
    }

    pub fn revoke_role(&mut self, caller: &Address, role: Role) -> bool {
        let Some(roles) = self.grants.get_mut(caller) else {
            return false;
        };
        let revoked = roles.remove(&role);
        if roles.is_empty() {
            self.grants.remove(caller);
        }
        revoked
    }

    pub fn has_role(&self, caller: &Address, role: Role) -> bool {
        if role == Role::Public {
            return true;
        }
        self.grants
            .get(caller)
            .is_some_and(|roles| roles.contains(&Role::Owner) || roles.contains(&role))
    }
}

impl AccessControl for RoleAccessControl {
    fn authorize(&self, caller: &Address, operation: VaultOperation) -> bool {
        self.has_role(caller, operation.required_role())
    }
}
