//! Implementation catalog
//!
//! Maps adapter addresses to the trait objects that implement them. The
//! catalog is fixed when the vault is built; the registry then decides which
//! of these implementations are active.

use crate::fuse::{BalanceFuse, Fuse, Hook};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::warn;
use types::Address;

#[derive(Default, Clone)]
pub struct Catalog {
    fuses: HashMap<Address, Rc<dyn Fuse>>,
    balance_fuses: HashMap<Address, Rc<dyn BalanceFuse>>,
    hooks: HashMap<Address, Rc<dyn Hook>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_fuse(&mut self, fuse: Rc<dyn Fuse>) {
        if self.fuses.insert(fuse.address(), fuse.clone()).is_some() {
            warn!(fuse = %fuse.address(), "fuse implementation replaced in catalog");
        }
    }

    pub fn register_balance_fuse(&mut self, fuse: Rc<dyn BalanceFuse>) {
        if self.balance_fuses.insert(fuse.address(), fuse.clone()).is_some() {
            warn!(fuse = %fuse.address(), "balance fuse implementation replaced in catalog");
        }
    }

    pub fn register_hook(&mut self, hook: Rc<dyn Hook>) {
        if self.hooks.insert(hook.address(), hook.clone()).is_some() {
            warn!(hook = %hook.address(), "hook implementation replaced in catalog");
        }
    }

    pub fn fuse(&self, address: &Address) -> Option<&dyn Fuse> {
        self.fuses.get(address).map(|fuse| fuse.as_ref())
    }

    pub fn balance_fuse(&self, address: &Address) -> Option<&dyn BalanceFuse> {
        self.balance_fuses.get(address).map(|fuse| fuse.as_ref())
    }

    pub fn hook(&self, address: &Address) -> Option<&dyn Hook> {
        self.hooks.get(address).map(|hook| hook.as_ref())
    }

    pub fn len(&self) -> usize {
        self.fuses.len() + self.balance_fuses.len() + self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
