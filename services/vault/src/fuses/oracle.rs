//! Fixed-value oracles

use crate::error::FuseError;
use crate::fuse::{ExchangeRateSource, PriceOracle};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use types::{Address, Wad, WAD_DECIMALS};

/// Price table set by the host
#[derive(Debug, Default)]
pub struct StaticPriceOracle {
    prices: RefCell<HashMap<Address, Wad>>,
}

impl StaticPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, instrument: Address, price: Wad) -> Self {
        self.set_price(instrument, price);
        self
    }

    pub fn set_price(&self, instrument: Address, price: Wad) {
        self.prices.borrow_mut().insert(instrument, price);
    }

    /// Returns the removed price, if any
    pub fn remove_price(&self, instrument: &Address) -> Option<Wad> {
        self.prices.borrow_mut().remove(instrument)
    }

    pub fn len(&self) -> usize {
        self.prices.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.borrow().is_empty()
    }
}

impl PriceOracle for StaticPriceOracle {
    fn price_of(&self, instrument: &Address) -> Result<(u128, u8), FuseError> {
        self.prices
            .borrow()
            .get(instrument)
            .map(|price| (price.raw(), WAD_DECIMALS))
            .ok_or(FuseError::PriceUnavailable {
                instrument: *instrument,
            })
    }
}

/// Exchange rate set by the host
#[derive(Debug)]
pub struct StaticExchangeRate {
    rate: Cell<Wad>,
}

impl StaticExchangeRate {
    pub fn new(rate: Wad) -> Self {
        Self {
            rate: Cell::new(rate),
        }
    }

    pub fn set_rate(&self, rate: Wad) {
        self.rate.set(rate);
    }

    pub fn rate(&self) -> Wad {
        self.rate.get()
    }
}

impl ExchangeRateSource for StaticExchangeRate {
    fn current_exchange_rate(&self) -> Result<Wad, FuseError> {
        Ok(self.rate.get())
    }
}
