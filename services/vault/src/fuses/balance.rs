//! Balance fuse valuing ledger positions through a price oracle

use crate::error::FuseError;
use crate::fuse::{BalanceFuse, FuseBalance, MarketView, PriceOracle};
use std::rc::Rc;
use types::{Address, FixedPointError, MarketId, Wad};

/// Values each granted substrate as `position × price`
///
/// Positions are read in the vault asset's decimals; the result is reported
/// in `report_decimals` and normalized by the engine.
pub struct PositionBalanceFuse {
    address: Address,
    market: MarketId,
    asset_decimals: u8,
    report_decimals: u8,
    oracle: Rc<dyn PriceOracle>,
}

impl PositionBalanceFuse {
    pub fn new(
        address: Address,
        market: MarketId,
        asset_decimals: u8,
        report_decimals: u8,
        oracle: Rc<dyn PriceOracle>,
    ) -> Self {
        Self {
            address,
            market,
            asset_decimals,
            report_decimals,
            oracle,
        }
    }
}

impl BalanceFuse for PositionBalanceFuse {
    fn address(&self) -> Address {
        self.address
    }

    fn market_id(&self) -> MarketId {
        self.market
    }

    fn balance_of(&self, view: &MarketView<'_>) -> Result<FuseBalance, FuseError> {
        let mut total = Wad::ZERO;
        for substrate in view.substrates() {
            let position = view.position(substrate);
            if position == 0 {
                continue;
            }
            let (price, price_decimals) = self.oracle.price_of(substrate)?;
            let value = Wad::from_units(position, self.asset_decimals)?
                .mul_wad(Wad::from_units(price, price_decimals)?)?;
            total = total
                .checked_add(value)
                .ok_or_else(|| FixedPointError::overflow("position valuation"))?;
        }
        Ok(FuseBalance::new(
            total.to_units(self.report_decimals)?,
            self.report_decimals,
        ))
    }
}
