//! Supply fuse: moves idle assets into and out of a market's substrates

use crate::error::FuseError;
use crate::fuse::{Fuse, FuseContext};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::{Address, MarketId};

/// `enter`/`exit` payload, bincode encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyData {
    pub substrate: Address,
    /// Native units of the vault asset
    pub amount: u128,
}

impl SupplyData {
    pub fn new(substrate: Address, amount: u128) -> Self {
        Self { substrate, amount }
    }

    pub fn encode(&self) -> Result<Bytes, FuseError> {
        Ok(Bytes::from(bincode::serialize(self)?))
    }

    pub fn decode(payload: &[u8]) -> Result<Self, FuseError> {
        Ok(bincode::deserialize(payload)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyFuse {
    address: Address,
    market: MarketId,
}

impl SupplyFuse {
    pub fn new(address: Address, market: MarketId) -> Self {
        Self { address, market }
    }

    /// Encoded payload for an `enter` or `exit` of `amount` on `substrate`
    pub fn payload(substrate: Address, amount: u128) -> Result<Bytes, FuseError> {
        SupplyData::new(substrate, amount).encode()
    }

    /// Instant-withdrawal params restricting the unwind to one substrate
    pub fn withdraw_params(substrate: Address) -> Result<Bytes, FuseError> {
        Ok(Bytes::from(bincode::serialize(&substrate)?))
    }
}

impl Fuse for SupplyFuse {
    fn address(&self) -> Address {
        self.address
    }

    fn market_id(&self) -> MarketId {
        self.market
    }

    fn enter(&self, ctx: &mut FuseContext<'_>, payload: &[u8]) -> Result<(), FuseError> {
        let data = SupplyData::decode(payload)?;
        debug!(market = %self.market, substrate = %data.substrate, amount = data.amount, "supply");
        ctx.supply(data.substrate, data.amount)
    }

    fn exit(&self, ctx: &mut FuseContext<'_>, payload: &[u8]) -> Result<(), FuseError> {
        let data = SupplyData::decode(payload)?;
        debug!(market = %self.market, substrate = %data.substrate, amount = data.amount, "redeem");
        ctx.redeem(data.substrate, data.amount)
    }

    /// Redeem from the given substrate, or from every granted substrate in
    /// grant order when `params` is empty
    fn instant_withdraw(
        &self,
        ctx: &mut FuseContext<'_>,
        amount: u128,
        params: &[u8],
    ) -> Result<u128, FuseError> {
        let substrates = if params.is_empty() {
            ctx.substrates().to_vec()
        } else {
            vec![bincode::deserialize::<Address>(params)?]
        };

        let mut freed = 0u128;
        for substrate in substrates {
            let remaining = amount - freed;
            if remaining == 0 {
                break;
            }
            let take = ctx.position(&substrate).min(remaining);
            if take == 0 {
                continue;
            }
            ctx.redeem(substrate, take)?;
            freed += take;
        }
        Ok(freed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_data_roundtrip() {
        let data = SupplyData::new(Address::from_low_u64(7), 1_000_000);
        let bytes = data.encode().unwrap();
        assert_eq!(SupplyData::decode(&bytes).unwrap(), data);
    }

    #[test]
    fn test_truncated_payload_is_invalid() {
        let bytes = SupplyFuse::payload(Address::from_low_u64(7), 5).unwrap();
        let err = SupplyData::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, FuseError::InvalidPayload(_)));
    }
}
