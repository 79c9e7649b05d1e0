//! Directory records: nodes, farms, and their prices.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::Result;
use crate::ids::{FarmId, NodeId, OwnerId};

/// Raw capacity figures published by a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCapacity {
    /// Virtual cores.
    pub cru: u64,
    /// Memory in GiB.
    pub mru: u64,
    /// SSD storage in GiB.
    pub sru: u64,
    /// HDD storage in GiB.
    pub hru: u64,
}

/// A physical node registered in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node id.
    pub node_id: NodeId,
    /// Farm the node belongs to.
    pub farm_id: FarmId,
    /// Total capacity.
    #[serde(default)]
    pub total_resources: ResourceCapacity,
    /// Capacity in use.
    #[serde(default)]
    pub used_resources: ResourceCapacity,
}

/// A payout wallet for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAddress {
    /// Asset (currency) the wallet receives.
    pub asset: String,
    /// Ledger address.
    pub address: String,
}

/// Unit prices a farm charges, in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePrice {
    /// Currency of the prices.
    pub currency: String,
    /// Price per compute unit.
    pub cru: Amount,
    /// Price per SSD unit.
    pub sru: Amount,
    /// Price per HDD unit.
    pub hru: Amount,
    /// Price per memory unit.
    pub mru: Amount,
}

/// A farm: a set of nodes owned by one farmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    /// Farm id.
    pub id: FarmId,
    /// Farmer identity.
    pub threebot_id: OwnerId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Payout wallets, one per asset.
    #[serde(default)]
    pub wallet_addresses: Vec<WalletAddress>,
    /// Price tables, one per currency.
    #[serde(default)]
    pub resource_prices: Vec<ResourcePrice>,
}

impl Farm {
    /// Price table for `currency`, falling back to the first table.
    #[must_use]
    pub fn price_for(&self, currency: Option<&str>) -> Option<&ResourcePrice> {
        currency
            .and_then(|c| {
                self.resource_prices
                    .iter()
                    .find(|p| p.currency.eq_ignore_ascii_case(c))
            })
            .or_else(|| self.resource_prices.first())
    }

    /// Payout wallet for `currency`, falling back to the first wallet.
    #[must_use]
    pub fn wallet_for(&self, currency: Option<&str>) -> Option<&WalletAddress> {
        currency
            .and_then(|c| {
                self.wallet_addresses
                    .iter()
                    .find(|w| w.asset.eq_ignore_ascii_case(c))
            })
            .or_else(|| self.wallet_addresses.first())
    }
}

/// Read-only view of the grid directory.
///
/// Lookups are idempotent and safe to repeat.
pub trait DirectoryService: Send + Sync {
    /// Look up a node. Misses are reported as [`crate::GridError::NodeNotFound`].
    fn get_node(&self, node_id: &NodeId) -> impl Future<Output = Result<Node>> + Send;

    /// Look up a farm. Misses are reported as [`crate::GridError::FarmNotFound`].
    fn get_farm(&self, farm_id: FarmId) -> impl Future<Output = Result<Farm>> + Send;

    /// Farms owned by the given identity.
    fn farms_owned_by(&self, owner: OwnerId) -> impl Future<Output = Result<Vec<Farm>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(currency: &str, cru: &str) -> ResourcePrice {
        let a = |s: &str| s.parse::<Amount>().expect("amount");
        ResourcePrice {
            currency: currency.into(),
            cru: a(cru),
            sru: a("0"),
            hru: a("0"),
            mru: a("0"),
        }
    }

    fn farm() -> Farm {
        Farm {
            id: FarmId(1),
            threebot_id: OwnerId(5),
            name: "freefarm".into(),
            wallet_addresses: vec![
                WalletAddress {
                    asset: "TFT".into(),
                    address: "tft-addr".into(),
                },
                WalletAddress {
                    asset: "FreeTFT".into(),
                    address: "free-addr".into(),
                },
            ],
            resource_prices: vec![price("TFT", "1.5"), price("FreeTFT", "0.1")],
        }
    }

    #[test]
    fn price_for_matches_currency_case_insensitively() {
        let f = farm();
        let p = f.price_for(Some("freetft")).expect("price");
        assert_eq!(p.currency, "FreeTFT");
    }

    #[test]
    fn price_for_falls_back_to_first() {
        let f = farm();
        assert_eq!(f.price_for(Some("BTC")).expect("price").currency, "TFT");
        assert_eq!(f.price_for(None).expect("price").currency, "TFT");
    }

    #[test]
    fn wallet_for_selects_asset() {
        let f = farm();
        assert_eq!(f.wallet_for(Some("FreeTFT")).expect("wallet").address, "free-addr");
        assert_eq!(f.wallet_for(Some("XLM")).expect("wallet").address, "tft-addr");
    }

    #[test]
    fn empty_farm_has_no_price_or_wallet() {
        let f = Farm {
            wallet_addresses: Vec::new(),
            resource_prices: Vec::new(),
            ..farm()
        };
        assert!(f.price_for(Some("TFT")).is_none());
        assert!(f.wallet_for(None).is_none());
    }
}
