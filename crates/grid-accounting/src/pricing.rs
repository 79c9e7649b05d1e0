//! Pricing of per-node aggregates against farm price tables.
//!
//! Every cost is `units x unit price` in exact decimal arithmetic. An overflow
//! anywhere in the computation fails the node with
//! [`AccountingError::AmountOverflow`]; nothing saturates.

use std::sync::Arc;

use grid_core::{Amount, DirectoryService, Reservation};
use rust_decimal::Decimal;
use tracing::debug;

use crate::aggregate::{aggregate, NodeAggregate, NodePricing};
use crate::error::{AccountingError, Result};

/// Prices aggregates using farm data from a directory.
#[derive(Debug)]
pub struct PricingEngine<D> {
    directory: Arc<D>,
}

impl<D> Clone for PricingEngine<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
        }
    }
}

impl<D: DirectoryService> PricingEngine<D> {
    /// Create an engine over `directory`.
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// The directory lookups go through.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Price a single aggregate.
    ///
    /// The farm's price table and wallet are chosen by `currency`, falling
    /// back to the farm's first entry when there is no match.
    ///
    /// # Errors
    ///
    /// Directory misses, a farm without prices or wallet, and overflow.
    pub async fn price_node(
        &self,
        mut node: NodeAggregate,
        currency: Option<&str>,
    ) -> Result<NodeAggregate> {
        let record = self.directory.get_node(&node.node_id).await?;
        let farm = self.directory.get_farm(record.farm_id).await?;

        let prices = farm
            .price_for(currency)
            .ok_or(AccountingError::MissingPriceTable { farm_id: farm.id })?;
        let wallet = farm
            .wallet_for(currency)
            .ok_or(AccountingError::MissingWallet { farm_id: farm.id })?;

        let overflow = || AccountingError::AmountOverflow {
            node_id: node.node_id.clone(),
        };
        let cost = |price: Amount, units: Decimal| price.checked_mul_quantity(units).ok_or_else(overflow);

        let cru_cost = cost(prices.cru, node.units.cru)?;
        let sru_cost = cost(prices.sru, node.units.sru)?;
        let hru_cost = cost(prices.hru, node.units.hru)?;
        let mru_cost = cost(prices.mru, node.units.mru)?;
        let total_cost = [sru_cost, hru_cost, mru_cost]
            .into_iter()
            .try_fold(cru_cost, Amount::checked_add)
            .ok_or_else(overflow)?;

        debug!(
            node_id = %node.node_id,
            farm_id = %farm.id,
            currency = %prices.currency,
            total = %total_cost,
            "priced node"
        );

        node.pricing = Some(NodePricing {
            farm_id: farm.id,
            wallet_address: wallet.address.clone(),
            currency: prices.currency.clone(),
            cru_cost,
            sru_cost,
            hru_cost,
            mru_cost,
            total_cost,
        });
        Ok(node)
    }

    /// Aggregate and price a whole reservation, one entry per node.
    ///
    /// Nodes that carry only network resources are returned unpriced; they
    /// owe nothing and may sit on farms without a price table.
    ///
    /// # Errors
    ///
    /// [`AccountingError::InvalidReservation`] when the reservation accepts no
    /// currency. Otherwise the first aggregation or pricing error aborts the
    /// pass.
    pub async fn price_reservation(&self, reservation: &Reservation) -> Result<Vec<NodeAggregate>> {
        let currency = reservation.primary_currency().ok_or_else(|| {
            AccountingError::InvalidReservation(format!(
                "reservation {} accepts no currency",
                reservation.id
            ))
        })?;
        let mut priced = Vec::new();
        for node in aggregate(reservation)? {
            if node.is_billable() {
                priced.push(self.price_node(node, Some(currency)).await?);
            } else {
                priced.push(node);
            }
        }
        debug!(
            reservation_id = %reservation.id,
            nodes = priced.len(),
            "priced reservation"
        );
        Ok(priced)
    }
}
