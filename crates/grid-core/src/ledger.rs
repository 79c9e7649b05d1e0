//! Ledger transactions and the wallet that observes and submits them.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::{GridError, Result};

/// One output of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinOutput {
    /// Unlock hash (address) that can spend the output.
    pub address: String,
    /// Value carried by the output.
    pub value: Amount,
}

/// A transaction observed on (or submitted to) the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Transaction id.
    pub id: String,
    /// Outputs.
    #[serde(default)]
    pub coin_outputs: Vec<CoinOutput>,
    /// Opaque data attached by the sender.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl LedgerTransaction {
    /// Sum of the outputs paying to any of `addresses`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sum overflows.
    pub fn value_to<S: AsRef<str>>(&self, addresses: &[S]) -> Result<Amount> {
        self.coin_outputs
            .iter()
            .filter(|o| addresses.iter().any(|a| a.as_ref() == o.address))
            .try_fold(Amount::ZERO, |acc, o| {
                acc.checked_add(o.value).ok_or_else(|| {
                    GridError::InvalidAmount(format!("output sum overflow in tx {}", self.id))
                })
            })
    }

    /// The data field decoded as a UTF-8 reference message.
    ///
    /// Returns `None` when the data is not valid UTF-8.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// A ledger wallet: the addresses it controls, what it has seen, and the
/// ability to send coins.
pub trait LedgerWallet: Send + Sync {
    /// Addresses owned by this wallet.
    fn addresses(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Transactions touching this wallet.
    fn transactions(&self) -> impl Future<Output = Result<Vec<LedgerTransaction>>> + Send;

    /// Send `amount` to `recipient` with `data` attached.
    ///
    /// Returns the transaction and whether the ledger accepted it. An `Err`
    /// means the outcome is unknown: the coins may or may not have moved.
    fn send_coins(
        &self,
        recipient: &str,
        amount: &str,
        data: &str,
    ) -> impl Future<Output = Result<(LedgerTransaction, bool)>> + Send;
}
