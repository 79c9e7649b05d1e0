//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use grid_accounting::{NodeAggregate, PayoutBatch, PayoutInstruction, ReconciliationReport};
use grid_core::{Amount, NextAction, ReservationId, WorkloadResult};
use grid_lifecycle::LifecycleState;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Per-node cost of a reservation.
#[derive(Debug, Clone, Serialize)]
pub struct CostReport {
    /// Reservation priced.
    pub reservation_id: ReservationId,
    /// Currency requested by the reservation.
    pub currency: Option<String>,
    /// One entry per node.
    pub nodes: Vec<NodeAggregate>,
    /// Sum over all priced nodes.
    pub total: Amount,
}

impl TableDisplay for CostReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Reservation {}", self.reservation_id)?;
        writeln!(writer, "══════════════════════════════════")?;
        if self.nodes.is_empty() {
            writeln!(writer, "No workloads")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<20}  {:>6}  {:>8}  {:>8}  {:>8}  {:>8}  {:>12}  {:<20}",
            "NODE", "FARM", "CRU", "MRU", "SRU", "HRU", "COST", "WALLET"
        )?;
        writeln!(writer, "{}", "─".repeat(104))?;
        for node in &self.nodes {
            let u = &node.units;
            let (farm, cost, wallet) = node.pricing.as_ref().map_or_else(
                || ("-".to_string(), "-".to_string(), "-".to_string()),
                |p| {
                    (
                        p.farm_id.to_string(),
                        p.total_cost.to_string(),
                        truncate(&p.wallet_address, 20),
                    )
                },
            );
            writeln!(
                writer,
                "{:<20}  {:>6}  {:>8}  {:>8}  {:>8}  {:>8}  {:>12}  {:<20}",
                truncate(node.node_id.as_str(), 20),
                farm,
                u.cru.normalize(),
                u.mru.normalize(),
                u.sru.normalize(),
                u.hru.normalize(),
                cost,
                wallet
            )?;
        }
        writeln!(writer)?;
        match &self.currency {
            Some(currency) => writeln!(writer, "Total: {} {currency}", self.total)?,
            None => writeln!(writer, "Total: {}", self.total)?,
        }
        Ok(())
    }
}

/// Outcome of a payout run, or the plan for a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutReport {
    /// Reservation paid for.
    pub reservation_id: ReservationId,
    /// Payments planned.
    pub planned: Vec<PayoutInstruction>,
    /// Submission outcome; absent on a dry run.
    pub batch: Option<PayoutBatch>,
}

impl TableDisplay for PayoutReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.planned.is_empty() {
            writeln!(writer, "Nothing to pay for reservation {}", self.reservation_id)?;
            return Ok(());
        }

        writeln!(writer, "{:<20}  {:>12}  {:<24}  {:<10}", "RECIPIENT", "AMOUNT", "REFERENCE", "STATUS")?;
        writeln!(writer, "{}", "─".repeat(72))?;
        for instruction in &self.planned {
            writeln!(
                writer,
                "{:<20}  {:>12}  {:<24}  {:<10}",
                truncate(&instruction.recipient, 20),
                instruction.amount,
                truncate(&instruction.reference, 24),
                self.status_of(instruction)
            )?;
        }

        if let Some(batch) = &self.batch {
            for ambiguous in &batch.ambiguous {
                writeln!(writer)?;
                writeln!(writer, "WARNING: {}", ambiguous.to_error())?;
            }
        }
        Ok(())
    }
}

impl PayoutReport {
    fn status_of(&self, instruction: &PayoutInstruction) -> &'static str {
        let Some(batch) = &self.batch else {
            return "planned";
        };
        if batch.sent.iter().any(|s| &s.instruction == instruction) {
            "sent"
        } else if batch.rejected.contains(instruction) {
            "rejected"
        } else if batch.ambiguous.iter().any(|a| &a.instruction == instruction) {
            "unknown"
        } else {
            "skipped"
        }
    }
}

/// Whether a reservation's payment reached our farms.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    /// Reservation checked.
    pub reservation_id: ReservationId,
    /// Every expected payment was found.
    pub settled: bool,
    /// Detail.
    pub report: ReconciliationReport,
}

impl TableDisplay for VerifyReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let verdict = if self.settled { "PAID" } else { "NOT PAID" };
        writeln!(writer, "Reservation {}: {verdict}", self.reservation_id)?;
        writeln!(writer)?;
        for (payment, tx_id) in &self.report.matched {
            writeln!(writer, "  found    {:<24} {:>12}  tx {tx_id}", payment.message, payment.amount)?;
        }
        for payment in &self.report.missing {
            writeln!(writer, "  missing  {:<24} {:>12}", payment.message, payment.amount)?;
        }
        Ok(())
    }
}

/// Where a waited-on reservation ended up.
#[derive(Debug, Clone, Serialize)]
pub struct WaitReport {
    /// Reservation watched.
    pub reservation_id: ReservationId,
    /// Final watcher state.
    pub state: LifecycleState,
    /// Directory status at the end, when only waiting for payment.
    pub next_action: Option<NextAction>,
    /// Provisioning results.
    pub results: Vec<WorkloadResult>,
}

impl TableDisplay for WaitReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Reservation {}: {}", self.reservation_id, self.state)?;
        if let Some(action) = self.next_action {
            writeln!(writer, "Next action: {action}")?;
        }
        if self.results.is_empty() {
            return Ok(());
        }
        writeln!(writer)?;
        writeln!(writer, "{:>10}  {:<12}  {:<8}  {:<30}", "WORKLOAD", "CATEGORY", "STATE", "MESSAGE")?;
        writeln!(writer, "{}", "─".repeat(66))?;
        for result in &self.results {
            writeln!(
                writer,
                "{:>10}  {:<12}  {:<8}  {:<30}",
                result.workload_id,
                truncate(&result.category, 12),
                format!("{:?}", result.state).to_uppercase(),
                truncate(&result.message, 30)
            )?;
        }
        Ok(())
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_accounting::{ExpectedPayment, NodePricing};
    use grid_core::{FarmId, NodeId, ResourceUnits, WorkloadId};

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn priced_node() -> NodeAggregate {
        let mut node = NodeAggregate::new(NodeId::new("node-1"));
        node.units = ResourceUnits::for_workload(WorkloadId(1)).with_cru(2).with_mru(2);
        node.pricing = Some(NodePricing {
            farm_id: FarmId(3),
            wallet_address: "wallet-abc".into(),
            currency: "TFT".into(),
            cru_cost: amount("3"),
            sru_cost: Amount::ZERO,
            hru_cost: Amount::ZERO,
            mru_cost: amount("0.6"),
            total_cost: amount("3.6"),
        });
        node
    }

    fn render<T: Serialize + TableDisplay>(format: Format, value: &T) -> String {
        let mut buf = Vec::new();
        OutputFormat::new(format).write(&mut buf, value).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cost_table_lists_nodes_and_total() {
        let report = CostReport {
            reservation_id: ReservationId(5),
            currency: Some("TFT".into()),
            nodes: vec![priced_node()],
            total: amount("3.6"),
        };
        let out = render(Format::Table, &report);
        assert!(out.contains("node-1"));
        assert!(out.contains("wallet-abc"));
        assert!(out.contains("Total: 3.6 TFT"));
    }

    #[test]
    fn cost_json_keeps_amounts_as_strings() {
        let report = CostReport {
            reservation_id: ReservationId(5),
            currency: None,
            nodes: vec![priced_node()],
            total: amount("3.6"),
        };
        let value: serde_json::Value = serde_json::from_str(&render(Format::Json, &report)).unwrap();
        assert_eq!(value["total"], "3.6");
        assert_eq!(value["nodes"][0]["pricing"]["total_cost"], "3.6");
    }

    #[test]
    fn dry_run_payout_is_planned() {
        let report = PayoutReport {
            reservation_id: ReservationId(5),
            planned: vec![PayoutInstruction {
                node_id: NodeId::new("node-1"),
                farm_id: FarmId(3),
                recipient: "wallet-abc".into(),
                amount: amount("3.6"),
                reference: "5-1".into(),
            }],
            batch: None,
        };
        let out = render(Format::Table, &report);
        assert!(out.contains("planned"));
        assert!(out.contains("5-1"));
    }

    #[test]
    fn verify_table_shows_missing() {
        let missing = ExpectedPayment {
            message: "5-1".into(),
            amount: amount("3.6"),
        };
        let report = VerifyReport {
            reservation_id: ReservationId(5),
            settled: false,
            report: ReconciliationReport {
                expected: vec![missing.clone()],
                matched: Vec::new(),
                missing: vec![missing],
            },
        };
        let out = render(Format::Table, &report);
        assert!(out.starts_with("Reservation 5: NOT PAID"));
        assert!(out.contains("missing  5-1"));
    }

    #[test]
    fn truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello", 3), "hel");
    }
}
