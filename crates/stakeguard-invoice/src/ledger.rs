//! In-memory invoice list backing the dashboard

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{Invoice, InvoiceStatus};

/// Append-only acceptor of committed invoices
pub trait InvoiceSink: Send + Sync {
    /// Take ownership of a newly committed invoice
    fn append(&self, invoice: Invoice);
}

/// Per-status invoice counts shown above the invoice table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub staked: usize,
    pub completed: usize,
}

/// Newest-first list of invoices.
#[derive(Debug, Default)]
pub struct InvoiceLedger {
    invoices: RwLock<Vec<Invoice>>,
}

impl InvoiceLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger holding `invoices`, already ordered newest first
    pub fn with_invoices(invoices: Vec<Invoice>) -> Self {
        Self {
            invoices: RwLock::new(invoices),
        }
    }

    /// Snapshot of all invoices, newest first
    pub fn list(&self) -> Vec<Invoice> {
        self.invoices.read().clone()
    }

    /// Number of invoices held
    pub fn len(&self) -> usize {
        self.invoices.read().len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.invoices.read().is_empty()
    }

    /// Count invoices by status
    pub fn summary(&self) -> LedgerSummary {
        let invoices = self.invoices.read();
        let count = |status: InvoiceStatus| invoices.iter().filter(|i| i.status == status).count();
        LedgerSummary {
            total: invoices.len(),
            pending: count(InvoiceStatus::Pending),
            in_progress: count(InvoiceStatus::InProgress),
            staked: count(InvoiceStatus::Staked),
            completed: count(InvoiceStatus::Completed),
        }
    }
}

impl InvoiceSink for InvoiceLedger {
    fn append(&self, invoice: Invoice) {
        tracing::debug!("Ledger append: {} ({})", invoice.id, invoice.title);
        self.invoices.write().insert(0, invoice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn invoice(title: &str, status: InvoiceStatus) -> Invoice {
        Invoice {
            id: title.to_lowercase(),
            title: title.to_string(),
            description: String::new(),
            amount: 100.0,
            deadline: "May 5".to_string(),
            stake_amount: 10.0,
            status,
            date: NaiveDate::from_ymd_opt(2025, 4, 25).unwrap(),
        }
    }

    #[test]
    fn test_append_is_newest_first() {
        let ledger = InvoiceLedger::new();
        ledger.append(invoice("First", InvoiceStatus::Pending));
        ledger.append(invoice("Second", InvoiceStatus::Pending));

        let titles: Vec<String> = ledger.list().into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[test]
    fn test_summary_counts() {
        let ledger = InvoiceLedger::with_invoices(vec![
            invoice("Website Development", InvoiceStatus::Pending),
            invoice("Logo Design", InvoiceStatus::InProgress),
            invoice("SEO Services", InvoiceStatus::Staked),
            invoice("Content Writing", InvoiceStatus::Completed),
            invoice("Audit", InvoiceStatus::Pending),
        ]);

        assert_eq!(
            ledger.summary(),
            LedgerSummary {
                total: 5,
                pending: 2,
                in_progress: 1,
                staked: 1,
                completed: 1,
            }
        );
    }

    #[test]
    fn test_empty_summary() {
        let ledger = InvoiceLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.summary(), LedgerSummary::default());
    }
}
