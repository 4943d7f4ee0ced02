//! /invoices command - dashboard summary and invoice table

use super::CommandResult;
use crate::utils::{short_id, truncate_chars};
use stakeguard_invoice::{Invoice, LedgerSummary};

const TITLE_WIDTH: usize = 28;

pub struct InvoicesCommand;

impl InvoicesCommand {
    pub fn execute(summary: LedgerSummary, invoices: &[Invoice]) -> CommandResult {
        CommandResult::Message(Self::render(summary, invoices))
    }

    /// Summary counts followed by a newest-first table
    pub fn render(summary: LedgerSummary, invoices: &[Invoice]) -> String {
        let mut output = String::from("Invoices\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');
        output.push_str(&format!(
            "Total: {}  Pending: {}  In-progress: {}  Staked: {}  Completed: {}\n",
            summary.total, summary.pending, summary.in_progress, summary.staked, summary.completed
        ));

        if invoices.is_empty() {
            output.push_str("\nNo invoices yet. Describe your work in the chat to create one.");
            return output;
        }

        output.push('\n');
        output.push_str(&format!(
            "{:<width$}  {:<8}  {:>12}  {:<10}  {:<12}  {}\n",
            "TITLE",
            "ID",
            "AMOUNT",
            "DATE",
            "DEADLINE",
            "STATUS",
            width = TITLE_WIDTH + 3
        ));
        for invoice in invoices {
            output.push_str(&format!(
                "{:<width$}  {:<8}  {:>12}  {:<10}  {:<12}  {}\n",
                truncate_chars(&invoice.title, TITLE_WIDTH),
                short_id(&invoice.id),
                format!("${:.2}", invoice.amount),
                invoice.date.format("%Y-%m-%d").to_string(),
                invoice.deadline,
                invoice.status.label(),
                width = TITLE_WIDTH + 3
            ));
        }
        output.truncate(output.trim_end().len());
        output
    }
}
