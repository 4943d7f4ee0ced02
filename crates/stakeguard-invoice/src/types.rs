//! Core types for invoice creation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Invoice fields derived from free-form text.
///
/// Completeness is never stored: it is always recomputed from `title`,
/// `amount` and `deadline`. The serialized form carries an `isComplete`
/// key for API consumers, which is ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "ExtractedInvoiceWire", from = "ExtractedInvoiceWire")]
pub struct ExtractedInvoice {
    /// First clause of the input, at most 50 characters
    pub title: String,
    /// Remaining clauses, or the title when there are none
    pub description: String,
    /// First amount mentioned in the input
    pub amount: Option<f64>,
    /// Date token following a deadline cue, verbatim
    pub deadline: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractedInvoiceWire {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default)]
    is_complete: bool,
}

impl From<ExtractedInvoiceWire> for ExtractedInvoice {
    fn from(wire: ExtractedInvoiceWire) -> Self {
        Self {
            title: wire.title,
            description: wire.description,
            amount: wire.amount,
            deadline: wire.deadline,
        }
    }
}

impl From<ExtractedInvoice> for ExtractedInvoiceWire {
    fn from(invoice: ExtractedInvoice) -> Self {
        let is_complete = invoice.is_complete();
        Self {
            title: invoice.title,
            description: invoice.description,
            amount: invoice.amount,
            deadline: invoice.deadline,
            is_complete,
        }
    }
}

impl ExtractedInvoice {
    /// Whether title, amount and deadline are all present.
    ///
    /// A zero amount counts as missing.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Required fields that are absent, in the fixed order title, amount, deadline
    pub fn missing_fields(&self) -> Vec<InvoiceField> {
        let mut missing = Vec::new();
        if self.title.is_empty() {
            missing.push(InvoiceField::Title);
        }
        if !self.amount.is_some_and(|a| a != 0.0) {
            missing.push(InvoiceField::Amount);
        }
        if self.deadline.as_deref().is_none_or(str::is_empty) {
            missing.push(InvoiceField::Deadline);
        }
        missing
    }
}

/// The fields an invoice cannot be created without
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceField {
    Title,
    Amount,
    Deadline,
}

impl InvoiceField {
    /// Question asked when this field is missing
    pub fn prompt(&self) -> &'static str {
        match self {
            InvoiceField::Title => "What service or product are you providing?",
            InvoiceField::Amount => "How much will you charge?",
            InvoiceField::Deadline => "When is the payment deadline?",
        }
    }
}

/// Lifecycle status of a committed invoice.
///
/// Only `Pending` is assigned here; later transitions belong to the
/// system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvoiceStatus {
    Pending,
    InProgress,
    Staked,
    Completed,
}

impl InvoiceStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::InProgress => "in-progress",
            InvoiceStatus::Staked => "staked",
            InvoiceStatus::Completed => "completed",
        }
    }

    /// Capitalized name for display
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::InProgress => "In-progress",
            InvoiceStatus::Staked => "Staked",
            InvoiceStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed invoice, owned by the invoice list after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub deadline: String,
    pub stake_amount: f64,
    pub status: InvoiceStatus,
    /// Creation date
    pub date: NaiveDate,
}

impl Invoice {
    /// Assemble a pending invoice from reviewed fields and a validated stake
    pub fn from_extracted(extracted: &ExtractedInvoice, stake_amount: f64, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: extracted.title.clone(),
            description: extracted.description.clone(),
            amount: extracted.amount.unwrap_or_default(),
            deadline: extracted.deadline.clone().unwrap_or_default(),
            stake_amount,
            status: InvoiceStatus::Pending,
            date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ExtractedInvoice {
        ExtractedInvoice {
            title: "Logo design".into(),
            description: "Logo design".into(),
            amount: Some(500.0),
            deadline: Some("June 10".into()),
        }
    }

    #[test]
    fn test_complete_when_all_required_present() {
        assert!(complete().is_complete());
        assert!(complete().missing_fields().is_empty());
    }

    #[test]
    fn test_zero_amount_is_missing() {
        let mut invoice = complete();
        invoice.amount = Some(0.0);
        assert!(!invoice.is_complete());
        assert_eq!(invoice.missing_fields(), vec![InvoiceField::Amount]);
    }

    #[test]
    fn test_missing_fields_fixed_order() {
        let invoice = ExtractedInvoice::default();
        assert_eq!(
            invoice.missing_fields(),
            vec![InvoiceField::Title, InvoiceField::Amount, InvoiceField::Deadline]
        );
    }

    #[test]
    fn test_serialize_recomputes_is_complete() {
        let value = serde_json::to_value(complete()).unwrap();
        assert_eq!(value["isComplete"], serde_json::json!(true));
        assert_eq!(value["amount"], serde_json::json!(500.0));
        assert_eq!(value["deadline"], serde_json::json!("June 10"));
    }

    #[test]
    fn test_deserialize_ignores_stale_is_complete() {
        let json = r#"{"title":"","description":"","amount":null,"deadline":null,"isComplete":true}"#;
        let invoice: ExtractedInvoice = serde_json::from_str(json).unwrap();
        assert!(!invoice.is_complete());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(InvoiceStatus::InProgress).unwrap(),
            serde_json::json!("in-progress")
        );
        assert_eq!(InvoiceStatus::Staked.to_string(), "staked");
    }

    #[test]
    fn test_invoice_from_extracted() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let invoice = Invoice::from_extracted(&complete(), 50.0, date);
        assert_eq!(invoice.title, "Logo design");
        assert_eq!(invoice.amount, 500.0);
        assert_eq!(invoice.deadline, "June 10");
        assert_eq!(invoice.stake_amount, 50.0);
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.date, date);
        assert!(!invoice.id.is_empty());

        let value = serde_json::to_value(&invoice).unwrap();
        assert_eq!(value["stakeAmount"], serde_json::json!(50.0));
        assert_eq!(value["date"], serde_json::json!("2025-05-01"));
    }
}
