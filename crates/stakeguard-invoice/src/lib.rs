//! stakeguard-invoice: invoice data model and field extraction
//!
//! This crate turns natural-language job descriptions into structured invoice
//! fields, either in-process or through a remote extraction endpoint, and
//! holds the invoice list shown on the dashboard.

pub mod deadline;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod providers;
pub mod types;

pub use error::{Error, Result};
pub use extract::extract;
pub use ledger::{InvoiceLedger, InvoiceSink, LedgerSummary};
pub use providers::{Extractor, RetryConfig, local::LocalExtractor, remote::RemoteExtractor};
pub use types::*;
