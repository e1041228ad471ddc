//! Data models for Fakturo entities.
//!
//! This module contains the data structures exchanged with the backend:
//!
//! - `User`, `PlanTier`, `AuthSession`: account and credential records
//! - `Invoice`, `InvoiceLineItem`, `InvoiceAnalysis`: invoicing types
//! - `Expense`, `ReceiptFile`, `ReceiptAnalysis`: expense tracking types
//! - `MonthlySummary`, `ChartPoint`: income/expense reporting
//! - `CheckoutSession`, `BillingPortal`, `PlanConfirmation`: subscription billing
//!
//! Dates travel as ISO strings exactly as the backend sends them; parsing
//! for display is a UI concern.

pub mod billing;
pub mod expense;
pub mod invoice;
pub mod summary;
pub mod user;

pub use billing::{BetaFeedback, BillingPortal, CheckoutSession, PlanConfirmation};
pub use expense::{Expense, NewExpense, ReceiptAnalysis, ReceiptFile};
pub use invoice::{Invoice, InvoiceAnalysis, InvoiceLineItem, NewInvoice, PdfGenerated, PdfTemplate};
pub use summary::{ChartPoint, MonthlySummary, SummaryQuery};
pub use user::{AuthSession, PlanTier, User};
