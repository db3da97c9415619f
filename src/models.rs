//! Core data types used throughout aquabot.
//!
//! These types represent the customer records stored in SQLite, the FAQ
//! reference data loaded at startup, and the chat messages exchanged with
//! a session.

use serde::{Deserialize, Serialize};

/// One month of metered consumption for a customer account.
///
/// Multiple rows may exist per account (one per month). There is no
/// uniqueness constraint on `(account, month)`; reads take the first
/// matching row in storage order.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionRecord {
    pub surname: String,
    pub given_name: String,
    pub account: String,
    /// Billing month, `YYYY-MM`.
    pub month: String,
    /// Metered volume in cubic meters.
    pub volume_m3: f64,
    pub address: String,
}

/// A billing invoice for an account and month.
///
/// There is no foreign key to the consumption table; the account number is
/// a loose textual join key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceRecord {
    pub account: String,
    pub month: String,
    /// Amount due, in MAD.
    pub amount: f64,
    /// Free-text status, e.g. "Payée" / "Non payée".
    pub status: String,
    /// Payment date when settled, `YYYY-MM-DD`.
    pub paid_on: Option<String>,
}

/// A question/answer pair from the FAQ reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in a session transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
