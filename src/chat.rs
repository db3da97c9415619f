//! Conversation handling: session state, intent dispatch, and reply
//! formatting.
//!
//! Each interaction is one full synchronous pass: embed the question,
//! route it, query the store or the FAQ index, and append the exchange to
//! the session transcript. The state machine is re-entrant — every reply
//! returns the session to awaiting-question, and structured fields
//! (account, month) must arrive in the same interaction or the flow
//! restarts.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;
use crate::embedding;
use crate::faq::{FaqIndex, FALLBACK_ANSWER};
use crate::intent::IntentIndex;
use crate::models::ChatMessage;
use crate::store;

pub const MSG_CONSUMPTION_NOT_FOUND: &str = "Le numéro de compte ou le mois est incorrect.";
pub const MSG_CONSUMPTION_MISSING: &str =
    "Veuillez entrer un numéro de compte et une date valides.";
pub const MSG_INVOICE_MISSING: &str =
    "Veuillez saisir votre numéro de compte pour voir vos factures.";
pub const MSG_INVOICES_HEADER: &str = "Voici vos factures :";
pub const MSG_INVOICES_NONE: &str = "Aucune facture trouvée pour ce numéro de compte.";

/// One chat session: an id and its append-only transcript. Lives only for
/// the process; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub transcript: Vec<ChatMessage>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript: Vec::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Structured inputs the surface should collect before the lookup can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Followup {
    Account,
    AccountMonth,
}

/// The assistant's side of one interaction.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub messages: Vec<ChatMessage>,
    /// Set when an intent was detected but its structured fields were
    /// missing; the UI renders the matching follow-up inputs.
    pub followup: Option<Followup>,
}

impl Reply {
    fn answer(content: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(content)],
            followup: None,
        }
    }

    fn prompt(content: impl Into<String>, followup: Followup) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(content)],
            followup: Some(followup),
        }
    }
}

/// One incoming interaction: the free-text question plus the optional
/// structured fields from the follow-up inputs.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub account: Option<String>,
    pub month: Option<String>,
}

/// Presence check only — no format validation, matching the original.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Consumption lookup flow. Absent rows collapse "unknown account" and
/// "no data for that month" into the same negative message.
pub async fn respond_consumption(
    pool: &SqlitePool,
    account: Option<&str>,
    month: Option<&str>,
) -> Result<Reply> {
    let (account, month) = match (account, month) {
        (Some(a), Some(m)) => (a, m),
        _ => {
            return Ok(Reply::prompt(
                MSG_CONSUMPTION_MISSING,
                Followup::AccountMonth,
            ))
        }
    };

    match store::lookup_consumption(pool, account, month).await? {
        Some(volume) => Ok(Reply::answer(format!(
            "Votre consommation pour le mois {} est de {} m³.",
            month, volume
        ))),
        None => Ok(Reply::answer(MSG_CONSUMPTION_NOT_FOUND)),
    }
}

/// Invoice listing flow: every invoice for the account in storage order,
/// optionally narrowed to one month.
pub async fn respond_invoices(
    pool: &SqlitePool,
    account: Option<&str>,
    month: Option<&str>,
) -> Result<Reply> {
    let account = match account {
        Some(a) => a,
        None => return Ok(Reply::prompt(MSG_INVOICE_MISSING, Followup::Account)),
    };

    let invoices = store::lookup_invoices(pool, account, month).await?;
    if invoices.is_empty() {
        return Ok(Reply::answer(MSG_INVOICES_NONE));
    }

    let mut messages = vec![ChatMessage::assistant(MSG_INVOICES_HEADER)];
    for invoice in &invoices {
        messages.push(ChatMessage::assistant(format!(
            "Mois: {}, Montant: {:.2} MAD, Statut: {}, Date de paiement: {}",
            invoice.month,
            invoice.amount,
            invoice.status,
            invoice.paid_on.as_deref().unwrap_or("-")
        )));
    }

    Ok(Reply {
        messages,
        followup: None,
    })
}

/// Generic FAQ flow: the stored answer verbatim when the closest question
/// clears the threshold, otherwise the fixed fallback.
pub fn respond_faq(faq: &FaqIndex, query_vec: &[f32]) -> Reply {
    match faq.answer_for(query_vec) {
        Some(answer) => Reply::answer(answer.to_string()),
        None => Reply::answer(FALLBACK_ANSWER),
    }
}

/// Route one interaction without touching any session: embed the question
/// once, detect the intent, and dispatch. Callers that share session state
/// can route first and append under a short lock.
pub async fn route_message(
    pool: &SqlitePool,
    config: &Config,
    faq: &FaqIndex,
    intents: &IntentIndex,
    request: &ChatRequest,
) -> Result<Reply> {
    let query_vec = embedding::embed_query(&config.embedding, &request.message).await?;

    let reply = match intents.detect(&query_vec) {
        Some("consumption") => {
            respond_consumption(pool, present(&request.account), present(&request.month)).await?
        }
        Some("invoice") => {
            respond_invoices(pool, present(&request.account), present(&request.month)).await?
        }
        // Configured intents without a handling branch fall through to FAQ,
        // as does "no intent detected".
        _ => respond_faq(faq, &query_vec),
    };

    Ok(reply)
}

/// Append both sides of a routed interaction to the transcript, user
/// message first.
pub fn append_exchange(session: &mut Session, question: &str, reply: &Reply) {
    session.transcript.push(ChatMessage::user(question));
    session.transcript.extend(reply.messages.iter().cloned());
}

/// Full routed interaction against one session: route, then append.
pub async fn handle_message(
    pool: &SqlitePool,
    config: &Config,
    faq: &FaqIndex,
    intents: &IntentIndex,
    session: &mut Session,
    request: &ChatRequest,
) -> Result<Reply> {
    let reply = route_message(pool, config, faq, intents, request).await?;
    append_exchange(session, &request.message, &reply);
    Ok(reply)
}

/// Sidebar shortcut: append the fixed (question, answer) pair directly,
/// bypassing the matcher.
pub fn append_shortcut(session: &mut Session, question: &str, answer: &str) {
    session.transcript.push(ChatMessage::user(question));
    session.transcript.push(ChatMessage::assistant(answer));
}
