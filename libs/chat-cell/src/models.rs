use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use directory_cell::models::{AppointmentKind, AvailableSlot, DocumentType};

/// Where the booking dialogue currently sits. One variant per question the
/// bot is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationStage {
    Menu,
    AwaitingDocumentType,
    AwaitingDocumentNumber,
    AwaitingName,
    AwaitingPrimaryPhone,
    AwaitingSecondaryPhone,
    AwaitingAddress,
    AwaitingBirthDate,
    AwaitingInsurer,
    AwaitingAppointmentKind,
    AwaitingAppointmentDate,
    AwaitingDoctorSelection,
    AwaitingEmail,
    FinalConfirmation,
}

/// Per-sender conversation state. Lives only in memory; an expired or
/// cancelled session simply disappears and the next message starts at the
/// menu again.
#[derive(Debug, Clone)]
pub struct Session {
    pub stage: ConversationStage,
    pub last_activity: DateTime<Utc>,

    pub document_type: Option<DocumentType>,
    pub document_number: Option<String>,
    pub full_name: Option<String>,
    pub primary_phone: Option<String>,
    pub secondary_phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub insurer: Option<String>,
    pub kind: Option<AppointmentKind>,
    pub appointment_date: Option<NaiveDate>,
    pub doctor: Option<String>,
    pub slot: Option<String>,
    pub email: Option<String>,

    /// Numbered options last shown for doctor selection. Only populated
    /// while the session sits in `AwaitingDoctorSelection`.
    pub options: Vec<AvailableSlot>,

    /// Stages visited on the way here, for ATRÁS navigation. Never contains
    /// `Menu`: popping past the start lands on the menu anyway.
    pub history: Vec<ConversationStage>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            stage: ConversationStage::Menu,
            last_activity: Utc::now(),
            document_type: None,
            document_number: None,
            full_name: None,
            primary_phone: None,
            secondary_phone: None,
            address: None,
            birth_date: None,
            insurer: None,
            kind: None,
            appointment_date: None,
            doctor: None,
            slot: None,
            email: None,
            options: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        Utc::now() - self.last_activity > timeout
    }

    /// Records the current stage before advancing to the next one.
    pub fn remember_stage(&mut self) {
        if self.stage != ConversationStage::Menu {
            self.history.push(self.stage);
        }
    }

    /// Pops the previous stage, falling back to the menu when the history
    /// is exhausted.
    pub fn previous_stage(&mut self) -> ConversationStage {
        self.history.pop().unwrap_or(ConversationStage::Menu)
    }

    /// Back to a pristine menu session: collected fields, options and
    /// history are all dropped.
    pub fn reset(&mut self) {
        let last_activity = self.last_activity;
        *self = Session::new();
        self.last_activity = last_activity;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// The only part of an incoming webhook the bot acts on.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: String,
    pub from: String,
    pub text: String,
}

/// Query string of Meta's GET verification handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Body of the manual send endpoint.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub to: String,
    pub message: String,
}

/// Live counters exposed for operational checks.
#[derive(Debug, Serialize)]
pub struct ChatStats {
    pub active_sessions: usize,
    pub dedup_entries: usize,
}
