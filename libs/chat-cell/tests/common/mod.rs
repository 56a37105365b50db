use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Timelike, Weekday};

use chat_cell::services::flow::FlowEngine;
use chat_cell::services::gateway::MessageSender;
use chat_cell::services::sessions::SessionStore;
use directory_cell::models::{
    Appointment, AppointmentStatus, AppointmentWithPatient, BookingRequest, Doctor, DoctorStatus,
    Patient,
};
use directory_cell::services::store::AppointmentStore;
use notification_cell::Mailer;

/// In-memory store backing the flow tests: a fixed roster, optional
/// pre-seeded patients, and every created booking kept for inspection.
pub struct MemoryStore {
    pub doctors: Vec<Doctor>,
    pub patients: Mutex<Vec<Patient>>,
    pub bookings: Mutex<Vec<Appointment>>,
    pub fail_create: AtomicBool,
}

impl MemoryStore {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self {
            doctors,
            patients: Mutex::new(Vec::new()),
            bookings: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
        }
    }

    pub fn seed_patient(&self, patient: Patient) {
        self.patients.lock().unwrap().push(patient);
    }

    pub fn book(&self, doctor: &str, date: NaiveDate, hour: u32) {
        let mut bookings = self.bookings.lock().unwrap();
        let id = bookings.len() as i64 + 1;
        bookings.push(Appointment {
            id,
            patient_id: 1,
            scheduled_at: date.and_hms_opt(hour, 0, 0).unwrap(),
            doctor: doctor.to_string(),
            status: AppointmentStatus::Scheduled,
            reminder_24h_sent: false,
            reminder_1h_sent: false,
        });
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.lock().unwrap().len()
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn find_patient_by_document(&self, document_number: &str) -> Result<Option<Patient>> {
        Ok(self
            .patients
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.document_number.as_deref() == Some(document_number))
            .cloned())
    }

    async fn active_doctors(&self) -> Result<Vec<Doctor>> {
        Ok(self.doctors.clone())
    }

    async fn booking_at(
        &self,
        doctor: &str,
        date: NaiveDate,
        hour: u32,
    ) -> Result<Option<Appointment>> {
        let bookings = self.bookings.lock().unwrap();
        Ok(bookings
            .iter()
            .find(|b| {
                b.doctor == doctor
                    && b.scheduled_at.date() == date
                    && b.scheduled_at.hour() == hour
                    && b.status != AppointmentStatus::Cancelled
            })
            .cloned())
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<Appointment> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated persistence failure"));
        }
        let mut bookings = self.bookings.lock().unwrap();
        let appointment = Appointment {
            id: bookings.len() as i64 + 1,
            patient_id: 1,
            scheduled_at: request.scheduled_at,
            doctor: request.doctor.clone(),
            status: AppointmentStatus::Scheduled,
            reminder_24h_sent: false,
            reminder_1h_sent: false,
        };
        bookings.push(appointment.clone());
        Ok(appointment)
    }

    async fn list_appointments(&self) -> Result<Vec<AppointmentWithPatient>> {
        Ok(Vec::new())
    }

    async fn cancel_appointment(&self, _id: i64) -> Result<Appointment> {
        unimplemented!("not exercised by flow tests")
    }

    async fn due_reminders(
        &self,
        _from: NaiveDateTime,
        _to: NaiveDateTime,
        _hours_before: u32,
    ) -> Result<Vec<AppointmentWithPatient>> {
        Ok(Vec::new())
    }

    async fn mark_reminder_sent(&self, _id: i64, _hours_before: u32) -> Result<()> {
        Ok(())
    }
}

/// Captures every outbound message instead of calling WhatsApp.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(_, body)| body.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

/// Counts confirmation emails instead of calling Brevo.
#[derive(Default)]
pub struct NullMailer {
    pub confirmations: Mutex<Vec<String>>,
}

#[async_trait]
impl Mailer for NullMailer {
    async fn send_confirmation(
        &self,
        to: &str,
        _patient_name: &str,
        _appointment_kind: &str,
        _doctor: &str,
        _scheduled_at: NaiveDateTime,
    ) -> Result<()> {
        self.confirmations.lock().unwrap().push(to.to_string());
        Ok(())
    }
}

pub fn roster() -> Vec<Doctor> {
    vec![
        Doctor {
            id: 1,
            name: "Santiago".to_string(),
            specialty: "Urología".to_string(),
            status: DoctorStatus::Active,
        },
        Doctor {
            id: 2,
            name: "Valencia".to_string(),
            specialty: "Urología Oncológica".to_string(),
            status: DoctorStatus::Active,
        },
    ]
}

/// A weekday roughly a month out, so date validation always passes.
pub fn future_weekday() -> NaiveDate {
    let mut date = Local::now().date_naive() + Duration::days(30);
    if date.weekday() == Weekday::Sun {
        date += Duration::days(1);
    }
    date
}

pub struct Harness {
    pub engine: FlowEngine,
    pub store: Arc<MemoryStore>,
    pub sender: Arc<RecordingSender>,
    pub mailer: Arc<NullMailer>,
    pub sessions: Arc<SessionStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new(roster())))
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let sessions = Arc::new(SessionStore::new());
        let sender = Arc::new(RecordingSender::new());
        let mailer = Arc::new(NullMailer::default());
        let engine = FlowEngine::new(
            sessions.clone(),
            store.clone(),
            sender.clone(),
            mailer.clone(),
            5,
        );
        Self {
            engine,
            store,
            sender,
            mailer,
            sessions,
        }
    }

    pub async fn say(&self, text: &str) {
        self.engine
            .handle_message("573001234567", text)
            .await
            .unwrap();
    }
}
