use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    Appointment, AppointmentWithPatient, BookingRequest, Doctor, Patient,
};

/// Persistence seam consumed by the availability resolver, the chat flow
/// engine, and the admin handlers. Implemented against Supabase in
/// production and by in-memory fakes in tests.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_patient_by_document(&self, document_number: &str) -> Result<Option<Patient>>;

    /// Active roster, in a stable order (by id).
    async fn active_doctors(&self) -> Result<Vec<Doctor>>;

    /// The non-cancelled booking for (doctor, date, hour), if any.
    async fn booking_at(&self, doctor: &str, date: NaiveDate, hour: u32)
        -> Result<Option<Appointment>>;

    /// Get-or-create the patient, then schedule the appointment.
    async fn create_booking(&self, request: &BookingRequest) -> Result<Appointment>;

    async fn list_appointments(&self) -> Result<Vec<AppointmentWithPatient>>;

    async fn cancel_appointment(&self, id: i64) -> Result<Appointment>;

    /// Upcoming appointments inside [from, to) whose reminder flag for the
    /// given lead time (24 or 1 hours) is still unset.
    async fn due_reminders(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        hours_before: u32,
    ) -> Result<Vec<AppointmentWithPatient>>;

    async fn mark_reminder_sent(&self, id: i64, hours_before: u32) -> Result<()>;
}

fn reminder_flag_column(hours_before: u32) -> &'static str {
    if hours_before == 24 {
        "recordatorio_24h_enviado"
    } else {
        "recordatorio_1h_enviado"
    }
}

pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn get_or_create_patient(&self, request: &BookingRequest) -> Result<Patient> {
        if let Some(existing) = self
            .find_patient_by_document(&request.document_number)
            .await?
        {
            return Ok(existing);
        }

        let row = json!({
            "nombre": request.patient_name,
            "tipo_identificacion": request.document_type,
            "numero_identificacion": request.document_number,
            "telefono": request.phone,
            "telefono2": request.secondary_phone,
            "email": request.email,
            "direccion": request.address,
            "fecha_nacimiento": request.birth_date,
            "eps": request.insurer,
        });

        let patient: Patient = self.supabase.insert("pacientes", row).await?;
        info!("Created patient {} ({})", patient.id, patient.full_name);
        Ok(patient)
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn find_patient_by_document(&self, document_number: &str) -> Result<Option<Patient>> {
        let path = format!(
            "/rest/v1/pacientes?numero_identificacion=eq.{}&limit=1",
            urlencoding::encode(document_number)
        );
        let mut rows: Vec<Patient> = self.supabase.select(&path).await?;
        Ok(rows.pop())
    }

    async fn active_doctors(&self) -> Result<Vec<Doctor>> {
        let path = "/rest/v1/doctores?estado=eq.ACTIVO&order=id.asc";
        self.supabase.select(path).await
    }

    async fn booking_at(
        &self,
        doctor: &str,
        date: NaiveDate,
        hour: u32,
    ) -> Result<Option<Appointment>> {
        let path = format!(
            "/rest/v1/citas?doctor=eq.{}&estado=neq.CANCELADA&fecha_hora=gte.{}T{:02}:00:00&fecha_hora=lt.{}T{:02}:00:00&limit=1",
            urlencoding::encode(doctor),
            date,
            hour,
            date,
            hour + 1
        );
        let mut rows: Vec<Appointment> = self.supabase.select(&path).await?;
        Ok(rows.pop())
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<Appointment> {
        let patient = self.get_or_create_patient(request).await?;

        let row = json!({
            "paciente_id": patient.id,
            "fecha_hora": request.scheduled_at,
            "doctor": request.doctor,
            "estado": "PROGRAMADA",
            "recordatorio_24h_enviado": false,
            "recordatorio_1h_enviado": false,
        });

        let appointment: Appointment = self.supabase.insert("citas", row).await?;
        debug!(
            "Appointment {} scheduled with {} at {}",
            appointment.id, appointment.doctor, appointment.scheduled_at
        );
        Ok(appointment)
    }

    async fn list_appointments(&self) -> Result<Vec<AppointmentWithPatient>> {
        let path =
            "/rest/v1/citas?select=*,pacientes(nombre,telefono,email)&order=fecha_hora.desc";
        self.supabase.select(path).await
    }

    async fn cancel_appointment(&self, id: i64) -> Result<Appointment> {
        let path = format!("/rest/v1/citas?id=eq.{}", id);
        let mut rows: Vec<Appointment> = self
            .supabase
            .update(&path, json!({ "estado": "CANCELADA" }))
            .await?;
        rows.pop()
            .ok_or_else(|| anyhow!("appointment {} not found", id))
    }

    async fn due_reminders(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        hours_before: u32,
    ) -> Result<Vec<AppointmentWithPatient>> {
        let path = format!(
            "/rest/v1/citas?select=*,pacientes(nombre,telefono,email)&estado=in.(PROGRAMADA,CONFIRMADA)&{}=eq.false&fecha_hora=gte.{}&fecha_hora=lt.{}",
            reminder_flag_column(hours_before),
            from.format("%Y-%m-%dT%H:%M:%S"),
            to.format("%Y-%m-%dT%H:%M:%S")
        );
        self.supabase.select(&path).await
    }

    async fn mark_reminder_sent(&self, id: i64, hours_before: u32) -> Result<()> {
        let path = format!("/rest/v1/citas?id=eq.{}", id);
        let _: Vec<Appointment> = self
            .supabase
            .update(&path, json!({ reminder_flag_column(hours_before): true }))
            .await?;
        Ok(())
    }
}
