use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity document kinds the clinic accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "CC")]
    Cc,
    #[serde(rename = "TI")]
    Ti,
    #[serde(rename = "RC")]
    Rc,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentType::Cc => "CC",
            DocumentType::Ti => "TI",
            DocumentType::Rc => "RC",
        };
        f.write_str(s)
    }
}

impl FromStr for DocumentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CC" => Ok(DocumentType::Cc),
            "TI" => Ok(DocumentType::Ti),
            "RC" => Ok(DocumentType::Rc),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentKind {
    #[serde(rename = "PRIMERA VEZ")]
    FirstVisit,
    #[serde(rename = "CONTROL")]
    FollowUp,
}

impl fmt::Display for AppointmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentKind::FirstVisit => "PRIMERA VEZ",
            AppointmentKind::FollowUp => "CONTROL",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "PROGRAMADA")]
    Scheduled,
    #[serde(rename = "CONFIRMADA")]
    Confirmed,
    #[serde(rename = "CANCELADA")]
    Cancelled,
    #[serde(rename = "COMPLETADA")]
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoctorStatus {
    #[serde(rename = "ACTIVO")]
    Active,
    #[serde(rename = "INACTIVO")]
    Inactive,
}

/// Row in the `pacientes` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub full_name: String,
    #[serde(rename = "tipo_identificacion")]
    pub document_type: Option<DocumentType>,
    #[serde(rename = "numero_identificacion")]
    pub document_number: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    #[serde(rename = "telefono2")]
    pub secondary_phone: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "direccion")]
    pub address: Option<String>,
    #[serde(rename = "fecha_nacimiento")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "eps")]
    pub insurer: Option<String>,
}

/// Row in the `doctores` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "especialidad")]
    pub specialty: String,
    #[serde(rename = "estado")]
    pub status: DoctorStatus,
}

/// Row in the `citas` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    #[serde(rename = "paciente_id")]
    pub patient_id: i64,
    #[serde(rename = "fecha_hora")]
    pub scheduled_at: NaiveDateTime,
    pub doctor: String,
    #[serde(rename = "estado")]
    pub status: AppointmentStatus,
    #[serde(rename = "recordatorio_24h_enviado", default)]
    pub reminder_24h_sent: bool,
    #[serde(rename = "recordatorio_1h_enviado", default)]
    pub reminder_1h_sent: bool,
}

/// Contact subset of a patient embedded in appointment queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientContact {
    #[serde(rename = "nombre")]
    pub full_name: String,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Appointment joined with its patient's contact details, as returned by the
/// PostgREST embed `select=*,pacientes(...)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithPatient {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(rename = "pacientes")]
    pub patient: PatientContact,
}

/// Everything collected by the booking dialogue, enough to get-or-create the
/// patient record and schedule the appointment in one call.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub patient_name: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub phone: String,
    pub secondary_phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub insurer: Option<String>,
    pub kind: AppointmentKind,
    pub scheduled_at: NaiveDateTime,
    pub doctor: String,
    pub email: Option<String>,
}

/// One free (doctor, time-slot) pair for a given date. Generated fresh per
/// availability query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableSlot {
    pub doctor: String,
    pub slot: String,
    pub specialty: String,
}
