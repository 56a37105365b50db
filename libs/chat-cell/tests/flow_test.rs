mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{Datelike, Duration, Utc, Weekday};

use chat_cell::models::ConversationStage;
use directory_cell::models::Patient;

use common::{future_weekday, roster, Harness, MemoryStore};

const SENDER: &str = "573001234567";

async fn walk_to_date_prompt(harness: &Harness) {
    harness.say("Hola").await;
    harness.say("1").await;
    harness.say("CC").await;
    harness.say("12345678").await;
    harness.say("Ana María Gómez").await;
    harness.say("3001234567").await;
    harness.say("OMITIR").await;
    harness.say("Calle 5 # 10-20, Popayán").await;
    harness.say("25-03-1990").await;
    harness.say("Sanitas").await;
    harness.say("1").await;
}

#[tokio::test]
async fn new_patient_books_end_to_end() {
    let harness = Harness::new();
    let date = future_weekday();

    walk_to_date_prompt(&harness).await;
    harness.say(&date.format("%d-%m-%Y").to_string()).await;

    // Doctor-major listing: option 1 is the first doctor's earliest slot.
    let listing = harness.sender.last();
    assert!(listing.contains("1. Dr. Santiago - Urología - 08:00"));

    harness.say("1").await;
    harness.say("ana@example.com").await;
    assert!(harness.sender.last().contains("Resumen de tu cita"));

    harness.say("SI").await;

    assert_eq!(harness.store.booking_count(), 1);
    let booking = harness.store.bookings.lock().unwrap()[0].clone();
    assert_eq!(booking.doctor, "Santiago");
    assert_eq!(booking.scheduled_at, date.and_hms_opt(8, 0, 0).unwrap());

    assert!(harness.sender.last().contains("Tu cita quedó agendada"));
    assert_eq!(
        harness.mailer.confirmations.lock().unwrap().as_slice(),
        ["ana@example.com"]
    );
    // Finished conversations leave no session behind.
    assert_eq!(harness.sessions.len().await, 0);
}

#[tokio::test]
async fn known_patient_skips_registration() {
    let store = Arc::new(MemoryStore::new(roster()));
    store.seed_patient(Patient {
        id: 1,
        full_name: "Carlos Ruiz".to_string(),
        document_type: None,
        document_number: Some("87654321".to_string()),
        phone: Some("3009876543".to_string()),
        secondary_phone: None,
        email: None,
        address: Some("Carrera 9 # 4-56".to_string()),
        birth_date: chrono::NaiveDate::from_ymd_opt(1985, 6, 1),
        insurer: Some("Coosalud".to_string()),
    });
    let harness = Harness::with_store(store);

    harness.say("1").await;
    harness.say("CC").await;
    harness.say("87654321").await;

    // Straight to phone confirmation, no name question.
    assert!(harness.sender.last().contains("3009876543"));

    harness.say("3009876543").await;
    let session = harness.sessions.get_or_create(SENDER).await;
    let guard = session.lock().await;
    // The name step was skipped; the prefilled fields are already present.
    assert_eq!(guard.stage, ConversationStage::AwaitingSecondaryPhone);
    assert_eq!(guard.full_name.as_deref(), Some("Carlos Ruiz"));
    assert_eq!(guard.insurer.as_deref(), Some("Coosalud"));
}

#[tokio::test]
async fn cancelar_drops_the_session_at_any_stage() {
    let harness = Harness::new();

    harness.say("1").await;
    harness.say("CC").await;
    harness.say("CANCELAR").await;

    assert!(harness.sender.last().contains("Proceso cancelado"));
    assert_eq!(harness.sessions.len().await, 0);
    assert_eq!(harness.store.booking_count(), 0);
}

#[tokio::test]
async fn sundays_are_rejected() {
    let harness = Harness::new();
    walk_to_date_prompt(&harness).await;

    let mut sunday = future_weekday();
    while sunday.weekday() != Weekday::Sun {
        sunday += Duration::days(1);
    }
    harness.say(&sunday.format("%d-%m-%Y").to_string()).await;

    assert!(harness.sender.last().contains("domingos"));

    // The stage survives the rejection; a valid date still works.
    let date = future_weekday();
    harness.say(&date.format("%d-%m-%Y").to_string()).await;
    assert!(harness.sender.last().contains("Horarios disponibles"));
}

#[tokio::test]
async fn past_dates_are_rejected() {
    let harness = Harness::new();
    walk_to_date_prompt(&harness).await;

    harness.say("15-03-2020").await;
    assert!(harness.sender.last().contains("hoy o en el futuro"));
}

#[tokio::test]
async fn out_of_range_selection_keeps_the_options() {
    let harness = Harness::new();
    let date = future_weekday();
    walk_to_date_prompt(&harness).await;
    harness.say(&date.format("%d-%m-%Y").to_string()).await;

    harness.say("99").await;
    assert!(harness.sender.last().contains("fuera de rango"));

    harness.say("1").await;
    assert!(harness.sender.last().contains("correo"));
}

#[tokio::test]
async fn invalid_document_number_keeps_the_stage() {
    let harness = Harness::new();
    harness.say("1").await;
    harness.say("CC").await;

    harness.say("12").await;
    assert!(harness.sender.last().contains("inválido"));

    harness.say("12345678").await;
    assert!(harness.sender.last().contains("nombre completo"));
}

#[tokio::test]
async fn atras_steps_back_and_bottoms_out_at_the_menu() {
    let harness = Harness::new();
    harness.say("1").await;
    harness.say("CC").await;

    // At document number; one step back re-asks the document type.
    harness.say("ATRAS").await;
    assert!(harness.sender.last().contains("tipo de documento"));

    // History exhausted; the next step back lands on the menu.
    harness.say("ATRÁS").await;
    assert!(harness.sender.last().contains("Bienvenido"));
}

#[tokio::test]
async fn atras_from_doctor_selection_returns_to_the_date() {
    let harness = Harness::new();
    let date = future_weekday();
    walk_to_date_prompt(&harness).await;
    harness.say(&date.format("%d-%m-%Y").to_string()).await;

    harness.say("VOLVER").await;
    assert!(harness.sender.last().contains("fecha deseada"));

    let session = harness.sessions.get_or_create(SENDER).await;
    let guard = session.lock().await;
    assert_eq!(guard.stage, ConversationStage::AwaitingAppointmentDate);
    assert!(guard.options.is_empty());
}

#[tokio::test]
async fn inicio_restarts_with_a_clean_slate() {
    let harness = Harness::new();
    harness.say("1").await;
    harness.say("CC").await;
    harness.say("12345678").await;

    harness.say("INICIO").await;
    assert!(harness.sender.last().contains("Bienvenido"));

    let session = harness.sessions.get_or_create(SENDER).await;
    let guard = session.lock().await;
    assert_eq!(guard.stage, ConversationStage::Menu);
    assert!(guard.document_number.is_none());
    assert!(guard.history.is_empty());
}

#[tokio::test]
async fn booked_slot_disappears_from_the_listing() {
    let store = Arc::new(MemoryStore::new(roster()));
    let date = future_weekday();
    store.book("Santiago", date, 8);
    let harness = Harness::with_store(store);

    walk_to_date_prompt(&harness).await;
    harness.say(&date.format("%d-%m-%Y").to_string()).await;

    let listing = harness.sender.last();
    assert!(!listing.contains("Dr. Santiago - Urología - 08:00"));
    assert!(listing.contains("1. Dr. Santiago - Urología - 09:00"));
}

#[tokio::test]
async fn persistence_failure_is_reported_and_session_removed() {
    let harness = Harness::new();
    let date = future_weekday();
    walk_to_date_prompt(&harness).await;
    harness.say(&date.format("%d-%m-%Y").to_string()).await;
    harness.say("1").await;
    harness.say("OMITIR").await;

    harness.store.fail_create.store(true, Ordering::SeqCst);
    harness.say("SI").await;

    assert!(harness.sender.last().contains("error al agendar"));
    assert_eq!(harness.store.booking_count(), 0);
    assert_eq!(harness.sessions.len().await, 0);
}

#[tokio::test]
async fn declining_the_summary_cancels() {
    let harness = Harness::new();
    let date = future_weekday();
    walk_to_date_prompt(&harness).await;
    harness.say(&date.format("%d-%m-%Y").to_string()).await;
    harness.say("1").await;
    harness.say("OMITIR").await;

    harness.say("NO").await;

    assert!(harness.sender.last().contains("Proceso cancelado"));
    assert_eq!(harness.store.booking_count(), 0);
}

#[tokio::test]
async fn expired_session_restarts_at_the_menu() {
    let harness = Harness::new();
    harness.say("1").await;

    {
        let session = harness.sessions.get_or_create(SENDER).await;
        session.lock().await.last_activity = Utc::now() - Duration::minutes(10);
    }

    // Timeout is 5 minutes; the stale document-type answer lands on a
    // fresh menu session instead.
    harness.say("CC").await;
    assert!(harness.sender.last().contains("Bienvenido"));
}

#[tokio::test]
async fn surgery_info_ends_the_conversation() {
    let harness = Harness::new();
    harness.say("2").await;

    assert!(harness.sender.last().contains("Cirugías"));
    assert_eq!(harness.sessions.len().await, 0);
}
