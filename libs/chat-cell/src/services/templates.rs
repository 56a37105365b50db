//! User-facing message texts. Everything the bot says lives here so the
//! flow engine stays readable and the wording stays consistent.

use chrono::NaiveDate;

use directory_cell::models::{AvailableSlot, DocumentType};

use crate::models::{ConversationStage, Session};

pub fn menu() -> String {
    "👋 ¡Bienvenido a la Sociedad Urológica del Cauca!\n\n\
     Selecciona una opción:\n\n\
     1️⃣ Agendar una cita\n\
     2️⃣ Información sobre cirugías y procedimientos\n\n\
     Responde con el número de la opción.\n\n\
     ℹ️ En cualquier momento puedes escribir:\n\
     ATRÁS para volver al paso anterior\n\
     CANCELAR para cancelar el proceso\n\
     INICIO para volver al menú principal"
        .to_string()
}

pub fn surgery_info() -> String {
    "🏥 *Cirugías y procedimientos*\n\n\
     Para información sobre cirugías, procedimientos y autorizaciones, \
     comunícate directamente con nuestra línea de atención:\n\n\
     📞 3013188696\n\n\
     Horario de atención: lunes a viernes de 8:00 AM a 5:00 PM."
        .to_string()
}

pub fn document_type_prompt() -> String {
    "🪪 ¿Cuál es tu tipo de documento?\n\n\
     Responde:\n\
     CC - Cédula de ciudadanía\n\
     TI - Tarjeta de identidad\n\
     RC - Registro civil"
        .to_string()
}

pub fn document_number_prompt(document_type: DocumentType) -> String {
    format!(
        "🔢 Escribe tu número de documento ({}), sin puntos ni espacios:",
        document_type
    )
}

pub fn known_patient_notice(name: &str) -> String {
    format!(
        "✅ Hemos encontrado tu información previa, {}. No necesitas registrar tus datos de nuevo.",
        name
    )
}

pub fn known_patient_phone_prompt(current_phone: Option<&str>) -> String {
    match current_phone {
        Some(phone) if !phone.is_empty() => format!(
            "📱 Tu número registrado es {}. Escribe tu número de celular actual para confirmarlo o actualizarlo:",
            phone
        ),
        _ => "📱 Escribe tu número de celular (10 dígitos, empieza por 3):".to_string(),
    }
}

pub fn name_prompt() -> String {
    "👤 Escribe tu nombre completo:".to_string()
}

pub fn primary_phone_prompt() -> String {
    "📱 Escribe tu número de celular (10 dígitos, empieza por 3):".to_string()
}

pub fn secondary_phone_prompt() -> String {
    "📱 Escribe un número de celular alternativo, o responde OMITIR si no tienes:".to_string()
}

pub fn address_prompt() -> String {
    "🏠 Escribe tu dirección de residencia (mínimo 10 caracteres):".to_string()
}

pub fn birthdate_prompt() -> String {
    "🎂 Escribe tu fecha de nacimiento en formato DD-MM-AAAA (ejemplo: 25-03-1990):".to_string()
}

pub fn insurer_prompt() -> String {
    "🏥 ¿Cuál es tu EPS o aseguradora?".to_string()
}

pub fn kind_prompt() -> String {
    "📋 ¿Qué tipo de cita necesitas?\n\n\
     1️⃣ Primera vez\n\
     2️⃣ Control\n\n\
     Responde con el número de la opción."
        .to_string()
}

pub fn date_prompt() -> String {
    "📅 Escribe la fecha deseada para tu cita en formato DD-MM-AAAA (ejemplo: 15-03-2026).\n\n\
     Atendemos de lunes a sábado."
        .to_string()
}

/// Numbered doctor/slot listing. The 1-based numbers the user replies with
/// index straight into the options the session stored.
pub fn doctor_selection(date: NaiveDate, options: &[AvailableSlot]) -> String {
    let mut text = format!(
        "👨‍⚕️ Horarios disponibles para el {}:\n\n",
        date.format("%d/%m/%Y")
    );
    for (index, option) in options.iter().enumerate() {
        text.push_str(&format!(
            "{}. Dr. {} - {} - {}\n",
            index + 1,
            option.doctor,
            option.specialty,
            option.slot
        ));
    }
    text.push_str("\nResponde con el número de la opción que prefieras.");
    text
}

pub fn email_prompt() -> String {
    "📧 Escribe tu correo electrónico para enviarte la confirmación, o responde OMITIR:"
        .to_string()
}

fn field_or_default(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "No registrado",
    }
}

/// Summary shown before final confirmation, built from whatever the session
/// collected (pre-filled patients may be missing optional fields).
pub fn booking_summary(session: &Session) -> String {
    let document = match (session.document_type, session.document_number.as_deref()) {
        (Some(doc_type), Some(number)) => format!("{}: {}", doc_type, number),
        _ => "No registrado".to_string(),
    };
    let birth_date = session
        .birth_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "No registrado".to_string());
    let kind = session
        .kind
        .map(|k| k.to_string())
        .unwrap_or_else(|| "No registrado".to_string());
    let date = session
        .appointment_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "No registrado".to_string());

    let mut text = format!(
        "📝 *Resumen de tu cita*\n\n\
         👤 Nombre: {}\n\
         🪪 Documento: {}\n\
         📱 Celular: {}\n",
        field_or_default(session.full_name.as_deref()),
        document,
        field_or_default(session.primary_phone.as_deref()),
    );
    if let Some(secondary) = session.secondary_phone.as_deref() {
        text.push_str(&format!("📱 Celular alternativo: {}\n", secondary));
    }
    text.push_str(&format!(
        "🏠 Dirección: {}\n\
         🎂 Fecha de nacimiento: {}\n\
         🏥 EPS: {}\n\
         📋 Tipo de cita: {}\n\
         📅 Fecha: {}\n\
         🕐 Hora: {}\n\
         👨‍⚕️ Doctor: Dr. {}\n\
         📧 Correo: {}\n\n\
         ¿Confirmas tu cita? Responde SI para confirmar o NO para cancelar.",
        field_or_default(session.address.as_deref()),
        birth_date,
        field_or_default(session.insurer.as_deref()),
        kind,
        date,
        field_or_default(session.slot.as_deref()),
        field_or_default(session.doctor.as_deref()),
        field_or_default(session.email.as_deref()),
    ));
    text
}

pub fn booking_confirmed(name: &str, date: NaiveDate, slot: &str, doctor: &str) -> String {
    format!(
        "✅ ¡Listo, {}! Tu cita quedó agendada.\n\n\
         📅 Fecha: {}\n\
         🕐 Hora: {}\n\
         👨‍⚕️ Doctor: Dr. {}\n\n\
         Te enviaremos recordatorios antes de tu cita. \
         Si necesitas reagendar, comunícate al 3013188696.",
        name,
        date.format("%d/%m/%Y"),
        slot,
        doctor
    )
}

pub fn cancellation_ack() -> String {
    "❌ Proceso cancelado. Envía cualquier mensaje cuando quieras empezar de nuevo.".to_string()
}

pub fn going_back() -> String {
    "↩️ Volviendo al paso anterior...".to_string()
}

pub fn reminder(name: &str, date: NaiveDate, slot: &str, doctor: &str, hours_before: u32) -> String {
    let lead = if hours_before == 24 {
        "mañana"
    } else {
        "en 1 hora"
    };
    format!(
        "🔔 Hola {}, te recordamos tu cita {}:\n\n\
         📅 Fecha: {}\n\
         🕐 Hora: {}\n\
         👨‍⚕️ Doctor: Dr. {}\n\n\
         Si no puedes asistir, comunícate al 3013188696.",
        name,
        lead,
        date.format("%d/%m/%Y"),
        slot,
        doctor
    )
}

/// Prompt to repeat after ATRÁS navigation. Doctor selection is handled by
/// the flow engine because it needs the stored options; the menu doubles as
/// the fallback for stages with no stored prompt.
pub fn stage_prompt(stage: ConversationStage) -> String {
    match stage {
        ConversationStage::AwaitingDocumentType => document_type_prompt(),
        ConversationStage::AwaitingDocumentNumber => {
            "🔢 Escribe tu número de documento, sin puntos ni espacios:".to_string()
        }
        ConversationStage::AwaitingName => name_prompt(),
        ConversationStage::AwaitingPrimaryPhone => primary_phone_prompt(),
        ConversationStage::AwaitingSecondaryPhone => secondary_phone_prompt(),
        ConversationStage::AwaitingAddress => address_prompt(),
        ConversationStage::AwaitingBirthDate => birthdate_prompt(),
        ConversationStage::AwaitingInsurer => insurer_prompt(),
        ConversationStage::AwaitingAppointmentKind => kind_prompt(),
        ConversationStage::AwaitingAppointmentDate => date_prompt(),
        _ => menu(),
    }
}
