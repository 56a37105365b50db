use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, Weekday};
use tracing::{error, info, warn};

use directory_cell::models::{AppointmentKind, BookingRequest, DocumentType};
use directory_cell::services::availability::AvailabilityService;
use directory_cell::services::store::AppointmentStore;
use notification_cell::Mailer;
use shared_utils::validators;

use crate::models::{ConversationStage, Session};
use crate::services::gateway::MessageSender;
use crate::services::sessions::SessionStore;
use crate::services::templates;

/// Drives the booking dialogue: one call per inbound message, with the
/// sender's session locked for the whole call so messages from the same
/// number are handled strictly one at a time.
pub struct FlowEngine {
    sessions: Arc<SessionStore>,
    store: Arc<dyn AppointmentStore>,
    availability: AvailabilityService,
    sender: Arc<dyn MessageSender>,
    mailer: Arc<dyn Mailer>,
    session_timeout: Duration,
}

impl FlowEngine {
    pub fn new(
        sessions: Arc<SessionStore>,
        store: Arc<dyn AppointmentStore>,
        sender: Arc<dyn MessageSender>,
        mailer: Arc<dyn Mailer>,
        timeout_minutes: i64,
    ) -> Self {
        Self {
            sessions,
            availability: AvailabilityService::new(store.clone()),
            store,
            sender,
            mailer,
            session_timeout: Duration::minutes(timeout_minutes),
        }
    }

    pub fn sessions(&self) -> Arc<SessionStore> {
        self.sessions.clone()
    }

    pub async fn handle_message(&self, from: &str, text: &str) -> Result<()> {
        self.sessions.sweep_expired(self.session_timeout).await;

        let session = self.sessions.get_or_create(from).await;
        let mut session = session.lock().await;

        if session.is_expired(self.session_timeout) {
            info!("Session for {} expired, restarting at the menu", from);
            session.reset();
        }
        session.touch();

        let normalized = text.trim().to_uppercase();
        info!("Message from {} at stage {:?}", from, session.stage);

        if self.handle_global_command(from, &normalized, &mut session).await? {
            return Ok(());
        }
        self.dispatch(from, text.trim(), &normalized, &mut session).await
    }

    /// ATRÁS / CANCELAR / INICIO work at every stage and win over the
    /// stage handler.
    async fn handle_global_command(
        &self,
        from: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<bool> {
        match normalized {
            "ATRÁS" | "ATRAS" | "VOLVER" => {
                if session.stage == ConversationStage::Menu {
                    self.sender.send_text(from, &templates::menu()).await?;
                    return Ok(true);
                }
                session.stage = session.previous_stage();
                if session.stage != ConversationStage::AwaitingDoctorSelection {
                    session.options.clear();
                }
                self.sender.send_text(from, &templates::going_back()).await?;
                self.resend_prompt(from, session).await?;
                Ok(true)
            }
            "CANCELAR" => {
                self.sessions.remove(from).await;
                self.sender
                    .send_text(from, &templates::cancellation_ack())
                    .await?;
                Ok(true)
            }
            "INICIO" | "MENU" | "MENÚ" => {
                session.reset();
                self.sender.send_text(from, &templates::menu()).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Repeats the question for the stage landed on after ATRÁS. Doctor
    /// selection re-resolves availability when the options were cleared on
    /// the way forward.
    async fn resend_prompt(&self, from: &str, session: &mut Session) -> Result<()> {
        if session.stage != ConversationStage::AwaitingDoctorSelection {
            let prompt = templates::stage_prompt(session.stage);
            return self.sender.send_text(from, &prompt).await;
        }

        let Some(date) = session.appointment_date else {
            session.stage = ConversationStage::Menu;
            return self.sender.send_text(from, &templates::menu()).await;
        };

        if session.options.is_empty() {
            match self.availability.available_slots(date).await {
                Ok(options) if !options.is_empty() => session.options = options,
                Ok(_) => {
                    session.stage = ConversationStage::AwaitingAppointmentDate;
                    return self
                        .sender
                        .send_text(
                            from,
                            "⚠️ Ya no hay horarios disponibles para esa fecha. Por favor escribe otra fecha (DD-MM-AAAA).",
                        )
                        .await;
                }
                Err(e) => {
                    error!("Availability lookup failed for {}: {:#}", date, e);
                    session.stage = ConversationStage::AwaitingAppointmentDate;
                    return self
                        .sender
                        .send_text(
                            from,
                            "⚠️ Error al consultar disponibilidad. Por favor escribe la fecha nuevamente.",
                        )
                        .await;
                }
            }
        }

        let listing = templates::doctor_selection(date, &session.options);
        self.sender.send_text(from, &listing).await
    }

    async fn dispatch(
        &self,
        from: &str,
        text: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<()> {
        match session.stage {
            ConversationStage::Menu => self.on_menu(from, normalized, session).await,
            ConversationStage::AwaitingDocumentType => {
                self.on_document_type(from, normalized, session).await
            }
            ConversationStage::AwaitingDocumentNumber => {
                self.on_document_number(from, normalized, session).await
            }
            ConversationStage::AwaitingName => self.on_name(from, text, session).await,
            ConversationStage::AwaitingPrimaryPhone => {
                self.on_primary_phone(from, normalized, session).await
            }
            ConversationStage::AwaitingSecondaryPhone => {
                self.on_secondary_phone(from, normalized, session).await
            }
            ConversationStage::AwaitingAddress => self.on_address(from, text, session).await,
            ConversationStage::AwaitingBirthDate => {
                self.on_birth_date(from, normalized, session).await
            }
            ConversationStage::AwaitingInsurer => self.on_insurer(from, text, session).await,
            ConversationStage::AwaitingAppointmentKind => {
                self.on_appointment_kind(from, normalized, session).await
            }
            ConversationStage::AwaitingAppointmentDate => {
                self.on_appointment_date(from, normalized, session).await
            }
            ConversationStage::AwaitingDoctorSelection => {
                self.on_doctor_selection(from, normalized, session).await
            }
            ConversationStage::AwaitingEmail => self.on_email(from, text, session).await,
            ConversationStage::FinalConfirmation => {
                self.on_final_confirmation(from, normalized, session).await
            }
        }
    }

    async fn on_menu(&self, from: &str, normalized: &str, session: &mut Session) -> Result<()> {
        if normalized.contains('1') || normalized.contains("CITA") || normalized.contains("AGENDAR")
        {
            session.remember_stage();
            session.stage = ConversationStage::AwaitingDocumentType;
            return self
                .sender
                .send_text(from, &templates::document_type_prompt())
                .await;
        }
        if normalized.contains('2')
            || normalized.contains("CIRUGÍA")
            || normalized.contains("CIRUGIA")
            || normalized.contains("PROCEDIMIENTO")
        {
            self.sender.send_text(from, &templates::surgery_info()).await?;
            self.sessions.remove(from).await;
            return Ok(());
        }
        self.sender.send_text(from, &templates::menu()).await
    }

    async fn on_document_type(
        &self,
        from: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<()> {
        let Ok(document_type) = DocumentType::from_str(normalized) else {
            return self
                .sender
                .send_text(from, "⚠️ Opción inválida. Responde CC, TI o RC.")
                .await;
        };
        session.document_type = Some(document_type);
        session.remember_stage();
        session.stage = ConversationStage::AwaitingDocumentNumber;
        self.sender
            .send_text(from, &templates::document_number_prompt(document_type))
            .await
    }

    async fn on_document_number(
        &self,
        from: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<()> {
        let number: String = normalized
            .chars()
            .filter(|c| !matches!(c, '.' | ' ' | '-'))
            .collect();

        let valid = match session.document_type {
            Some(DocumentType::Cc) => validators::valid_cc(&number),
            Some(DocumentType::Ti) => validators::valid_ti(&number),
            Some(DocumentType::Rc) => validators::valid_rc(&number),
            None => false,
        };
        if !valid {
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ Número de documento inválido. Escríbelo de nuevo, solo dígitos, sin puntos ni espacios.",
                )
                .await;
        }

        session.document_number = Some(number.clone());

        match self.store.find_patient_by_document(&number).await {
            Ok(Some(patient)) => {
                session.full_name = Some(patient.full_name.clone());
                session.address = patient.address.clone();
                session.birth_date = patient.birth_date;
                session.insurer = patient.insurer.clone();
                session.secondary_phone = patient.secondary_phone.clone();
                session.email = patient.email.clone();

                self.sender
                    .send_text(from, &templates::known_patient_notice(&patient.full_name))
                    .await?;
                session.remember_stage();
                session.stage = ConversationStage::AwaitingPrimaryPhone;
                self.sender
                    .send_text(
                        from,
                        &templates::known_patient_phone_prompt(patient.phone.as_deref()),
                    )
                    .await
            }
            Ok(None) => {
                session.remember_stage();
                session.stage = ConversationStage::AwaitingName;
                self.sender.send_text(from, &templates::name_prompt()).await
            }
            Err(e) => {
                error!("Patient lookup failed for {}: {:#}", from, e);
                self.sender
                    .send_text(
                        from,
                        "⚠️ No pudimos verificar tu documento en este momento. Por favor escríbelo de nuevo.",
                    )
                    .await
            }
        }
    }

    async fn on_name(&self, from: &str, text: &str, session: &mut Session) -> Result<()> {
        if text.chars().count() < 3 {
            return self
                .sender
                .send_text(from, "⚠️ El nombre es demasiado corto. Escribe tu nombre completo.")
                .await;
        }
        session.full_name = Some(text.to_string());
        session.remember_stage();
        session.stage = ConversationStage::AwaitingPrimaryPhone;
        self.sender
            .send_text(from, &templates::primary_phone_prompt())
            .await
    }

    async fn on_primary_phone(
        &self,
        from: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<()> {
        if !validators::valid_colombian_mobile(normalized) {
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ Número de celular inválido. Debe tener 10 dígitos y empezar por 3.",
                )
                .await;
        }
        session.primary_phone = Some(validators::strip_phone(normalized));
        session.remember_stage();
        session.stage = ConversationStage::AwaitingSecondaryPhone;
        self.sender
            .send_text(from, &templates::secondary_phone_prompt())
            .await
    }

    async fn on_secondary_phone(
        &self,
        from: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<()> {
        if normalized == "OMITIR" || normalized == "SALTAR" || normalized == "NO" {
            session.secondary_phone = None;
        } else if validators::valid_colombian_mobile(normalized) {
            session.secondary_phone = Some(validators::strip_phone(normalized));
        } else {
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ Número inválido. Escribe un celular de 10 dígitos que empiece por 3, o responde OMITIR.",
                )
                .await;
        }
        session.remember_stage();
        session.stage = ConversationStage::AwaitingAddress;
        self.sender.send_text(from, &templates::address_prompt()).await
    }

    async fn on_address(&self, from: &str, text: &str, session: &mut Session) -> Result<()> {
        if text.chars().count() < 10 {
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ La dirección es demasiado corta. Escríbela completa (mínimo 10 caracteres).",
                )
                .await;
        }
        session.address = Some(text.to_string());
        session.remember_stage();
        session.stage = ConversationStage::AwaitingBirthDate;
        self.sender
            .send_text(from, &templates::birthdate_prompt())
            .await
    }

    async fn on_birth_date(
        &self,
        from: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<()> {
        let Some(birth_date) = validators::parse_birthdate(normalized) else {
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ Fecha inválida. Usa el formato DD-MM-AAAA y recuerda que debes ser mayor de edad.",
                )
                .await;
        };
        session.birth_date = Some(birth_date);
        session.remember_stage();
        session.stage = ConversationStage::AwaitingInsurer;
        self.sender.send_text(from, &templates::insurer_prompt()).await
    }

    async fn on_insurer(&self, from: &str, text: &str, session: &mut Session) -> Result<()> {
        if text.chars().count() < 3 {
            return self
                .sender
                .send_text(from, "⚠️ Escribe el nombre completo de tu EPS o aseguradora.")
                .await;
        }
        session.insurer = Some(text.to_string());
        session.remember_stage();
        session.stage = ConversationStage::AwaitingAppointmentKind;
        self.sender.send_text(from, &templates::kind_prompt()).await
    }

    async fn on_appointment_kind(
        &self,
        from: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<()> {
        let kind = match normalized {
            "1" => AppointmentKind::FirstVisit,
            "2" => AppointmentKind::FollowUp,
            _ => {
                return self
                    .sender
                    .send_text(from, "⚠️ Responde 1 para primera vez o 2 para control.")
                    .await;
            }
        };
        session.kind = Some(kind);
        session.remember_stage();
        session.stage = ConversationStage::AwaitingAppointmentDate;
        self.sender.send_text(from, &templates::date_prompt()).await
    }

    async fn on_appointment_date(
        &self,
        from: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<()> {
        let Ok(date) = NaiveDate::parse_from_str(normalized, "%d-%m-%Y") else {
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ Fecha inválida. Usa el formato DD-MM-AAAA (ejemplo: 15-03-2026).",
                )
                .await;
        };
        if date < Local::now().date_naive() {
            return self
                .sender
                .send_text(from, "⚠️ La fecha debe ser hoy o en el futuro. Escribe otra fecha.")
                .await;
        }
        if date.weekday() == Weekday::Sun {
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ No atendemos los domingos. Escribe una fecha de lunes a sábado.",
                )
                .await;
        }

        let options = match self.availability.available_slots(date).await {
            Ok(options) => options,
            Err(e) => {
                error!("Availability lookup failed for {}: {:#}", date, e);
                return self
                    .sender
                    .send_text(
                        from,
                        "⚠️ Error al consultar disponibilidad. Por favor escribe la fecha nuevamente.",
                    )
                    .await;
            }
        };
        if options.is_empty() {
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ No hay doctores disponibles para esa fecha. Por favor escribe otra fecha.",
                )
                .await;
        }

        session.appointment_date = Some(date);
        session.options = options;
        session.remember_stage();
        session.stage = ConversationStage::AwaitingDoctorSelection;
        let listing = templates::doctor_selection(date, &session.options);
        self.sender.send_text(from, &listing).await
    }

    async fn on_doctor_selection(
        &self,
        from: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<()> {
        if session.options.is_empty() {
            warn!("Doctor selection for {} with no stored options", from);
            self.sessions.remove(from).await;
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ Tu sesión quedó incompleta. Envía cualquier mensaje para iniciar de nuevo.",
                )
                .await;
        }

        let Ok(choice) = normalized.parse::<usize>() else {
            return self
                .sender
                .send_text(from, "⚠️ Responde con el número de la opción que prefieras.")
                .await;
        };
        if choice == 0 || choice > session.options.len() {
            return self
                .sender
                .send_text(
                    from,
                    &format!("⚠️ Opción fuera de rango. Responde un número entre 1 y {}.", session.options.len()),
                )
                .await;
        }

        let selected = session.options[choice - 1].clone();
        session.doctor = Some(selected.doctor);
        session.slot = Some(selected.slot);
        session.options.clear();
        session.remember_stage();
        session.stage = ConversationStage::AwaitingEmail;
        self.sender.send_text(from, &templates::email_prompt()).await
    }

    async fn on_email(&self, from: &str, text: &str, session: &mut Session) -> Result<()> {
        let normalized = text.to_uppercase();
        if normalized == "OMITIR" || normalized == "SALTAR" || normalized == "NO" {
            session.email = None;
        } else if validators::valid_email(text) {
            session.email = Some(text.to_string());
        } else {
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ Correo inválido. Escribe un correo válido o responde OMITIR.",
                )
                .await;
        }
        session.remember_stage();
        session.stage = ConversationStage::FinalConfirmation;
        self.sender
            .send_text(from, &templates::booking_summary(session))
            .await
    }

    async fn on_final_confirmation(
        &self,
        from: &str,
        normalized: &str,
        session: &mut Session,
    ) -> Result<()> {
        match normalized {
            "SI" | "SÍ" | "1" | "CONFIRMAR" => {
                self.create_booking(from, session).await?;
                self.sessions.remove(from).await;
                Ok(())
            }
            "NO" | "2" => {
                self.sessions.remove(from).await;
                self.sender
                    .send_text(from, &templates::cancellation_ack())
                    .await
            }
            _ => {
                self.sender
                    .send_text(from, "⚠️ Responde SI para confirmar o NO para cancelar.")
                    .await
            }
        }
    }

    async fn create_booking(&self, from: &str, session: &Session) -> Result<()> {
        let Some(request) = booking_request(session) else {
            warn!("Confirmation from {} with incomplete session", from);
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ Tu sesión quedó incompleta. Envía cualquier mensaje para iniciar de nuevo.",
                )
                .await;
        };

        if request.scheduled_at <= Local::now().naive_local() {
            return self
                .sender
                .send_text(
                    from,
                    "⚠️ La fecha y hora de la cita ya pasaron. Envía cualquier mensaje para iniciar de nuevo.",
                )
                .await;
        }

        match self.store.create_booking(&request).await {
            Ok(appointment) => {
                info!(
                    "Appointment {} booked for {} with {}",
                    appointment.id, from, appointment.doctor
                );
                let date = request.scheduled_at.date();
                let slot = request.scheduled_at.format("%H:%M").to_string();
                self.sender
                    .send_text(
                        from,
                        &templates::booking_confirmed(
                            &request.patient_name,
                            date,
                            &slot,
                            &request.doctor,
                        ),
                    )
                    .await?;

                if let Some(email) = request.email.as_deref().filter(|e| !e.is_empty()) {
                    if let Err(e) = self
                        .mailer
                        .send_confirmation(
                            email,
                            &request.patient_name,
                            &request.kind.to_string(),
                            &request.doctor,
                            request.scheduled_at,
                        )
                        .await
                    {
                        error!("Confirmation email to {} failed: {:#}", email, e);
                    }
                }
                Ok(())
            }
            Err(e) => {
                error!("Booking for {} failed: {:#}", from, e);
                self.sender
                    .send_text(
                        from,
                        "❌ Hubo un error al agendar tu cita. Envía cualquier mensaje para intentarlo de nuevo.",
                    )
                    .await
            }
        }
    }
}

/// Assembles the persistence request from a finished session. `None` when a
/// required field is missing, which only happens if state was tampered with
/// or lost mid-flow.
fn booking_request(session: &Session) -> Option<BookingRequest> {
    let slot = session.slot.as_deref()?;
    let time = NaiveTime::parse_from_str(slot, "%H:%M").ok()?;
    let scheduled_at = session.appointment_date?.and_time(time);

    Some(BookingRequest {
        patient_name: session.full_name.clone()?,
        document_type: session.document_type?,
        document_number: session.document_number.clone()?,
        phone: session.primary_phone.clone()?,
        secondary_phone: session.secondary_phone.clone(),
        address: session.address.clone(),
        birth_date: session.birth_date,
        insurer: session.insurer.clone(),
        kind: session.kind?,
        scheduled_at,
        doctor: session.doctor.clone()?,
        email: session.email.clone(),
    })
}
