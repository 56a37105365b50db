use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Local};
use tracing::{error, info, warn};

use directory_cell::services::store::AppointmentStore;

use crate::services::gateway::MessageSender;
use crate::services::templates;

/// Lead times, in hours, at which a reminder goes out.
const REMINDER_LEADS: [u32; 2] = [24, 1];

/// Periodic reminder pass. Each run checks a one-hour window at each lead
/// time and marks what it managed to send, so a crashed run just retries on
/// the next tick.
pub struct ReminderDispatcher {
    store: Arc<dyn AppointmentStore>,
    sender: Arc<dyn MessageSender>,
}

impl ReminderDispatcher {
    pub fn new(store: Arc<dyn AppointmentStore>, sender: Arc<dyn MessageSender>) -> Self {
        Self { store, sender }
    }

    pub async fn run_once(&self) -> Result<()> {
        for hours_before in REMINDER_LEADS {
            self.dispatch_window(hours_before).await?;
        }
        Ok(())
    }

    async fn dispatch_window(&self, hours_before: u32) -> Result<()> {
        let from = Local::now().naive_local() + Duration::hours(hours_before as i64);
        let to = from + Duration::hours(1);

        let due = self.store.due_reminders(from, to, hours_before).await?;
        if due.is_empty() {
            return Ok(());
        }
        info!("{} reminder(s) due at {}h lead", due.len(), hours_before);

        for entry in due {
            let Some(phone) = entry.patient.phone.as_deref().filter(|p| !p.is_empty()) else {
                warn!(
                    "Appointment {} has no patient phone, reminder skipped",
                    entry.appointment.id
                );
                continue;
            };

            let scheduled_at = entry.appointment.scheduled_at;
            let text = templates::reminder(
                &entry.patient.full_name,
                scheduled_at.date(),
                &scheduled_at.format("%H:%M").to_string(),
                &entry.appointment.doctor,
                hours_before,
            );

            if let Err(e) = self.sender.send_text(phone, &text).await {
                error!(
                    "Reminder for appointment {} failed, will retry next pass: {:#}",
                    entry.appointment.id, e
                );
                continue;
            }
            self.store
                .mark_reminder_sent(entry.appointment.id, hours_before)
                .await?;
        }
        Ok(())
    }
}
