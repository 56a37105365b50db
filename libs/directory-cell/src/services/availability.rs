use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use crate::models::AvailableSlot;
use crate::services::store::AppointmentStore;

/// Bookable business hours. Mornings 08-11, afternoons 14-17.
pub const SLOT_HOURS: [u32; 8] = [8, 9, 10, 11, 14, 15, 16, 17];

pub fn slot_label(hour: u32) -> String {
    format!("{:02}:00", hour)
}

/// Resolves which (doctor, slot) pairs are still free on a date by checking
/// the booking state for every pair. Order is deterministic: doctor-major in
/// roster order, then slot order as listed in `SLOT_HOURS`; the 1-based
/// numbering shown to users comes straight from this ordering.
pub struct AvailabilityService {
    store: Arc<dyn AppointmentStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn available_slots(&self, date: NaiveDate) -> Result<Vec<AvailableSlot>> {
        let doctors = self.store.active_doctors().await?;
        let mut slots = Vec::new();

        for doctor in &doctors {
            for &hour in SLOT_HOURS.iter() {
                if self.store.booking_at(&doctor.name, date, hour).await?.is_none() {
                    slots.push(AvailableSlot {
                        doctor: doctor.name.clone(),
                        slot: slot_label(hour),
                        specialty: doctor.specialty.clone(),
                    });
                }
            }
        }

        debug!(
            "{} of {} slots free on {}",
            slots.len(),
            doctors.len() * SLOT_HOURS.len(),
            date
        );
        Ok(slots)
    }
}
