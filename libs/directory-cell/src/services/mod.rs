pub mod availability;
pub mod store;

pub use availability::{slot_label, AvailabilityService, SLOT_HOURS};
pub use store::{AppointmentStore, SupabaseAppointmentStore};
