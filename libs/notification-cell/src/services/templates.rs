use chrono::NaiveDateTime;

const CLINIC_NAME: &str = "Sociedad Urológica del Cauca";
const CONTACT_PHONE: &str = "3013188696";

/// HTML body for the booking confirmation email.
pub fn confirmation_html(
    patient_name: &str,
    appointment_kind: &str,
    doctor: &str,
    scheduled_at: NaiveDateTime,
) -> String {
    format!(
        r#"<html><body style="font-family: Arial, sans-serif; background-color: #f8f9fa;">
<div style="max-width: 600px; margin: 0 auto; background: #ffffff; padding: 24px;">
  <h2 style="color: #2c3e50;">{clinic}</h2>
  <p>Hola <strong>{patient}</strong>,</p>
  <p style="color: #28a745;"><strong>Tu cita ha sido agendada correctamente.</strong></p>
  <table style="width: 100%; border-collapse: collapse;">
    <tr><td style="padding: 6px; color: #2c3e50;">Tipo de cita</td><td style="padding: 6px;">{kind}</td></tr>
    <tr><td style="padding: 6px; color: #2c3e50;">Doctor</td><td style="padding: 6px;">Dr. {doctor}</td></tr>
    <tr><td style="padding: 6px; color: #2c3e50;">Fecha</td><td style="padding: 6px;">{date}</td></tr>
    <tr><td style="padding: 6px; color: #2c3e50;">Hora</td><td style="padding: 6px;">{hour}</td></tr>
  </table>
  <p>Te enviaremos recordatorios antes de tu cita. Si necesitas reagendar, comunícate al {phone}.</p>
  <p style="color: #7f8c8d; font-size: 12px;">© {clinic}. Todos los derechos reservados.</p>
</div>
</body></html>"#,
        clinic = CLINIC_NAME,
        patient = patient_name,
        kind = appointment_kind,
        doctor = doctor,
        date = scheduled_at.format("%d/%m/%Y"),
        hour = scheduled_at.format("%H:%M"),
        phone = CONTACT_PHONE,
    )
}
