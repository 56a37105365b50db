use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap())
}

/// Cédula de ciudadanía: 8-10 digits. The modulo-10 checksum is deliberately
/// not applied; older and regional cédulas fail it despite being valid, so
/// only the basic format is checked.
pub fn valid_cc(number: &str) -> bool {
    let valid = (8..=10).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit());
    debug!("CC {} valid: {}", number, valid);
    valid
}

/// Tarjeta de identidad: 6-12 digits.
pub fn valid_ti(number: &str) -> bool {
    let valid = (6..=12).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit());
    debug!("TI {} valid: {}", number, valid);
    valid
}

/// Registro civil: 6-12 digits.
pub fn valid_rc(number: &str) -> bool {
    let valid = (6..=12).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit());
    debug!("RC {} valid: {}", number, valid);
    valid
}

/// Colombian mobile number: 10 digits starting with 3, after stripping
/// spaces and dashes.
pub fn valid_colombian_mobile(phone: &str) -> bool {
    let clean = strip_phone(phone);
    let valid = clean.len() == 10
        && clean.starts_with('3')
        && clean.chars().all(|c| c.is_ascii_digit());
    debug!("Phone {} valid: {}", phone, valid);
    valid
}

/// Removes spaces and dashes from a phone number.
pub fn strip_phone(phone: &str) -> String {
    phone.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Parses a birthdate in `dd-mm-yyyy`. Returns `None` when the date cannot
/// be parsed, lies in the future, or the resulting age is under 18 or over
/// 120 years.
pub fn parse_birthdate(text: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(text.trim(), "%d-%m-%Y").ok()?;
    let today = Utc::now().date_naive();

    if date > today {
        debug!("Birthdate rejected: in the future");
        return None;
    }

    let age = age_in_years(date, today);
    if age < 18 {
        debug!("Birthdate rejected: under age ({} years)", age);
        return None;
    }
    if age > 120 {
        debug!("Birthdate rejected: unrealistic age ({} years)", age);
        return None;
    }

    Some(date)
}

fn age_in_years(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Basic shape check, same pattern the original intake used.
pub fn valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}
