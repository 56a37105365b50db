/// Country prefixes the clinic sends to; used to decide where the `+` goes.
const COUNTRY_PREFIXES: [&str; 8] = ["57", "52", "51", "56", "54", "58", "34", "39"];

/// Normalizes a recipient address to international format. Numbers already
/// carrying `+` pass through; otherwise a known country prefix (or, failing
/// that, the number as given) gets the `+` prepended.
pub fn to_international(phone: &str) -> String {
    if phone.starts_with('+') {
        return phone.to_string();
    }

    for prefix in COUNTRY_PREFIXES {
        if phone.starts_with(prefix) {
            return format!("+{}", phone);
        }
    }

    format!("+{}", phone)
}
