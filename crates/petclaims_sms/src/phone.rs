//! Phone number normalization.

use tracing::warn;

/// Normalize a North American number to E.164.
///
/// Every non-digit is dropped first, so `(312) 305-0403`, `312.305.0403` and
/// `+1 312 305 0403` all land on `+13123050403`. Ten digits get a `+1`
/// prefix; eleven digits starting with `1` get a `+`. Anything else comes
/// back unchanged (with a warning) and the provider decides what to do
/// with it.
pub fn format_phone_to_e164(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let digits: String = input.chars().filter(char::is_ascii_digit).collect();

    match digits.len() {
        10 => format!("+1{}", digits),
        11 if digits.starts_with('1') => format!("+{}", digits),
        _ => {
            warn!(phone = %input, digits = digits.len(), "Phone number not in a recognized format");
            input.to_string()
        }
    }
}
