use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});

pub const MIN_STAFF_PASSWORD_LEN: usize = 6;
pub const MIN_PATIENT_PASSWORD_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

/// At least eight characters mixing upper case, lower case, digits and symbols.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PATIENT_PASSWORD_LEN
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("asha.mehta@happyodent.com"));
        assert!(is_valid_email("dr+rao@clinic.co.in"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("trailing@dot."));
        assert!(!is_valid_email("spaces in@mail.com"));
    }

    #[test]
    fn test_strong_password() {
        assert!(is_strong_password("Sm1le!now"));
        assert!(!is_strong_password("short1!"));
        assert!(!is_strong_password("alllowercase1!"));
        assert!(!is_strong_password("NoDigits!!"));
        assert!(!is_strong_password("NoSymbols12"));
    }
}
