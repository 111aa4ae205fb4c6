use crate::api::CatalogSource;
use crate::i18n::Language;
use crate::models::ContactRequest;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Country {
    UZ,
    RU,
    KZ,
    KG,
    TJ,
    TM,
}

impl Country {
    pub fn dial_code(&self) -> &'static str {
        match self {
            Country::UZ => "998",
            Country::RU | Country::KZ => "7",
            Country::KG => "996",
            Country::TJ => "992",
            Country::TM => "993",
        }
    }

    /// Digit grouping of the national number in the display form.
    fn groups(&self) -> &'static [usize] {
        match self {
            Country::UZ => &[2, 3, 2, 2],
            Country::RU | Country::KZ => &[3, 3, 2, 2],
            Country::KG => &[3, 3, 3],
            Country::TJ => &[2, 3, 4],
            Country::TM => &[2, 2, 2, 2],
        }
    }

    fn pattern(&self) -> &'static Regex {
        static PATTERNS: OnceLock<HashMap<Country, Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            [
                (Country::UZ, r"^998[1-9]\d{8}$"),
                (Country::RU, r"^7[3489]\d{9}$"),
                (Country::KZ, r"^7[67]\d{9}$"),
                (Country::KG, r"^996[2-9]\d{8}$"),
                (Country::TJ, r"^992\d{9}$"),
                (Country::TM, r"^9936\d{7}$"),
            ]
            .into_iter()
            .map(|(country, re)| (country, Regex::new(re).expect("valid phone pattern")))
            .collect()
        });
        &patterns[self]
    }
}

fn digits_of(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Full international digits; a bare 9-digit number is taken as a local Uzbek one.
fn international_digits(input: &str) -> String {
    let digits = digits_of(input);
    if !input.trim_start().starts_with('+') && digits.len() == 9 {
        format!("998{}", digits)
    } else {
        digits
    }
}

/**
 * detect_country
 * Guesses the country from the leading dialing code.
 */
pub fn detect_country(input: &str) -> Option<Country> {
    let digits = international_digits(input);
    if digits.starts_with("998") {
        Some(Country::UZ)
    } else if digits.starts_with("996") {
        Some(Country::KG)
    } else if digits.starts_with("992") {
        Some(Country::TJ)
    } else if digits.starts_with("993") {
        Some(Country::TM)
    } else if digits.starts_with("77") || digits.starts_with("76") {
        Some(Country::KZ)
    } else if digits.starts_with('7') {
        Some(Country::RU)
    } else {
        None
    }
}

pub fn validate_phone(input: &str) -> bool {
    match detect_country(input) {
        Some(country) => country.pattern().is_match(&international_digits(input)),
        None => false,
    }
}

/// Canonical display form, e.g. `+998 (97) 123-45-67`. `None` for invalid input.
pub fn format_phone(input: &str) -> Option<String> {
    let country = detect_country(input)?;
    let digits = international_digits(input);
    if !country.pattern().is_match(&digits) {
        return None;
    }

    let national = &digits[country.dial_code().len()..];
    let groups = country.groups();
    let mut parts = Vec::with_capacity(groups.len());
    let mut offset = 0;
    for len in groups {
        parts.push(&national[offset..offset + len]);
        offset += len;
    }

    let rest = &parts[1..];
    let tail = match rest.len() {
        0 => String::new(),
        1 => rest[0].to_string(),
        _ => format!("{}-{}", rest[0], rest[1..].join("-")),
    };
    Some(format!("+{} ({}) {}", country.dial_code(), parts[0], tail))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldError {
    NameRequired,
    PhoneInvalid,
    MessageRequired,
}

impl FieldError {
    pub fn message_key(&self) -> &'static str {
        match self {
            FieldError::NameRequired => "name_required",
            FieldError::PhoneInvalid => "phone_invalid",
            FieldError::MessageRequired => "message_required",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message_key: &'static str,
}

impl Toast {
    fn error(message_key: &'static str) -> Self {
        Self {
            kind: ToastKind::Error,
            message_key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocked {
    Invalid(FieldError),
    InFlight,
}

impl SubmitBlocked {
    pub fn toast(&self) -> Toast {
        match self {
            SubmitBlocked::Invalid(e) => Toast::error(e.message_key()),
            SubmitBlocked::InFlight => Toast::error("contact_pending"),
        }
    }
}

/**
 * validate_request
 * Field checks in display order; the first failure wins.
 */
pub fn validate_request(full_name: &str, phone: &str, message: &str) -> Result<ContactRequest, FieldError> {
    if full_name.trim().is_empty() {
        return Err(FieldError::NameRequired);
    }
    let phone = format_phone(phone).ok_or(FieldError::PhoneInvalid)?;
    if message.trim().is_empty() {
        return Err(FieldError::MessageRequired);
    }
    Ok(ContactRequest {
        full_name: full_name.trim().to_string(),
        phone,
        text: message.trim().to_string(),
    })
}

#[derive(Debug, Default, Clone)]
pub struct ContactForm {
    pub full_name: String,
    pub phone: String,
    pub message: String,
    pending: bool,
}

impl ContactForm {
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Detected country of the current phone input, for the flag next to the field.
    pub fn country(&self) -> Option<Country> {
        detect_country(&self.phone)
    }

    /// Reformats a valid phone into its display form. Returns validity.
    pub fn blur_phone(&mut self) -> bool {
        match format_phone(&self.phone) {
            Some(formatted) => {
                self.phone = formatted;
                true
            }
            None => false,
        }
    }

    /// Validates and marks the form as in flight.
    pub fn begin_submit(&mut self) -> Result<ContactRequest, SubmitBlocked> {
        if self.pending {
            return Err(SubmitBlocked::InFlight);
        }
        let request = validate_request(&self.full_name, &self.phone, &self.message)
            .map_err(SubmitBlocked::Invalid)?;
        self.pending = true;
        Ok(request)
    }

    /// Success resets every field; failure keeps what the user typed.
    pub fn finish(&mut self, outcome: &anyhow::Result<()>) -> Toast {
        self.pending = false;
        match outcome {
            Ok(()) => {
                *self = ContactForm::default();
                Toast {
                    kind: ToastKind::Success,
                    message_key: "contact_success",
                }
            }
            Err(e) => {
                log::warn!("Contact submission failed: {:?}", e);
                Toast::error("contact_error")
            }
        }
    }

    pub async fn submit<S: CatalogSource>(&mut self, source: &S, language: Language) -> Toast {
        let request = match self.begin_submit() {
            Ok(request) => request,
            Err(blocked) => return blocked.toast(),
        };
        let outcome = source.send_contact(&request, language).await;
        self.finish(&outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeSource};

    #[test]
    fn test_detect_country() {
        assert_eq!(detect_country("+998971234567"), Some(Country::UZ));
        assert_eq!(detect_country("+7 912 345 67 89"), Some(Country::RU));
        assert_eq!(detect_country("+7 701 234 56 78"), Some(Country::KZ));
        assert_eq!(detect_country("+996 555 123 456"), Some(Country::KG));
        assert_eq!(detect_country("971234567"), Some(Country::UZ));
        assert_eq!(detect_country("12345"), None);
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+998971234567"));
        assert!(validate_phone("+998 (97) 123-45-67"));
        assert!(validate_phone("+79123456789"));
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("+99897123"));
        assert!(!validate_phone("+7 112 345 67 89"));
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(
            format_phone("+998971234567").as_deref(),
            Some("+998 (97) 123-45-67")
        );
        assert_eq!(
            format_phone("8 (912) ...").as_deref(),
            None
        );
        assert_eq!(
            format_phone("+7 912 345 67 89").as_deref(),
            Some("+7 (912) 345-67-89")
        );
        assert_eq!(
            format_phone("+996555123456").as_deref(),
            Some("+996 (555) 123-456")
        );
        assert_eq!(
            format_phone("+992931234567").as_deref(),
            Some("+992 (93) 123-4567")
        );
        assert_eq!(
            format_phone("+99361234567").as_deref(),
            Some("+993 (61) 23-45-67")
        );
    }

    #[test]
    fn test_blur_reformats_valid_phone_only() {
        let mut form = ContactForm {
            phone: "+998971234567".to_string(),
            ..ContactForm::default()
        };
        assert!(form.blur_phone());
        assert_eq!(form.phone, "+998 (97) 123-45-67");
        assert_eq!(form.country(), Some(Country::UZ));

        form.phone = "12345".to_string();
        assert!(!form.blur_phone());
        assert_eq!(form.phone, "12345");
    }

    #[test]
    fn test_validation_order() {
        assert_eq!(
            validate_request("  ", "12345", "").unwrap_err(),
            FieldError::NameRequired
        );
        assert_eq!(
            validate_request("Aziz", "12345", "hi").unwrap_err(),
            FieldError::PhoneInvalid
        );
        assert_eq!(
            validate_request("Aziz", "+998971234567", " ").unwrap_err(),
            FieldError::MessageRequired
        );
        let ok = validate_request(" Aziz ", "+998971234567", " Need a seeder ").unwrap();
        assert_eq!(ok.full_name, "Aziz");
        assert_eq!(ok.phone, "+998 (97) 123-45-67");
        assert_eq!(ok.text, "Need a seeder");
    }

    #[test]
    fn test_only_one_submission_in_flight() {
        let mut form = ContactForm {
            full_name: "Aziz".to_string(),
            phone: "+998971234567".to_string(),
            message: "Quote please".to_string(),
            ..ContactForm::default()
        };
        assert!(form.begin_submit().is_ok());
        assert!(form.is_pending());
        assert_eq!(form.begin_submit().unwrap_err(), SubmitBlocked::InFlight);

        let toast = form.finish(&Err(anyhow::anyhow!("502")));
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(!form.is_pending());
        assert_eq!(form.full_name, "Aziz");
        assert!(form.begin_submit().is_ok());
    }

    #[tokio::test]
    async fn test_invalid_phone_blocks_submission() {
        let source = FakeSource::default();
        let mut form = ContactForm {
            full_name: "Aziz".to_string(),
            phone: "12345".to_string(),
            message: "Hello".to_string(),
            ..ContactForm::default()
        };

        let toast = form.submit(&source, Language::Uz).await;
        assert_eq!(toast, Toast::error("phone_invalid"));
        assert!(source.calls().is_empty());
        assert!(!form.is_pending());
    }

    #[tokio::test]
    async fn test_success_resets_and_failure_keeps_values() {
        let source = FakeSource::default();
        let mut form = ContactForm {
            full_name: "Aziz".to_string(),
            phone: "+998971234567".to_string(),
            message: "Hello".to_string(),
            ..ContactForm::default()
        };

        source.set_failing(true);
        let toast = form.submit(&source, Language::Ru).await;
        assert_eq!(toast.message_key, "contact_error");
        assert_eq!(form.message, "Hello");

        source.set_failing(false);
        let toast = form.submit(&source, Language::Ru).await;
        assert_eq!(toast.kind, ToastKind::Success);
        assert!(form.full_name.is_empty() && form.phone.is_empty() && form.message.is_empty());

        let sent: Vec<Call> = source.calls();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[1],
            Call::Contact(ContactRequest {
                full_name: "Aziz".to_string(),
                phone: "+998 (97) 123-45-67".to_string(),
                text: "Hello".to_string(),
            })
        );
    }
}
