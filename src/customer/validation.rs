//! Customer form validation and phone normalization.
//!
//! All field errors are collected before any record is written, so a front
//! end can show them next to each input.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::model::NewCustomer;

/// Country code assumed when the form does not send one.
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

const INDIA_CODE: &str = "+91";
const INDIA_LOCAL_DIGITS: usize = 10;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Raw customer form as submitted by the wizard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerForm {
    pub name: String,
    pub country_code: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub conversation_history: Option<String>,
    pub topics: String,
}

/// Field name → user-facing message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl CustomerForm {
    /// Validate every field and produce the normalized record fields.
    pub fn validate(self) -> Result<NewCustomer, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.add("name", "Name is required");
        }

        let phone = match normalize_phone(self.country_code.as_deref(), &self.phone) {
            Ok(phone) => Some(phone),
            Err(msg) => {
                errors.add("phone", msg);
                None
            }
        };

        // Checked as typed: padding or a blank-but-nonempty value is rejected.
        let email = self.email.filter(|e| !e.is_empty());
        if let Some(ref email) = email {
            if !is_valid_email(email) {
                errors.add("email", "Please enter a valid email address");
            }
        }

        if self.topics.trim().is_empty() {
            errors.add("topics", "Topics to discuss are required");
        }

        match phone {
            Some(phone) if errors.is_empty() => Ok(NewCustomer {
                name,
                phone,
                email,
                conversation_history: self.conversation_history.filter(|h| !h.is_empty()),
                topics: self.topics,
            }),
            _ => Err(errors),
        }
    }
}

/// Email is optional: an empty string passes.
pub fn is_valid_email(email: &str) -> bool {
    email.is_empty() || EMAIL_RE.is_match(email)
}

/// Normalize a phone number to `+<code><digits>`.
///
/// Non-digits in `raw` are dropped. For `+91` exactly ten local digits are
/// required; other codes accept any non-empty digit string. When no code is
/// given and `raw` already starts with `+`, it is read as an international
/// number.
pub fn normalize_phone(country_code: Option<&str>, raw: &str) -> Result<String, &'static str> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err("Phone number is required");
    }

    let (code, local) = match country_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => (canonical_code(code), digits),
        None if raw.trim_start().starts_with('+') => match digits.strip_prefix(&INDIA_CODE[1..]) {
            Some(rest) => (INDIA_CODE.to_string(), rest.to_string()),
            None => return Ok(format!("+{digits}")),
        },
        None => (DEFAULT_COUNTRY_CODE.to_string(), digits),
    };

    if code == INDIA_CODE {
        if local.len() != INDIA_LOCAL_DIGITS {
            return Err("Please enter a valid 10-digit phone number");
        }
    } else if local.is_empty() || code.len() < 2 {
        return Err("Please enter a valid phone number");
    }

    Ok(format!("{code}{local}"))
}

fn canonical_code(code: &str) -> String {
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("+{digits}")
}
