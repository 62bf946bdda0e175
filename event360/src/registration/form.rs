//! The attendee form and its field update rules.

use crate::types::{EventId, RegistrationRequest, SessionId, SessionOption};
use serde::{Deserialize, Serialize};

/// Editable attendee form.
///
/// Field updates never fail: raw input is normalized on the way in (the
/// seat quantity in particular) and the validation gate decides at Submit
/// time whether the form as a whole is acceptable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationForm {
    /// Attendee first name.
    pub first_name: String,

    /// Attendee last name.
    pub last_name: String,

    /// Attendee email address.
    pub email: String,

    /// Attendee phone number, optional.
    pub phone: String,

    /// Self-reported skills, optional.
    pub skills: String,

    /// Attendee company.
    pub company: String,

    /// Seats requested, kept at one or more by [`RegistrationForm::set_quantity`].
    pub quantity: u32,

    /// Chosen session id, if one has been picked.
    pub session_id: Option<SessionId>,

    /// Label of the chosen session, shown in the closed picker.
    pub session_label: String,

    /// Whether the session picker dropdown is open.
    pub picker_open: bool,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            skills: String::new(),
            company: String::new(),
            quantity: 1,
            session_id: None,
            session_label: String::new(),
            picker_open: false,
        }
    }
}

impl RegistrationForm {
    /// Update the first name.
    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.first_name = value.into();
    }

    /// Update the last name.
    pub fn set_last_name(&mut self, value: impl Into<String>) {
        self.last_name = value.into();
    }

    /// Update the email address.
    pub fn set_email(&mut self, value: impl Into<String>) {
        self.email = value.into();
    }

    /// Update the phone number.
    pub fn set_phone(&mut self, value: impl Into<String>) {
        self.phone = value.into();
    }

    /// Update the skills field.
    pub fn set_skills(&mut self, value: impl Into<String>) {
        self.skills = value.into();
    }

    /// Update the company.
    pub fn set_company(&mut self, value: impl Into<String>) {
        self.company = value.into();
    }

    /// Update the seat quantity from raw input.
    ///
    /// Anything that does not parse to a positive integer becomes one seat,
    /// so the quantity can never reach the backend as zero or negative.
    pub fn set_quantity(&mut self, raw: &str) {
        self.quantity = parse_quantity(raw);
    }

    /// Pick a session. Id and label move together and the picker closes,
    /// so the closed picker can never show a label for a different id.
    pub fn select_session(&mut self, option: &SessionOption) {
        self.session_id = Some(option.id.clone());
        self.session_label = option.label.clone();
        self.picker_open = false;
    }

    /// Open or close the session picker.
    pub fn toggle_picker(&mut self) {
        self.picker_open = !self.picker_open;
    }

    /// Restore every field to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Snapshot the form into a save request for `event_id`.
    #[must_use]
    pub fn to_request(&self, event_id: EventId) -> RegistrationRequest {
        RegistrationRequest {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            skills: self.skills.clone(),
            company: self.company.clone(),
            session_id: self.session_id.clone(),
            quantity: self.quantity,
            event_id,
        }
    }
}

fn parse_quantity(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => u32::try_from(value).unwrap_or(u32::MAX),
        _ => 1,
    }
}
