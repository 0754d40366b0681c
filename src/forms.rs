//! Input forms and their validation rules.
//!
//! A form that passes `validate()` can be turned into the matching backend
//! request without further checks.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::{
    remote::{ActivityDraft, CreateTripRequest, RegisterRequest, UpdateProfileRequest},
    trip::{Guest, GuestRole},
};

const MIN_PASSWORD: u64 = 9;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Please enter a valid email."))]
    pub email: String,
    #[validate(length(min = 9, message = "Password must be at least 9 characters."))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "passwords_match"))]
pub struct RegisterForm {
    #[validate(custom(function = "full_name"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email."))]
    pub email: String,
    #[validate(length(min = 9, message = "Password must be at least 9 characters."))]
    pub password: String,
    pub password_confirm: String,
}

fn full_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.chars().count() < 3 {
        return Err(error("name_length", "Name must be at least 3 characters."));
    }
    if name.split_whitespace().count() < 2 {
        return Err(error(
            "full_name",
            "Please enter your full name (first and last name).",
        ));
    }
    Ok(())
}

fn passwords_match(form: &RegisterForm) -> Result<(), ValidationError> {
    if form.password != form.password_confirm {
        return Err(error("password_mismatch", "Passwords do not match."));
    }
    Ok(())
}

impl RegisterForm {
    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "password_change_is_complete"))]
pub struct EditProfileForm {
    #[validate(length(min = 3, message = "Name must be at least 3 characters."))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email."))]
    pub email: String,
    pub current_password: Option<String>,
    #[validate(custom(function = "empty_or_strong"))]
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

fn empty_or_strong(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() || password.chars().count() as u64 >= MIN_PASSWORD {
        Ok(())
    } else {
        Err(error(
            "new_password_length",
            "New password must be at least 9 characters.",
        ))
    }
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn password_change_is_complete(form: &EditProfileForm) -> Result<(), ValidationError> {
    let new_password = filled(&form.new_password);
    if filled(&form.current_password).is_some()
        && new_password.map_or(true, |p| (p.chars().count() as u64) < MIN_PASSWORD)
    {
        return Err(error("new_password_required", "You must fill in the new password."));
    }
    if let Some(new_password) = new_password {
        if Some(new_password) != filled(&form.confirm_password) {
            return Err(error("password_mismatch", "Passwords do not match."));
        }
    }
    Ok(())
}

impl EditProfileForm {
    /// Only changed credentials are sent; blank password fields are left out.
    pub fn to_request(&self) -> UpdateProfileRequest {
        UpdateProfileRequest {
            name: Some(self.name.trim().to_string()),
            email: Some(self.email.trim().to_string()),
            current_password: filled(&self.current_password).map(str::to_string),
            new_password: filled(&self.new_password).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ActivityForm {
    pub id: Option<String>,
    #[validate(length(min = 3, message = "The activity needs a name."))]
    pub title: String,
    pub occurs_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GuestForm {
    pub id: String,
    #[validate(email(message = "Invalid email format."))]
    pub email: String,
    pub role: GuestRole,
}

impl From<&GuestForm> for Guest {
    fn from(form: &GuestForm) -> Self {
        Guest {
            id: form.id.clone(),
            email: form.email.clone(),
            role: form.role,
            name: None,
            avatar: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "ends_after_start"))]
pub struct CreateTripForm {
    #[validate(length(min = 3, message = "Trip name must be at least 3 characters."))]
    pub name: String,
    #[validate(length(min = 3, message = "Departure location is required."))]
    pub departure_location: String,
    #[validate(length(min = 3, message = "Destination is required."))]
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub description: Option<String>,
    pub image_uri: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub activities: Vec<ActivityForm>,
    #[serde(default)]
    #[validate(nested)]
    pub guests: Vec<GuestForm>,
}

fn ends_after_start(form: &CreateTripForm) -> Result<(), ValidationError> {
    if form.end_date <= form.start_date {
        return Err(error(
            "end_before_start",
            "End date must be after the start date.",
        ));
    }
    Ok(())
}

impl CreateTripForm {
    pub fn to_request(&self) -> CreateTripRequest {
        CreateTripRequest {
            title: self.name.trim().to_string(),
            origin: self.departure_location.trim().to_string(),
            destination: self.destination.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            description: self.description.clone().filter(|d| !d.trim().is_empty()),
            image: self.image_uri.clone().filter(|i| !i.trim().is_empty()),
            activities: self
                .activities
                .iter()
                .map(|a| ActivityDraft {
                    title: a.title.trim().to_string(),
                    occurs_at: a.occurs_at,
                })
                .collect(),
            participants: self.guests.iter().map(|g| g.email.clone()).collect(),
        }
    }

    pub fn guests(&self) -> Vec<Guest> {
        self.guests.iter().map(Guest::from).collect()
    }
}
