use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::activity::Activity;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub title: String,
    pub origin: String,
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub guests: Vec<Guest>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: GuestRole,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GuestRole {
    #[default]
    #[serde(rename = "viewer", alias = "LEITOR", alias = "Visualizar")]
    Viewer,
    #[serde(rename = "editor", alias = "EDITOR", alias = "Editor")]
    Editor,
}

impl GuestRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestRole::Viewer => "viewer",
            GuestRole::Editor => "editor",
        }
    }
}

impl fmt::Display for GuestRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrip {
    pub title: String,
    pub origin: String,
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub guests: Vec<Guest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrip {
    pub title: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// `Some(None)` (JSON `null`) clears the field; absent leaves it.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub image_url: Option<Option<String>>,
    pub guests: Option<Vec<Guest>>,
}

/// Narrows `find_all`. Text matches are case-insensitive substrings.
#[derive(Debug, Clone, Default)]
pub struct TripFilter {
    pub destination: Option<String>,
    pub title: Option<String>,
}

impl TripFilter {
    pub fn matches(&self, trip: &Trip) -> bool {
        contains(self.destination.as_deref(), &trip.destination)
            && contains(self.title.as_deref(), &trip.title)
    }
}

fn contains(needle: Option<&str>, haystack: &str) -> bool {
    match needle.map(str::trim).filter(|n| !n.is_empty()) {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

impl Trip {
    pub fn from_dto(id: String, dto: CreateTrip, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: dto.title,
            origin: dto.origin,
            destination: dto.destination,
            start_date: dto.start_date,
            end_date: dto.end_date,
            description: dto.description,
            image_url: dto.image_url,
            activities: Vec::new(),
            guests: dto.guests,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: UpdateTrip, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(origin) = patch.origin {
            self.origin = origin;
        }
        if let Some(destination) = patch.destination {
            self.destination = destination;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
        if let Some(guests) = patch.guests {
            self.guests = guests;
        }
        self.updated_at = now;
    }

    /// Guests are unique by email, compared case-insensitively.
    pub fn add_guest(&mut self, guest: Guest) -> Result<(), AppError> {
        if self
            .guests
            .iter()
            .any(|g| g.email.eq_ignore_ascii_case(&guest.email))
        {
            return Err(AppError::Conflict(format!(
                "{} is already invited to this trip",
                guest.email
            )));
        }
        self.guests.push(guest);
        Ok(())
    }

    pub fn remove_guest(&mut self, guest_id: &str) -> bool {
        let before = self.guests.len();
        self.guests.retain(|g| g.id != guest_id);
        self.guests.len() != before
    }

    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}
