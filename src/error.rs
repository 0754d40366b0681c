use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("api error {status}: {}", message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("no session token stored")]
    MissingToken,
    #[error("no user id stored")]
    MissingUserId,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// What the user was doing when the error happened. Selects the alert wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Register,
    SearchUser,
    FriendRequest,
    SaveTrip,
    LoadTrips,
    General,
}

/// Title and body of the blocking dialog shown for an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

impl AppError {
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            AppError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_)) || self.status() == Some(404)
    }

    pub fn is_connectivity(&self) -> bool {
        match self {
            AppError::Network(err) => err.is_connect() || err.is_timeout() || err.is_request(),
            _ => false,
        }
    }

    pub fn alert(&self) -> Alert {
        self.alert_for(Action::General)
    }

    pub fn alert_for(&self, action: Action) -> Alert {
        match self {
            AppError::Network(err) if err.is_decode() => Alert::new(
                "Error",
                "The server sent a response we could not read. Try again later.",
            ),
            AppError::Network(err) => Alert::new(
                "Connection error",
                format!(
                    "Check that the API is running, the address is correct and you are on the same network.\n\nError: {err}"
                ),
            ),
            AppError::MissingToken | AppError::MissingUserId => Alert::new(
                "Error",
                "Your session was not found. Please sign in again.",
            ),
            AppError::Validation(errors) => Alert::new(
                "Check the form",
                first_validation_message(errors)
                    .unwrap_or_else(|| "Some fields are invalid.".to_string()),
            ),
            AppError::Conflict(message) => Alert::new("Attention", message.clone()),
            AppError::NotFound(message) => Alert::new("Not found", message.clone()),
            AppError::Api { status, message } => api_alert(action, *status, message.as_deref()),
            _ => Alert::new(
                "Error",
                "Something went wrong on this device. Please try again.",
            ),
        }
    }
}

fn api_alert(action: Action, status: u16, server_message: Option<&str>) -> Alert {
    let (title, fallback) = match (action, status) {
        (Action::Login, 400) => (
            "Invalid credentials",
            "Wrong email or password. Please try again.",
        ),
        (Action::Login, 404) => (
            "User not found",
            "This email is not registered. Please create an account.",
        ),
        (Action::Login, _) => ("Login failed", "Could not sign in. Please try again."),
        (Action::Register, 400) => (
            "Email already registered",
            "This email is already registered. Use another email or sign in.",
        ),
        (Action::Register, _) => (
            "Registration failed",
            "Could not create your account. Please try again.",
        ),
        (Action::SearchUser, 404) => ("Not found", "No user found with this email."),
        (Action::SearchUser, _) => ("Error", "Could not search for the user."),
        (Action::FriendRequest, _) => ("Error", "Could not send the friend request."),
        (Action::SaveTrip, _) => ("Error", "Could not save the trip."),
        (Action::LoadTrips, _) => ("Error", "Could not load your trips."),
        (Action::General, _) => ("Error", "The request failed. Please try again."),
    };
    Alert::new(title, server_message.unwrap_or(fallback))
}

/// First message of the alphabetically first failing field.
pub fn first_validation_message(errors: &ValidationErrors) -> Option<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields.into_iter().find_map(|(_, errs)| {
        errs.iter()
            .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
    })
}
