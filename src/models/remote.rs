//! Payloads exchanged with the trip backend.
//!
//! The backend speaks Portuguese field names; the Rust side keeps English
//! names and maps them with serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::trip::GuestRole;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "userInfo")]
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmAccountRequest {
    pub email: String,
    #[serde(rename = "codigo")]
    pub code: String,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProfileRequest {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "senhaAtual")]
    pub current_password: Option<String>,
    #[serde(rename = "novaSenha")]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "foto", default)]
    pub photo: Option<String>,
}

impl UserInfo {
    /// First and last word of the full name.
    pub fn short_name(&self) -> String {
        let mut words = self.name.split_whitespace();
        match (words.next(), words.last()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            _ => "User".to_string(),
        }
    }
}

pub type Friend = UserInfo;

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct CreateTripRequest {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "localPartida")]
    pub origin: String,
    #[serde(rename = "localDestino")]
    pub destination: String,
    #[serde(rename = "dataPartida")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "dataRetorno")]
    pub end_date: DateTime<Utc>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "imagem")]
    pub image: Option<String>,
    #[serde(rename = "atividades")]
    pub activities: Vec<ActivityDraft>,
    /// Guest emails.
    #[serde(rename = "participantes")]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityDraft {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "dataHora")]
    pub occurs_at: DateTime<Utc>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct UpdateTripRequest {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "localPartida")]
    pub origin: String,
    #[serde(rename = "localDestino")]
    pub destination: String,
    #[serde(rename = "dataPartida")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "dataRetorno")]
    pub end_date: DateTime<Utc>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TripRecord {
    pub id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "localPartida")]
    pub origin: String,
    #[serde(rename = "localDestino")]
    pub destination: String,
    #[serde(rename = "dataPartida")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "dataRetorno")]
    pub end_date: DateTime<Utc>,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "imagem", default)]
    pub image: Option<String>,
    #[serde(rename = "favoritada", default)]
    pub favorite: bool,
    #[serde(rename = "atividades", default)]
    pub activities: Vec<ActivityRecord>,
    #[serde(rename = "participantes", default)]
    pub participants: Vec<ParticipantRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "dataHora")]
    pub occurs_at: DateTime<Utc>,
    #[serde(rename = "concluida", default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParticipantRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: GuestRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestPayload {
    #[serde(rename = "solicitanteId")]
    pub requester_id: String,
    #[serde(rename = "solicitadoId")]
    pub requested_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendDecisionPayload {
    #[serde(rename = "solicitacaoId")]
    pub request_id: String,
}

/// Error body shape; either field may carry the message.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Created and participating trips for the home screen, newest first.
#[derive(Debug, Clone, Default)]
pub struct TripOverview {
    pub created: Vec<TripRecord>,
    pub participating: Vec<TripRecord>,
}
