use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use super::storage::StorageService;
use crate::{
    error::AppError,
    kv::keys,
    models::{
        notification::{Notification, NotificationKind},
        remote::{
            ApiErrorBody, ConfirmAccountRequest, CreateTripRequest, Friend,
            FriendDecisionPayload, FriendRequestPayload, LoginRequest, LoginResponse,
            RegisterRequest, TripOverview, TripRecord, UpdateProfileRequest, UpdateTripRequest,
            UserInfo,
        },
    },
};

/// Client for the trip backend.
///
/// Authenticated calls read the bearer token from storage on every request,
/// so signing in or out takes effect immediately. Nothing is retried.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    storage: StorageService,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        storage: StorageService,
        connect_timeout: Duration,
    ) -> Result<Self, AppError> {
        Url::parse(base_url)?;
        let http = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            storage,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn token(&self) -> Result<String, AppError> {
        self.storage
            .get_raw(keys::USER_TOKEN)
            .await
            .ok_or(AppError::MissingToken)
    }

    async fn current_user_id(&self) -> Result<String, AppError> {
        self.storage
            .get_raw(keys::USER_ID)
            .await
            .ok_or(AppError::MissingUserId)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        debug!(%method, %url, "api request");
        self.http.request(method, url)
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, AppError> {
        let token = self.token().await?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn check(response: Response) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(ApiErrorBody::into_message);
        warn!(status = status.as_u16(), %url, ?message, "api request failed");
        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AppError> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(request: RequestBuilder) -> Result<(), AppError> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    // ---- users ----

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse =
            Self::send_json(self.request(Method::POST, "users/login").json(&body)).await?;
        info!(user_id = %response.user.id, "login succeeded");
        Ok(response)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), AppError> {
        Self::send_empty(self.request(Method::POST, "users/cadastrar").json(request)).await?;
        info!(email = %request.email, "account registered");
        Ok(())
    }

    pub async fn confirm_account(&self, email: &str, code: &str) -> Result<(), AppError> {
        let body = ConfirmAccountRequest {
            email: email.to_string(),
            code: code.to_string(),
        };
        Self::send_empty(self.request(Method::POST, "users/confirm-account").json(&body)).await
    }

    pub async fn me(&self) -> Result<UserInfo, AppError> {
        Self::send_json(self.authorized(Method::GET, "users/me").await?).await
    }

    pub async fn update_me(&self, patch: &UpdateProfileRequest) -> Result<UserInfo, AppError> {
        let request = self.authorized(Method::PATCH, "users/me").await?.json(patch);
        Self::send_json(request).await
    }

    /// `None` when no account uses the email.
    pub async fn user_by_email(&self, email: &str) -> Result<Option<UserInfo>, AppError> {
        let request = self
            .authorized(Method::GET, "users/by-email")
            .await?
            .query(&[("email", email)]);
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        Ok(Some(response.json().await?))
    }

    pub async fn user_by_id(&self, user_id: &str) -> Result<UserInfo, AppError> {
        let path = format!("users/{user_id}");
        Self::send_json(self.authorized(Method::GET, &path).await?).await
    }

    // ---- trips ----

    pub async fn create_trip(&self, trip: &CreateTripRequest) -> Result<TripRecord, AppError> {
        let request = self
            .authorized(Method::POST, "trips/create-trip")
            .await?
            .json(trip);
        let created: TripRecord = Self::send_json(request).await?;
        info!(trip_id = %created.id, "trip created");
        Ok(created)
    }

    pub async fn my_trips(&self) -> Result<Vec<TripRecord>, AppError> {
        let trips: Vec<TripRecord> =
            Self::send_json(self.authorized(Method::GET, "trips/minhas-viagens").await?).await?;
        debug!(count = trips.len(), "own trips loaded");
        Ok(trips)
    }

    pub async fn participating_trips(&self) -> Result<Vec<TripRecord>, AppError> {
        Self::send_json(self.authorized(Method::GET, "trips/participando").await?).await
    }

    pub async fn user_trips(&self) -> Result<Vec<TripRecord>, AppError> {
        Self::send_json(self.authorized(Method::GET, "trips").await?).await
    }

    pub async fn update_trip(
        &self,
        trip_id: &str,
        trip: &UpdateTripRequest,
    ) -> Result<TripRecord, AppError> {
        let path = format!("trips/{trip_id}");
        let request = self.authorized(Method::PATCH, &path).await?.json(trip);
        let updated: TripRecord = Self::send_json(request).await?;
        info!(trip_id = %updated.id, "trip updated");
        Ok(updated)
    }

    /// Home screen data. A failing participating list degrades to empty.
    pub async fn trip_overview(&self) -> Result<TripOverview, AppError> {
        let mut created = self.my_trips().await?;
        let mut participating = match self.participating_trips().await {
            Ok(trips) => trips,
            Err(err) => {
                warn!("participating trips unavailable: {err}");
                Vec::new()
            }
        };
        created.reverse();
        participating.reverse();
        Ok(TripOverview {
            created,
            participating,
        })
    }

    pub async fn accept_trip_invite(&self, invite_id: &str) -> Result<(), AppError> {
        let path = format!("trips/convites/{invite_id}/aceitar");
        Self::send_empty(self.authorized(Method::POST, &path).await?).await?;
        info!(invite_id, "trip invite accepted");
        Ok(())
    }

    pub async fn decline_trip_invite(&self, invite_id: &str) -> Result<(), AppError> {
        let path = format!("trips/convites/{invite_id}/recusar");
        Self::send_empty(self.authorized(Method::POST, &path).await?).await?;
        info!(invite_id, "trip invite declined");
        Ok(())
    }

    // ---- friends ----

    pub async fn send_friend_request(&self, friend_id: &str) -> Result<(), AppError> {
        let body = FriendRequestPayload {
            requester_id: self.current_user_id().await?,
            requested_id: friend_id.to_string(),
        };
        let request = self
            .authorized(Method::POST, "friend/request")
            .await?
            .json(&body);
        Self::send_empty(request).await?;
        info!(friend_id, "friend request sent");
        Ok(())
    }

    pub async fn accept_friend_request(&self, request_id: &str) -> Result<(), AppError> {
        self.decide_friend_request("friend/accept-friend", request_id)
            .await
    }

    pub async fn decline_friend_request(&self, request_id: &str) -> Result<(), AppError> {
        self.decide_friend_request("friend/decline-friend", request_id)
            .await
    }

    async fn decide_friend_request(&self, path: &str, request_id: &str) -> Result<(), AppError> {
        let body = FriendDecisionPayload {
            request_id: request_id.to_string(),
        };
        Self::send_empty(self.authorized(Method::POST, path).await?.json(&body)).await?;
        info!(request_id, path, "friend request answered");
        Ok(())
    }

    pub async fn friends(&self) -> Result<Vec<Friend>, AppError> {
        let path = format!("friends/{}", self.current_user_id().await?);
        Self::send_json(self.authorized(Method::GET, &path).await?).await
    }

    // ---- notifications ----

    pub async fn notifications(&self) -> Result<Vec<Notification>, AppError> {
        Self::send_json(
            self.authorized(Method::GET, "notifications/minhasNotificacoes")
                .await?,
        )
        .await
    }

    pub async fn delete_notification(&self, notification_id: &str) -> Result<(), AppError> {
        let path = format!("notifications/{notification_id}");
        Self::send_empty(self.authorized(Method::DELETE, &path).await?).await
    }

    /// Accepts or declines whatever the notification asks for.
    pub async fn respond_to(
        &self,
        notification: &Notification,
        accept: bool,
    ) -> Result<(), AppError> {
        let reference = || {
            notification.reference_id.as_deref().ok_or_else(|| {
                AppError::NotFound(format!("reference of notification {}", notification.id))
            })
        };
        match (notification.kind, accept) {
            (NotificationKind::TripInvite, true) => self.accept_trip_invite(reference()?).await,
            (NotificationKind::TripInvite, false) => self.decline_trip_invite(reference()?).await,
            (NotificationKind::FriendRequest, true) => {
                self.accept_friend_request(reference()?).await
            }
            (NotificationKind::FriendRequest, false) => {
                self.decline_friend_request(reference()?).await
            }
            (kind, _) => Err(AppError::Conflict(format!(
                "notification {} ({kind:?}) does not take a response",
                notification.id
            ))),
        }
    }
}
