use std::fmt;

use tracing::info;
use validator::Validate;

use crate::{
    error::AppError,
    forms::LoginForm,
    kv::keys,
    models::remote::UserInfo,
    services::{api::ApiClient, storage::StorageService},
};

/// Root navigation destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Onboarding,
    Auth,
    Main,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Onboarding => "/(onboarding)",
            Route::Auth => "/(auth)",
            Route::Main => "/(tabs)",
        }
    }

    /// Maps the first navigation segment back to a route group.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment.trim_start_matches('/') {
            "(onboarding)" => Some(Route::Onboarding),
            "(auth)" => Some(Route::Auth),
            "(tabs)" => Some(Route::Main),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// The decision table: onboarding first, then sign-in, then the app.
pub fn redirect_target(has_completed_onboarding: bool, token: Option<&str>) -> Route {
    let has_token = token.is_some_and(|t| !t.is_empty());
    match (has_completed_onboarding, has_token) {
        (false, _) => Route::Onboarding,
        (true, false) => Route::Auth,
        (true, true) => Route::Main,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Uninitialized,
    /// A token may already exist; it only matters once onboarding is done.
    Onboarding { has_token: bool },
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    Loaded {
        has_completed_onboarding: bool,
        has_token: bool,
    },
    SignedIn,
    SignedOut,
    OnboardingCompleted,
    OnboardingReset,
}

impl AuthPhase {
    pub fn from_flags(has_completed_onboarding: bool, has_token: bool) -> Self {
        match (has_completed_onboarding, has_token) {
            (false, has_token) => AuthPhase::Onboarding { has_token },
            (true, false) => AuthPhase::Unauthenticated,
            (true, true) => AuthPhase::Authenticated,
        }
    }

    fn has_token(&self) -> bool {
        matches!(
            self,
            AuthPhase::Authenticated | AuthPhase::Onboarding { has_token: true }
        )
    }

    /// Pure transition function. Events other than `Loaded` are ignored
    /// until the state has been loaded.
    pub fn apply(self, event: AuthEvent) -> Self {
        use AuthPhase::*;

        match (self, event) {
            (
                _,
                AuthEvent::Loaded {
                    has_completed_onboarding,
                    has_token,
                },
            ) => AuthPhase::from_flags(has_completed_onboarding, has_token),
            (Uninitialized, _) => Uninitialized,
            (Onboarding { .. }, AuthEvent::SignedIn) => Onboarding { has_token: true },
            (Onboarding { .. }, AuthEvent::SignedOut) => Onboarding { has_token: false },
            (Onboarding { has_token }, AuthEvent::OnboardingCompleted) => {
                AuthPhase::from_flags(true, has_token)
            }
            (Unauthenticated | Authenticated, AuthEvent::SignedIn) => Authenticated,
            (Unauthenticated | Authenticated, AuthEvent::SignedOut) => Unauthenticated,
            (phase, AuthEvent::OnboardingReset) => Onboarding {
                has_token: phase.has_token(),
            },
            (phase, AuthEvent::OnboardingCompleted) => phase,
        }
    }

    pub fn route(&self) -> Option<Route> {
        match self {
            AuthPhase::Uninitialized => None,
            AuthPhase::Onboarding { .. } => Some(Route::Onboarding),
            AuthPhase::Unauthenticated => Some(Route::Auth),
            AuthPhase::Authenticated => Some(Route::Main),
        }
    }

    /// Where to navigate from `current`, or `None` when already there (or
    /// still loading). Following the answer always reaches a fixed point.
    pub fn redirect(&self, current: Option<Route>) -> Option<Route> {
        let target = self.route()?;
        (current != Some(target)).then_some(target)
    }
}

/// Onboarding and session flags backed by the key-value store.
#[derive(Clone)]
pub struct AuthSession {
    storage: StorageService,
    phase: AuthPhase,
    token: Option<String>,
    email: Option<String>,
    user_id: Option<String>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("phase", &self.phase)
            .field("has_token", &self.token.is_some())
            .field("email", &self.email)
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl AuthSession {
    pub fn new(storage: StorageService) -> Self {
        Self {
            storage,
            phase: AuthPhase::Uninitialized,
            token: None,
            email: None,
            user_id: None,
        }
    }

    /// Storage read failures count as "not set".
    pub async fn load(storage: StorageService) -> Self {
        let mut session = Self::new(storage);
        session.refresh().await;
        session
    }

    pub async fn refresh(&mut self) {
        let has_completed_onboarding = self
            .storage
            .get_raw(keys::HAS_COMPLETED_ONBOARDING)
            .await
            .is_some_and(|v| v == "true");
        self.token = self.storage.get_raw(keys::USER_TOKEN).await;
        self.email = self.storage.get_raw(keys::USER_EMAIL).await;
        self.user_id = self.storage.get_raw(keys::USER_ID).await;
        self.phase = self.phase.apply(AuthEvent::Loaded {
            has_completed_onboarding,
            has_token: self.token.is_some(),
        });
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn has_completed_onboarding(&self) -> bool {
        !matches!(
            self.phase,
            AuthPhase::Uninitialized | AuthPhase::Onboarding { .. }
        )
    }

    pub fn route(&self) -> Option<Route> {
        self.phase.route()
    }

    pub fn redirect(&self, current: Option<Route>) -> Option<Route> {
        self.phase.redirect(current)
    }

    pub async fn sign_in(
        &mut self,
        token: &str,
        email: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<(), AppError> {
        if token.is_empty() {
            return Err(AppError::MissingToken);
        }
        self.storage.set_raw(keys::USER_TOKEN, token).await?;
        if let Some(email) = email {
            self.storage.set_raw(keys::USER_EMAIL, email).await?;
            self.email = Some(email.to_string());
        }
        if let Some(user_id) = user_id {
            self.storage.set_raw(keys::USER_ID, user_id).await?;
            self.user_id = Some(user_id.to_string());
        }
        self.token = Some(token.to_string());
        self.phase = self.phase.apply(AuthEvent::SignedIn);
        info!(phase = ?self.phase, "signed in");
        Ok(())
    }

    pub async fn sign_out(&mut self) -> Result<(), AppError> {
        self.storage
            .remove_many(&[keys::USER_TOKEN, keys::USER_EMAIL, keys::USER_ID])
            .await?;
        self.token = None;
        self.email = None;
        self.user_id = None;
        self.phase = self.phase.apply(AuthEvent::SignedOut);
        info!(phase = ?self.phase, "signed out");
        Ok(())
    }

    pub async fn complete_onboarding(&mut self) -> Result<(), AppError> {
        self.storage
            .set_raw(keys::HAS_COMPLETED_ONBOARDING, "true")
            .await?;
        self.phase = self.phase.apply(AuthEvent::OnboardingCompleted);
        info!(phase = ?self.phase, "onboarding completed");
        Ok(())
    }

    pub async fn reset_onboarding(&mut self) -> Result<(), AppError> {
        self.storage.remove(keys::HAS_COMPLETED_ONBOARDING).await?;
        self.phase = self.phase.apply(AuthEvent::OnboardingReset);
        info!(phase = ?self.phase, "onboarding reset");
        Ok(())
    }
}

/// Validates the form, authenticates against the backend and stores the
/// session.
pub async fn login(
    api: &ApiClient,
    session: &mut AuthSession,
    form: &LoginForm,
) -> Result<UserInfo, AppError> {
    form.validate()?;
    let email = form.email.trim();
    let response = api.login(email, &form.password).await?;
    session
        .sign_in(&response.token, Some(email), Some(&response.user.id))
        .await?;
    Ok(response.user)
}
