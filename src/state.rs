use crate::{
    config::AppConfig,
    error::AppError,
    services::{
        activities::ActivityRepository, api::ApiClient, mock::MockLatency,
        storage::StorageService, trips::TripRepository,
    },
};

/// Everything a screen needs, wired against one shared store.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: StorageService,
    pub api: ApiClient,
    pub trips: TripRepository,
    pub activities: ActivityRepository,
}

impl AppState {
    pub fn new(config: AppConfig, storage: StorageService) -> Result<Self, AppError> {
        let latency = MockLatency(config.mock_delay);
        let api = ApiClient::new(&config.api_url, storage.clone(), config.connect_timeout)?;
        let activities = ActivityRepository::new(storage.clone(), latency);
        let trips = TripRepository::new(storage.clone(), activities.clone(), latency);
        Ok(Self {
            config,
            storage,
            api,
            trips,
            activities,
        })
    }

    pub async fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let storage = StorageService::open(&config.storage).await?;
        Self::new(config, storage)
    }
}
