use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tokio::sync::Mutex;
use tracing::info;

use super::{
    activities::ActivityRepository,
    mock::{generate_id, MockLatency},
    storage::StorageService,
};
use crate::{
    error::AppError,
    kv::keys,
    models::{
        activity::Activity,
        trip::{CreateTrip, Guest, GuestRole, Trip, TripFilter, UpdateTrip},
    },
};

/// Mock trips API over the local store.
///
/// Activities are kept in their own collection and attached on read.
/// Deleting a trip deletes its activities.
#[derive(Clone)]
pub struct TripRepository {
    storage: StorageService,
    activities: ActivityRepository,
    latency: MockLatency,
    write_lock: Arc<Mutex<()>>,
}

impl TripRepository {
    pub fn new(
        storage: StorageService,
        activities: ActivityRepository,
        latency: MockLatency,
    ) -> Self {
        Self {
            storage,
            activities,
            latency,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn load_all(&self) -> Vec<Trip> {
        self.storage
            .get::<Vec<Trip>>(keys::TRIPS)
            .await
            .unwrap_or_default()
    }

    async fn save_all(&self, trips: &[Trip]) -> Result<(), AppError> {
        self.storage.set(keys::TRIPS, trips).await
    }

    fn attach(trip: &mut Trip, activities: &[Activity]) {
        trip.activities = activities
            .iter()
            .filter(|a| a.trip_id == trip.id)
            .cloned()
            .collect();
    }

    pub async fn find_all(&self, filter: Option<&TripFilter>) -> Vec<Trip> {
        self.latency.wait().await;
        let activities = self.activities.load_all().await;
        self.load_all()
            .await
            .into_iter()
            .filter(|trip| filter.map_or(true, |f| f.matches(trip)))
            .map(|mut trip| {
                Self::attach(&mut trip, &activities);
                trip
            })
            .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> Option<Trip> {
        self.latency.wait().await;
        let mut trip = self.load_all().await.into_iter().find(|t| t.id == id)?;
        Self::attach(&mut trip, &self.activities.load_all().await);
        Some(trip)
    }

    pub async fn create(&self, dto: CreateTrip) -> Result<Trip, AppError> {
        self.latency.wait().await;
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_all().await;
        let trip = Trip::from_dto(generate_id("trip"), dto, Utc::now());
        all.push(trip.clone());
        self.save_all(&all).await?;
        info!(trip_id = %trip.id, "trip created");
        Ok(trip)
    }

    pub async fn update(&self, id: &str, patch: UpdateTrip) -> Result<Trip, AppError> {
        self.modify(id, |trip| {
            trip.apply(patch, Utc::now());
            Ok(())
        })
        .await
    }

    pub async fn add_guest(&self, trip_id: &str, guest: Guest) -> Result<Trip, AppError> {
        self.modify(trip_id, |trip| {
            trip.add_guest(guest)?;
            trip.updated_at = Utc::now();
            Ok(())
        })
        .await
    }

    pub async fn remove_guest(&self, trip_id: &str, guest_id: &str) -> Result<Trip, AppError> {
        self.modify(trip_id, |trip| {
            if !trip.remove_guest(guest_id) {
                return Err(AppError::NotFound(format!("guest {guest_id}")));
            }
            trip.updated_at = Utc::now();
            Ok(())
        })
        .await
    }

    async fn modify<F>(&self, id: &str, change: F) -> Result<Trip, AppError>
    where
        F: FnOnce(&mut Trip) -> Result<(), AppError>,
    {
        self.latency.wait().await;
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_all().await;
        let trip = all
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("trip {id}")))?;
        change(trip)?;
        let mut updated = trip.clone();
        self.save_all(&all).await?;
        info!(trip_id = %id, "trip updated");
        Self::attach(&mut updated, &self.activities.load_all().await);
        Ok(updated)
    }

    /// Removes the trip and its activities. Unknown ids are a no-op.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.latency.wait().await;
        {
            let _guard = self.write_lock.lock().await;
            let mut all = self.load_all().await;
            all.retain(|t| t.id != id);
            self.save_all(&all).await?;
        }
        self.activities.delete_by_trip(id).await?;
        info!(trip_id = %id, "trip deleted");
        Ok(())
    }

    pub async fn clear_all(&self) -> Result<(), AppError> {
        self.storage.remove(keys::TRIPS).await?;
        self.activities.clear_all().await?;
        info!("all trips cleared");
        Ok(())
    }

    /// Replaces trips and activities with a small fixed sample.
    pub async fn seed_mock_data(&self) -> Result<Vec<Trip>, AppError> {
        let now = Utc::now();
        let first_start = Utc
            .with_ymd_and_hms(2025, 10, 25, 9, 0, 0)
            .single()
            .ok_or_else(|| AppError::Other(anyhow::anyhow!("invalid seed date")))?;
        let second_start = first_start + Duration::days(20);
        let trips = vec![
            Trip {
                id: "1".into(),
                title: "Fim de semana em Ubatuba".into(),
                origin: "São Paulo".into(),
                destination: "Ubatuba".into(),
                start_date: first_start,
                end_date: first_start + Duration::days(3),
                description: Some("Praia e churrasco".into()),
                image_url: None,
                activities: Vec::new(),
                guests: vec![Guest {
                    id: "g1".into(),
                    email: "nicolas@example.com".into(),
                    role: GuestRole::Editor,
                    name: Some("Nicolas".into()),
                    avatar: None,
                }],
                created_at: now,
                updated_at: now,
            },
            Trip {
                id: "2".into(),
                title: "Noronha".into(),
                origin: "Recife".into(),
                destination: "Fernando de Noronha".into(),
                start_date: second_start,
                end_date: second_start + Duration::days(6),
                description: None,
                image_url: None,
                activities: Vec::new(),
                guests: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        ];
        {
            let _guard = self.write_lock.lock().await;
            self.save_all(&trips).await?;
        }
        self.activities.seed_mock_data().await?;
        info!(count = trips.len(), "mock trips seeded");
        Ok(self.find_all(None).await)
    }
}
