use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use super::{
    mock::{generate_id, MockLatency},
    storage::StorageService,
};
use crate::{
    error::AppError,
    kv::keys,
    models::activity::{Activity, CreateActivity, UpdateActivity},
};

/// Mock activities API over the local store.
///
/// Every call loads the whole collection and writes it back.
#[derive(Clone)]
pub struct ActivityRepository {
    storage: StorageService,
    latency: MockLatency,
    write_lock: Arc<Mutex<()>>,
}

impl ActivityRepository {
    pub fn new(storage: StorageService, latency: MockLatency) -> Self {
        Self {
            storage,
            latency,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub(crate) async fn load_all(&self) -> Vec<Activity> {
        self.storage
            .get::<Vec<Activity>>(keys::ACTIVITIES)
            .await
            .unwrap_or_default()
    }

    async fn save_all(&self, activities: &[Activity]) -> Result<(), AppError> {
        self.storage.set(keys::ACTIVITIES, activities).await
    }

    pub async fn find_all(&self, trip_id: Option<&str>) -> Vec<Activity> {
        self.latency.wait().await;
        let all = self.load_all().await;
        match trip_id {
            Some(trip_id) => all.into_iter().filter(|a| a.trip_id == trip_id).collect(),
            None => all,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Option<Activity> {
        self.latency.wait().await;
        self.load_all().await.into_iter().find(|a| a.id == id)
    }

    pub async fn find_by_date(&self, date: NaiveDate, trip_id: Option<&str>) -> Vec<Activity> {
        let mut found: Vec<Activity> = self
            .find_all(trip_id)
            .await
            .into_iter()
            .filter(|a| a.date == date)
            .collect();
        found.sort_by_key(|a| a.time);
        found
    }

    pub async fn create(&self, dto: CreateActivity) -> Result<Activity, AppError> {
        self.latency.wait().await;
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_all().await;
        let activity = Activity::from_dto(generate_id("activity"), dto, Utc::now());
        all.push(activity.clone());
        self.save_all(&all).await?;
        info!(activity_id = %activity.id, "activity created");
        Ok(activity)
    }

    pub async fn update(&self, id: &str, patch: UpdateActivity) -> Result<Activity, AppError> {
        self.latency.wait().await;
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_all().await;
        let activity = all
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("activity {id}")))?;
        activity.apply(patch, Utc::now());
        let updated = activity.clone();
        self.save_all(&all).await?;
        info!(activity_id = %id, "activity updated");
        Ok(updated)
    }

    pub async fn toggle_complete(&self, id: &str) -> Result<Activity, AppError> {
        let current = self
            .find_by_id(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("activity {id}")))?;
        self.update(
            id,
            UpdateActivity {
                completed: Some(!current.completed),
                ..Default::default()
            },
        )
        .await
    }

    /// Deleting an unknown id is a no-op.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.latency.wait().await;
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_all().await;
        all.retain(|a| a.id != id);
        self.save_all(&all).await?;
        info!(activity_id = %id, "activity deleted");
        Ok(())
    }

    pub async fn delete_by_trip(&self, trip_id: &str) -> Result<usize, AppError> {
        self.latency.wait().await;
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_all().await;
        let before = all.len();
        all.retain(|a| a.trip_id != trip_id);
        let removed = before - all.len();
        self.save_all(&all).await?;
        info!(trip_id, removed, "trip activities deleted");
        Ok(removed)
    }

    pub async fn clear_all(&self) -> Result<(), AppError> {
        self.storage.remove(keys::ACTIVITIES).await?;
        info!("all activities cleared");
        Ok(())
    }

    /// Replaces the collection with two fixed sample activities.
    pub async fn seed_mock_data(&self) -> Result<Vec<Activity>, AppError> {
        let now = Utc::now();
        let date = NaiveDate::from_ymd_opt(2025, 10, 26)
            .ok_or_else(|| AppError::Other(anyhow::anyhow!("invalid seed date")))?;
        let seed = [
            ("1", "Churrasco na praia", (12, 0), "1", true),
            ("2", "Mergulho com snorkel", (14, 30), "2", false),
        ];
        let mut activities = Vec::with_capacity(seed.len());
        for (id, title, (hour, minute), trip_id, completed) in seed {
            let time = NaiveTime::from_hms_opt(hour, minute, 0)
                .ok_or_else(|| AppError::Other(anyhow::anyhow!("invalid seed time")))?;
            activities.push(Activity {
                id: id.to_string(),
                title: title.to_string(),
                time,
                date,
                trip_id: trip_id.to_string(),
                completed,
                created_at: now,
                updated_at: now,
            });
        }
        let _guard = self.write_lock.lock().await;
        self.save_all(&activities).await?;
        info!(count = activities.len(), "mock activities seeded");
        Ok(activities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> ActivityRepository {
        ActivityRepository::new(StorageService::in_memory(), MockLatency::NONE)
    }

    fn dto(title: &str, trip_id: &str, hour: u32) -> CreateActivity {
        CreateActivity {
            title: title.into(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            date: NaiveDate::from_ymd_opt(2025, 10, 26).unwrap(),
            trip_id: trip_id.into(),
            completed: false,
        }
    }

    #[tokio::test]
    async fn created_activity_reads_back_unchanged() {
        let repo = repo();
        let input = CreateActivity {
            time: NaiveTime::from_hms_opt(9, 15, 42).unwrap(),
            completed: true,
            ..dto("Trilha", "t1", 9)
        };
        let created = repo.create(input.clone()).await.unwrap();
        assert!(created.id.starts_with("activity_"));
        assert_eq!(created.title, input.title);
        assert_eq!(created.date, input.date);
        assert_eq!(created.trip_id, input.trip_id);
        assert!(created.completed);
        assert_eq!(created.time, NaiveTime::from_hms_opt(9, 15, 0).unwrap());
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(repo.find_by_id(&created.id).await, Some(created.clone()));

        let updated = repo
            .update(
                &created.id,
                UpdateActivity {
                    time: NaiveTime::from_hms_opt(10, 45, 30),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(repo.find_by_id(&created.id).await, Some(updated));
    }

    #[tokio::test]
    async fn toggle_flips_completion() {
        let repo = repo();
        let created = repo.create(dto("Trilha", "t1", 9)).await.unwrap();
        assert!(repo.toggle_complete(&created.id).await.unwrap().completed);
        assert!(!repo.toggle_complete(&created.id).await.unwrap().completed);
        assert!(repo.toggle_complete("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn by_date_is_sorted_by_time() {
        let repo = repo();
        repo.create(dto("Jantar", "t1", 20)).await.unwrap();
        repo.create(dto("Café", "t1", 8)).await.unwrap();
        repo.create(dto("Outra viagem", "t2", 10)).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 10, 26).unwrap();
        let titles: Vec<_> = repo
            .find_by_date(day, Some("t1"))
            .await
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["Café", "Jantar"]);
    }

    #[tokio::test]
    async fn delete_by_trip_keeps_other_trips() {
        let repo = repo();
        repo.create(dto("A", "t1", 9)).await.unwrap();
        repo.create(dto("B", "t1", 10)).await.unwrap();
        repo.create(dto("C", "t2", 11)).await.unwrap();

        assert_eq!(repo.delete_by_trip("t1").await.unwrap(), 2);
        let left = repo.find_all(None).await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].trip_id, "t2");
    }

    #[tokio::test]
    async fn seed_replaces_collection() {
        let repo = repo();
        repo.create(dto("A", "t9", 9)).await.unwrap();
        let seeded = repo.seed_mock_data().await.unwrap();
        assert_eq!(seeded.len(), 2);
        assert_eq!(repo.find_all(None).await, seeded);

        repo.clear_all().await.unwrap();
        assert!(repo.find_all(None).await.is_empty());
    }
}
