//! Shared plumbing of the local mock API.

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

/// Artificial latency applied before every mock operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockLatency(pub Duration);

impl MockLatency {
    pub const NONE: MockLatency = MockLatency(Duration::ZERO);

    pub async fn wait(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

/// `<prefix>_<unix millis>_<9 random chars>`. Good enough for local data only.
pub fn generate_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}
