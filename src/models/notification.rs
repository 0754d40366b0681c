use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "trip_invite", alias = "TRIP_INVITE", alias = "trip-invite")]
    TripInvite,
    #[serde(rename = "friend_request", alias = "FRIEND_REQUEST", alias = "friend-request")]
    FriendRequest,
    #[serde(rename = "friend_accept", alias = "FRIEND_ACCEPT", alias = "friend-accept")]
    FriendAccept,
    #[serde(rename = "alert", alias = "ALERT")]
    Alert,
    #[serde(other)]
    Unknown,
}

impl NotificationKind {
    /// Whether the user is expected to accept or decline.
    pub fn needs_response(&self) -> bool {
        matches!(self, NotificationKind::TripInvite | NotificationKind::FriendRequest)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type", alias = "tipo")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    /// Trip id for invites, friend-request id for friend requests.
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub trip_name: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn summary(&self) -> String {
        let sender = self.sender_name.as_deref().unwrap_or("someone");
        match self.kind {
            NotificationKind::TripInvite => format!(
                "{sender} invited you to the trip {}",
                self.trip_name.as_deref().unwrap_or("(untitled)")
            ),
            NotificationKind::FriendRequest => format!("{sender} sent you a friend request"),
            NotificationKind::FriendAccept => {
                format!("Friend request accepted. You and {sender} are now friends")
            }
            NotificationKind::Alert | NotificationKind::Unknown => {
                "General system notice.".to_string()
            }
        }
    }

    pub fn needs_response(&self) -> bool {
        self.kind.needs_response()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSection {
    pub title: &'static str,
    pub items: Vec<Notification>,
}

/// Splits into "Today" and "Earlier" by local calendar day, newest first.
/// Empty sections are dropped.
pub fn group_by_day(mut items: Vec<Notification>, today: NaiveDate) -> Vec<NotificationSection> {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let (recent, earlier): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|n| n.created_at.with_timezone(&Local).date_naive() == today);

    [("Today", recent), ("Earlier", earlier)]
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(title, items)| NotificationSection { title, items })
        .collect()
}
