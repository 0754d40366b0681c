use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub title: String,
    #[serde(with = "hour_minute")]
    pub time: NaiveTime,
    pub date: NaiveDate,
    pub trip_id: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivity {
    pub title: String,
    #[serde(with = "hour_minute")]
    pub time: NaiveTime,
    pub date: NaiveDate,
    pub trip_id: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivity {
    pub title: Option<String>,
    #[serde(default, with = "hour_minute::option")]
    pub time: Option<NaiveTime>,
    pub date: Option<NaiveDate>,
    pub trip_id: Option<String>,
    pub completed: Option<bool>,
}

impl Activity {
    pub fn from_dto(id: String, dto: CreateActivity, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: dto.title,
            time: hour_minute::truncate(dto.time),
            date: dto.date,
            trip_id: dto.trip_id,
            completed: dto.completed,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: UpdateActivity, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(time) = patch.time {
            self.time = hour_minute::truncate(time);
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(trip_id) = patch.trip_id {
            self.trip_id = trip_id;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = now;
    }
}

/// `HH:MM`, the format the app stores activity times in.
pub mod hour_minute {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Drops seconds and below so a value equals its stored form.
    pub fn truncate(time: NaiveTime) -> NaiveTime {
        NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
    }

    /// Accepts `HH:MM` and, for older entries, `HH:MM:SS`.
    pub fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => super::serialize(time, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
