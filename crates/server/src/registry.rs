//! In-memory user registry behind personal booking links.
//!
//! Users exist only for the lifetime of the process.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use shiftdesk_core::{
    BookingId, Email, NotificationPreferences, Shift, ShiftId, UserId, hhmm,
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Window for the `recentlyCreated` statistic.
const RECENT_WINDOW_DAYS: i64 = 7;

/// Errors returned by the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("name is required")]
    MissingName,
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),
}

/// A registered user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    pub email: Option<Email>,
    pub discord_id: Option<String>,
    pub preferences: NotificationPreferences,
    pub created_at: DateTime<Utc>,
    /// Served by the bookings endpoint, not with the profile.
    #[serde(skip)]
    pub bookings: Vec<BookingRecord>,
}

/// Snapshot of the shift a booking refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSnapshot {
    pub shift_id: ShiftId,
    #[serde(default)]
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub location: String,
}

impl From<&Shift> for ShiftSnapshot {
    fn from(shift: &Shift) -> Self {
        Self {
            shift_id: shift.id.clone(),
            title: shift.title.clone(),
            date: shift.date,
            start_time: shift.start_time,
            end_time: shift.end_time,
            location: shift.location.clone(),
        }
    }
}

/// One entry in a user's booking history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    #[serde(flatten)]
    pub shift: ShiftSnapshot,
    pub booking_id: BookingId,
    pub booked_at: DateTime<Utc>,
}

/// Partial preferences update; absent fields keep their value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub enable_email: Option<bool>,
    #[serde(rename = "enableDiscord", alias = "enableChat")]
    pub enable_chat: Option<bool>,
    pub enable_calendar: Option<bool>,
}

impl PreferencesUpdate {
    fn apply(self, prefs: &mut NotificationPreferences) {
        if let Some(v) = self.enable_email {
            prefs.enable_email = v;
        }
        if let Some(v) = self.enable_chat {
            prefs.enable_chat = v;
        }
        if let Some(v) = self.enable_calendar {
            prefs.enable_calendar = v;
        }
    }
}

/// Aggregate counts over all users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: usize,
    pub users_with_email: usize,
    pub users_with_discord: usize,
    pub total_bookings: usize,
    pub recently_created: usize,
}

/// Thread-safe map from user ID to user.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: RwLock<HashMap<UserId, User>>,
}

impl UserRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user with a fresh ID.
    ///
    /// Preferences start enabled for each channel whose address is known;
    /// calendar starts disabled.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::MissingName` for a blank name.
    pub async fn create(
        &self,
        name: &str,
        email: Option<Email>,
        discord_id: Option<String>,
    ) -> Result<User, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::MissingName);
        }
        let discord_id = discord_id
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let user = User {
            user_id: UserId::generate(),
            name: name.to_string(),
            preferences: NotificationPreferences::for_contact(
                email.is_some(),
                discord_id.is_some(),
            ),
            email,
            discord_id,
            created_at: Utc::now(),
            bookings: Vec::new(),
        };

        self.users.write().await.insert(user.user_id, user.clone());
        debug!(user_id = %user.user_id, "User registered");
        Ok(user)
    }

    /// Look up a user.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UserNotFound` for unknown IDs.
    pub async fn get(&self, id: UserId) -> Result<User, RegistryError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RegistryError::UserNotFound(id))
    }

    /// Merge a partial update into a user's preferences.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UserNotFound` for unknown IDs.
    pub async fn update_preferences(
        &self,
        id: UserId,
        update: PreferencesUpdate,
    ) -> Result<NotificationPreferences, RegistryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RegistryError::UserNotFound(id))?;
        update.apply(&mut user.preferences);
        Ok(user.preferences)
    }

    /// A user's booking history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UserNotFound` for unknown IDs.
    pub async fn bookings(&self, id: UserId) -> Result<Vec<BookingRecord>, RegistryError> {
        self.users
            .read()
            .await
            .get(&id)
            .map(|u| u.bookings.clone())
            .ok_or(RegistryError::UserNotFound(id))
    }

    /// Append a booking record with a fresh booking ID and timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UserNotFound` for unknown IDs.
    pub async fn append_booking(
        &self,
        id: UserId,
        shift: ShiftSnapshot,
    ) -> Result<BookingRecord, RegistryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RegistryError::UserNotFound(id))?;

        let record = BookingRecord {
            shift,
            booking_id: BookingId::generate(),
            booked_at: Utc::now(),
        };
        user.bookings.push(record.clone());
        Ok(record)
    }

    /// Remove one booking record.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UserNotFound` for unknown users and
    /// `RegistryError::BookingNotFound` when nothing was removed.
    pub async fn remove_booking(
        &self,
        id: UserId,
        booking_id: BookingId,
    ) -> Result<(), RegistryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RegistryError::UserNotFound(id))?;

        let before = user.bookings.len();
        user.bookings.retain(|b| b.booking_id != booking_id);
        if user.bookings.len() == before {
            return Err(RegistryError::BookingNotFound(booking_id));
        }
        Ok(())
    }

    /// Remove every record of a shift from a user's history.
    ///
    /// Returns how many records were dropped; unknown users drop none.
    pub async fn remove_shift_bookings(&self, id: UserId, shift_id: &ShiftId) -> usize {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return 0;
        };
        let before = user.bookings.len();
        user.bookings.retain(|b| &b.shift.shift_id != shift_id);
        before - user.bookings.len()
    }

    /// Aggregate counts.
    pub async fn stats(&self) -> UserStats {
        let users = self.users.read().await;
        let cutoff = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);

        users.values().fold(UserStats::default(), |mut acc, user| {
            acc.total_users += 1;
            acc.users_with_email += usize::from(user.email.is_some());
            acc.users_with_discord += usize::from(user.discord_id.is_some());
            acc.total_bookings += user.bookings.len();
            acc.recently_created += usize::from(user.created_at > cutoff);
            acc
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot(id: &str) -> ShiftSnapshot {
        ShiftSnapshot {
            shift_id: ShiftId::new(id),
            title: "Turno Serale Bar".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            location: "Sala Principale".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_defaults_preferences_from_contact() {
        let registry = UserRegistry::new();

        let only_name = registry.create("  Anna ", None, None).await.unwrap();
        assert_eq!(only_name.name, "Anna");
        assert_eq!(only_name.preferences, NotificationPreferences::default());

        let with_email = registry
            .create("Bruno", Email::parse("bruno@example.org").ok(), Some(" ".to_string()))
            .await
            .unwrap();
        assert!(with_email.preferences.enable_email);
        assert!(!with_email.preferences.enable_chat);
        assert!(with_email.discord_id.is_none());

        assert_eq!(
            registry.create("   ", None, None).await.unwrap_err(),
            RegistryError::MissingName
        );
    }

    #[tokio::test]
    async fn test_update_preferences_merges() {
        let registry = UserRegistry::new();
        let user = registry
            .create("Anna", Email::parse("anna@example.org").ok(), None)
            .await
            .unwrap();

        let update: PreferencesUpdate =
            serde_json::from_str(r#"{"enableCalendar":true}"#).unwrap();
        let prefs = registry
            .update_preferences(user.user_id, update)
            .await
            .unwrap();

        assert!(prefs.enable_email);
        assert!(prefs.enable_calendar);
        assert!(!prefs.enable_chat);
    }

    #[tokio::test]
    async fn test_booking_history() {
        let registry = UserRegistry::new();
        let user = registry.create("Anna", None, None).await.unwrap();

        let first = registry
            .append_booking(user.user_id, snapshot("a"))
            .await
            .unwrap();
        registry
            .append_booking(user.user_id, snapshot("b"))
            .await
            .unwrap();
        assert_eq!(registry.bookings(user.user_id).await.unwrap().len(), 2);

        registry
            .remove_booking(user.user_id, first.booking_id)
            .await
            .unwrap();
        assert_eq!(
            registry
                .remove_booking(user.user_id, first.booking_id)
                .await
                .unwrap_err(),
            RegistryError::BookingNotFound(first.booking_id)
        );

        assert_eq!(
            registry
                .remove_shift_bookings(user.user_id, &ShiftId::new("b"))
                .await,
            1
        );
        assert!(registry.bookings(user.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let registry = UserRegistry::new();
        let missing = UserId::generate();
        assert_eq!(
            registry.get(missing).await.unwrap_err(),
            RegistryError::UserNotFound(missing)
        );
        assert!(registry.append_booking(missing, snapshot("a")).await.is_err());
        assert_eq!(
            registry.remove_shift_bookings(missing, &ShiftId::new("a")).await,
            0
        );
    }

    #[tokio::test]
    async fn test_stats() {
        let registry = UserRegistry::new();
        let anna = registry
            .create("Anna", Email::parse("anna@example.org").ok(), None)
            .await
            .unwrap();
        registry
            .create("Bruno", None, Some("bruno#1".to_string()))
            .await
            .unwrap();
        registry
            .append_booking(anna.user_id, snapshot("a"))
            .await
            .unwrap();

        let stats = registry.stats().await;
        assert_eq!(
            stats,
            UserStats {
                total_users: 2,
                users_with_email: 1,
                users_with_discord: 1,
                total_bookings: 1,
                recently_created: 2,
            }
        );
    }

    #[test]
    fn test_record_json_flattens_snapshot() {
        let record = BookingRecord {
            shift: snapshot("a"),
            booking_id: BookingId::generate(),
            booked_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["shiftId"], "a");
        assert_eq!(json["startTime"], "18:00");
        assert!(json.get("bookingId").is_some());
    }
}
