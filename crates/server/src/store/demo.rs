//! In-memory shift store used when Notion is not configured.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use rand::Rng;
use shiftdesk_core::{
    ContactInfo, Email, Occupant, Shift, ShiftId, ShiftStats, ShiftStatus, check_booking_conflict,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ShiftStore, StoreError, sort_by_schedule};

/// Number of days, starting today, covered by generated shifts.
const DEMO_DAYS: i64 = 14;

/// A recurring slot in the generated schedule.
struct Slot {
    index: u8,
    title: &'static str,
    description: &'static str,
    start: (u32, u32),
    end: (u32, u32),
    location: &'static str,
    booked_probability: f64,
    volunteer: (&'static str, &'static str, &'static str),
    notes: Option<&'static str>,
}

const EVENING: Slot = Slot {
    index: 1,
    title: "Turno Serale Bar",
    description: "Bar and till during evening events",
    start: (18, 0),
    end: (22, 0),
    location: "Sala Principale",
    booked_probability: 0.3,
    volunteer: ("Mario Rossi", "mario.rossi@email.com", "mario#1234"),
    notes: None,
};

const AFTERNOON: Slot = Slot {
    index: 2,
    title: "Turno Pomeridiano",
    description: "Bar during afternoon events",
    start: (14, 0),
    end: (18, 0),
    location: "Sala Piccola",
    booked_probability: 0.4,
    volunteer: ("Giulia Bianchi", "giulia.bianchi@email.com", "giulia#5678"),
    notes: None,
};

const FRIDAY_SPECIAL: Slot = Slot {
    index: 3,
    title: "Turno Weekend Speciale",
    description: "Bar during busy weekend events",
    start: (19, 0),
    end: (23, 0),
    location: "Sala Principale",
    booked_probability: 0.5,
    volunteer: ("Luca Verdi", "luca.verdi@email.com", "luca#9999"),
    notes: Some("Extra responsibility shift"),
};

/// Shift store holding generated shifts in process memory.
///
/// Every mutation holds one async mutex for its whole check-and-set, so two
/// concurrent bookings of the same shift cannot both succeed.
pub struct DemoStore {
    shifts: Mutex<Vec<Shift>>,
}

impl DemoStore {
    /// Create a store over the given shifts.
    #[must_use]
    pub fn with_shifts(mut shifts: Vec<Shift>) -> Self {
        sort_by_schedule(&mut shifts);
        Self {
            shifts: Mutex::new(shifts),
        }
    }

    /// Create a store with two weeks of generated shifts starting today.
    #[must_use]
    pub fn generate() -> Self {
        let shifts = generate_shifts(Utc::now(), &mut rand::rng());
        info!(count = shifts.len(), "Demo shift store generated");
        Self::with_shifts(shifts)
    }
}

#[async_trait]
impl ShiftStore for DemoStore {
    fn is_demo(&self) -> bool {
        true
    }

    async fn list_available(&self) -> Result<Vec<Shift>, StoreError> {
        let shifts = self.shifts.lock().await;
        Ok(shifts
            .iter()
            .filter(|s| s.status.is_available())
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Shift>, StoreError> {
        Ok(self.shifts.lock().await.clone())
    }

    async fn get(&self, id: &ShiftId) -> Result<Shift, StoreError> {
        let shifts = self.shifts.lock().await;
        shifts
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn book(&self, id: &ShiftId, contact: &ContactInfo) -> Result<Shift, StoreError> {
        let mut shifts = self.shifts.lock().await;

        let position = shifts
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let held: Vec<&Shift> = shifts
            .iter()
            .filter(|s| s.is_booked_by(&contact.name))
            .collect();
        let candidate = shifts
            .get(position)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        check_booking_conflict(candidate, held)?;

        let shift = shifts
            .get_mut(position)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        shift.mark_booked(Occupant::from(contact), Utc::now());
        debug!(shift_id = %id, "Demo shift booked");

        Ok(shift.clone())
    }

    async fn release(&self, id: &ShiftId, name: &str) -> Result<Shift, StoreError> {
        let mut shifts = self.shifts.lock().await;

        let shift = shifts
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if !shift.is_booked_by(name) {
            return Err(StoreError::NotHeldBy(id.clone()));
        }

        shift.release(Utc::now());
        debug!(shift_id = %id, "Demo shift released");

        Ok(shift.clone())
    }

    async fn stats(&self) -> Result<ShiftStats, StoreError> {
        let shifts = self.shifts.lock().await;
        Ok(ShiftStats::tally(shifts.iter().map(|s| s.status)))
    }
}

/// Generate weekday shifts for the next [`DEMO_DAYS`] days.
///
/// Each weekday gets an evening shift; every third day also an afternoon
/// shift; Fridays a late special. Some start out booked.
fn generate_shifts(now: DateTime<Utc>, rng: &mut impl Rng) -> Vec<Shift> {
    let today = now.date_naive();
    let mut shifts = Vec::new();

    for offset in 0..DEMO_DAYS {
        let date = today + Duration::days(offset);
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }

        let mut slots = vec![&EVENING];
        if offset % 3 == 0 {
            slots.push(&AFTERNOON);
        }
        if date.weekday() == Weekday::Fri {
            slots.push(&FRIDAY_SPECIAL);
        }

        for slot in slots {
            if let Some(shift) = build_shift(offset, date, slot, now, rng) {
                shifts.push(shift);
            }
        }
    }

    sort_by_schedule(&mut shifts);
    shifts
}

fn build_shift(
    offset: i64,
    date: NaiveDate,
    slot: &Slot,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Option<Shift> {
    let start_time = NaiveTime::from_hms_opt(slot.start.0, slot.start.1, 0)?;
    let end_time = NaiveTime::from_hms_opt(slot.end.0, slot.end.1, 0)?;

    let booked = rng.random_bool(slot.booked_probability);
    let (name, email, handle) = slot.volunteer;
    let occupant = booked.then(|| Occupant {
        name: name.to_string(),
        email: Email::parse(email).ok(),
        discord_id: Some(handle.to_string()),
        notes: slot.notes.map(str::to_string),
    });

    Some(Shift {
        id: ShiftId::new(format!("demo-shift-{offset}-{}", slot.index)),
        title: slot.title.to_string(),
        description: slot.description.to_string(),
        date,
        start_time,
        end_time,
        location: slot.location.to_string(),
        status: if booked {
            ShiftStatus::Booked
        } else {
            ShiftStatus::Available
        },
        occupant,
        created_time: now - Duration::days(7),
        last_edited_time: now - Duration::days(1),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn shift(id: &str, day: u32, start: &str, end: &str) -> Shift {
        let now = Utc::now();
        Shift {
            id: ShiftId::new(id),
            title: "Turno".to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            start_time: Shift::parse_time(start).unwrap(),
            end_time: Shift::parse_time(end).unwrap(),
            location: "Sala Principale".to_string(),
            status: ShiftStatus::Available,
            occupant: None,
            created_time: now,
            last_edited_time: now,
        }
    }

    fn store() -> DemoStore {
        DemoStore::with_shifts(vec![
            shift("c", 4, "09:30", "10:30"),
            shift("a", 3, "09:00", "10:00"),
            shift("b", 3, "18:00", "22:00"),
            shift("d", 4, "10:00", "11:00"),
        ])
    }

    #[test]
    fn test_generated_schedule_shape() {
        // 2025-03-03 is a Monday
        let now = NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            .and_utc();
        let shifts = generate_shifts(now, &mut StdRng::seed_from_u64(7));

        assert!(shifts.iter().all(|s| !matches!(
            s.date.weekday(),
            Weekday::Sat | Weekday::Sun
        )));
        // 10 weekdays of evening shifts
        assert_eq!(shifts.iter().filter(|s| s.id.as_str().ends_with("-1")).count(), 10);
        // Fridays 2025-03-07 and 2025-03-14
        assert_eq!(shifts.iter().filter(|s| s.id.as_str().ends_with("-3")).count(), 2);
        assert!(shifts.windows(2).all(|w| w[0].schedule_key() <= w[1].schedule_key()));
        assert!(
            shifts
                .iter()
                .all(|s| (s.status == ShiftStatus::Booked) == s.occupant.is_some())
        );
    }

    #[tokio::test]
    async fn test_list_available_is_sorted_and_filtered() {
        let store = store();
        store
            .book(&ShiftId::new("b"), &ContactInfo::named("Anna"))
            .await
            .unwrap();

        let available = store.list_available().await.unwrap();
        let ids: Vec<&str> = available.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "d"]);
    }

    #[tokio::test]
    async fn test_second_booking_of_same_shift_conflicts() {
        let store = store();
        let id = ShiftId::new("a");
        store.book(&id, &ContactInfo::named("Anna")).await.unwrap();

        let err = store.book(&id, &ContactInfo::named("Bruno")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(c) if c.reason() == "not available"));

        let shift = store.get(&id).await.unwrap();
        assert!(shift.is_booked_by("Anna"));
    }

    #[tokio::test]
    async fn test_same_day_and_overlap_rules() {
        let store = store();
        store
            .book(&ShiftId::new("a"), &ContactInfo::named("Anna"))
            .await
            .unwrap();

        let same_day = store
            .book(&ShiftId::new("b"), &ContactInfo::named("anna"))
            .await
            .unwrap_err();
        assert!(matches!(same_day, StoreError::Conflict(c) if c.reason() == "already has a shift"));

        let overlap = store
            .book(&ShiftId::new("c"), &ContactInfo::named("Anna"))
            .await
            .unwrap_err();
        assert!(matches!(overlap, StoreError::Conflict(c) if c.reason() == "time conflict"));

        store
            .book(&ShiftId::new("d"), &ContactInfo::named("Anna"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_release_requires_matching_name() {
        let store = store();
        let id = ShiftId::new("a");
        store.book(&id, &ContactInfo::named("Anna")).await.unwrap();

        let err = store.release(&id, "Bruno").await.unwrap_err();
        assert!(matches!(err, StoreError::NotHeldBy(_)));
        assert_eq!(store.get(&id).await.unwrap().status, ShiftStatus::Booked);

        let released = store.release(&id, "Anna").await.unwrap();
        assert_eq!(released.status, ShiftStatus::Available);
        assert!(released.occupant.is_none());
    }

    #[tokio::test]
    async fn test_unknown_shift_is_not_found() {
        let store = store();
        let missing = ShiftId::new("missing");
        assert!(matches!(
            store.get(&missing).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.book(&missing, &ContactInfo::named("Anna")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_bookings_have_one_winner() {
        let store = Arc::new(store());
        let id = ShiftId::new("a");

        let handles: Vec<_> = ["Anna", "Bruno", "Carla", "Dario"]
            .into_iter()
            .map(|name| {
                let store = Arc::clone(&store);
                let id = id.clone();
                tokio::spawn(async move { store.book(&id, &ContactInfo::named(name)).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let store = store();
        store
            .book(&ShiftId::new("a"), &ContactInfo::named("Anna"))
            .await
            .unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.booked, 1);
        assert_eq!(stats.available, 3);
    }
}
