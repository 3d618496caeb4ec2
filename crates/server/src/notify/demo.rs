//! Simulated notification channels used when an integration is not configured.

use async_trait::async_trait;
use chrono::Utc;
use shiftdesk_core::{ContactInfo, Shift, ShiftId, UserId};
use tracing::info;

use super::{CalendarLink, CalendarScheduler, Channel, Notifier, NotifyError};

/// Logs the message it would have sent and reports success.
#[derive(Debug, Clone, Copy)]
pub struct DemoNotifier {
    channel: Channel,
}

impl DemoNotifier {
    #[must_use]
    pub const fn new(channel: Channel) -> Self {
        Self { channel }
    }

    fn simulated(&self) -> String {
        match self.channel {
            Channel::Discord => "Discord notification simulated (demo mode)".to_string(),
            Channel::Email => "Email simulated (demo mode)".to_string(),
            Channel::Calendar => "Calendar event simulated (demo mode)".to_string(),
        }
    }
}

#[async_trait]
impl Notifier for DemoNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn is_demo(&self) -> bool {
        true
    }

    fn is_ready(&self) -> bool {
        false
    }

    async fn notify_booking(
        &self,
        shift: &Shift,
        contact: &ContactInfo,
    ) -> Result<String, NotifyError> {
        info!(
            channel = %self.channel,
            shift_id = %shift.id,
            user = %contact.name,
            "Demo booking notification"
        );
        Ok(self.simulated())
    }

    async fn notify_cancellation(
        &self,
        shift: &Shift,
        contact: &ContactInfo,
    ) -> Result<String, NotifyError> {
        info!(
            channel = %self.channel,
            shift_id = %shift.id,
            user = %contact.name,
            "Demo cancellation notification"
        );
        Ok(self.simulated())
    }
}

/// Pretends to create calendar events immediately.
#[derive(Debug, Clone, Copy)]
pub struct DemoCalendar;

#[async_trait]
impl CalendarScheduler for DemoCalendar {
    fn is_demo(&self) -> bool {
        true
    }

    fn is_ready(&self) -> bool {
        false
    }

    async fn schedule(
        &self,
        user: UserId,
        shift: &Shift,
        _contact: &ContactInfo,
    ) -> Result<CalendarLink, NotifyError> {
        info!(user_id = %user, shift_id = %shift.id, "Demo calendar event");
        Ok(CalendarLink::EventCreated(format!(
            "https://calendar.google.com/event?eid=demo-{}",
            Utc::now().timestamp_millis()
        )))
    }

    async fn complete_authorization(
        &self,
        _user: UserId,
        _code: &str,
    ) -> Result<Vec<String>, NotifyError> {
        Ok(Vec::new())
    }

    async fn unschedule(&self, _shift: &ShiftId) -> Result<bool, NotifyError> {
        Ok(false)
    }
}
