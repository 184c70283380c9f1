use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use gamecal_core::calendar::{EventTime, NewEvent};

pub trait ToGoogle {
    fn to_google(&self) -> google_calendar::types::Event;
}

impl ToGoogle for NewEvent {
    fn to_google(&self) -> google_calendar::types::Event {
        google_calendar::types::Event {
            summary: self.summary.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            start: Some(event_time_to_google(&self.start)),
            end: Some(event_time_to_google(&self.end)),
            reminders: Some(google_calendar::types::Reminders {
                overrides: vec![],
                use_default: self.use_default_reminders,
            }),
            ..Default::default()
        }
    }
}

/// Google wants an instant plus the zone it should be displayed in.
fn event_time_to_google(time: &EventTime) -> google_calendar::types::EventDateTime {
    let instant = time
        .time_zone
        .parse::<Tz>()
        .ok()
        .and_then(|tz| tz.from_local_datetime(&time.date_time).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| time.date_time.and_utc());

    google_calendar::types::EventDateTime {
        date: None,
        date_time: Some(instant),
        time_zone: time.time_zone.clone(),
    }
}
