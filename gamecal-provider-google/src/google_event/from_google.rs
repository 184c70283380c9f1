use gamecal_core::calendar::ExistingEvent;

pub trait FromGoogle {
    fn from_google(event: google_calendar::types::Event) -> Self;
}

impl FromGoogle for ExistingEvent {
    fn from_google(event: google_calendar::types::Event) -> Self {
        ExistingEvent {
            id: event.id,
            summary: event.summary,
            start: event.start.and_then(|s| s.date_time),
        }
    }
}
