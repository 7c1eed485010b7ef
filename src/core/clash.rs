use crate::domain::model::{AnnotatedEvent, CalendarEvent, ClashStatus, FoundEvent};
use chrono::NaiveDate;
use std::collections::HashMap;

/// 以日期比對行事曆，標記撞期的活動
#[derive(Debug, Clone, Default)]
pub struct CalendarClashDetector {
    by_date: HashMap<NaiveDate, String>,
}

impl CalendarClashDetector {
    /// One entry per date; a later calendar entry on the same date replaces the earlier one.
    pub fn new(calendar: &[CalendarEvent]) -> Self {
        let mut by_date = HashMap::with_capacity(calendar.len());
        for entry in calendar {
            if let Some(previous) = by_date.insert(entry.date, entry.event_name.clone()) {
                tracing::debug!(
                    "Calendar has several entries on {}, '{}' replaces '{}'",
                    entry.date,
                    entry.event_name,
                    previous
                );
            }
        }
        Self { by_date }
    }

    pub fn check(&self, date: NaiveDate) -> ClashStatus {
        match self.by_date.get(&date) {
            Some(name) => ClashStatus::Clashing {
                calendar_event: name.clone(),
            },
            None => ClashStatus::Clear,
        }
    }

    /// Keeps input order; every event comes back annotated.
    pub fn classify(&self, events: Vec<FoundEvent>) -> Vec<AnnotatedEvent> {
        let annotated: Vec<AnnotatedEvent> = events
            .into_iter()
            .map(|event| {
                let clash = self.check(event.date);
                AnnotatedEvent { event, clash }
            })
            .collect();

        let clashing = annotated.iter().filter(|a| a.clash.is_clashing()).count();
        if clashing > 0 {
            tracing::info!("📅 {} of {} events clash with your calendar", clashing, annotated.len());
        }
        annotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn found(name: &str, day: &str) -> FoundEvent {
        FoundEvent {
            name: name.to_string(),
            date: date(day),
            city: "Manchester".to_string(),
            ticket_url: String::new(),
            genre: String::new(),
            subgenre: String::new(),
        }
    }

    #[test]
    fn test_classify_marks_same_day_events() {
        let detector = CalendarClashDetector::new(&[CalendarEvent::new("Gig A", date("2024-05-01"))]);

        let annotated = detector.classify(vec![
            found("Opening night", "2024-05-01"),
            found("Next day", "2024-05-02"),
        ]);

        assert_eq!(annotated.len(), 2);
        assert_eq!(
            annotated[0].clash,
            ClashStatus::Clashing {
                calendar_event: "Gig A".to_string()
            }
        );
        assert_eq!(annotated[1].clash, ClashStatus::Clear);
        assert_eq!(annotated[1].event.name, "Next day");
    }

    #[test]
    fn test_empty_calendar_never_clashes() {
        let detector = CalendarClashDetector::new(&[]);
        let annotated = detector.classify(vec![found("Gig", "2024-05-01")]);
        assert!(annotated.iter().all(|a| !a.clash.is_clashing()));
    }

    #[test]
    fn test_last_calendar_entry_wins_on_shared_date() {
        let detector = CalendarClashDetector::new(&[
            CalendarEvent::new("Dentist", date("2024-05-01")),
            CalendarEvent::new("Birthday", date("2024-05-01")),
        ]);

        assert_eq!(
            detector.check(date("2024-05-01")),
            ClashStatus::Clashing {
                calendar_event: "Birthday".to_string()
            }
        );
    }
}
