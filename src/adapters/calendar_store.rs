use crate::domain::model::CalendarEvent;
use crate::domain::ports::CalendarStore;
use crate::utils::error::{EventSearchError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// 以 JSON 檔案保存的個人行事曆
#[derive(Debug, Clone)]
pub struct JsonCalendarStore {
    path: PathBuf,
}

impl JsonCalendarStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn load(&self) -> Result<Vec<CalendarEvent>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| EventSearchError::Calendar {
                message: format!("{} is not a valid calendar file: {}", self.path.display(), e),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, events: &[CalendarEvent]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(events)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// 輸入格式："event name, date, event name 2, date 2"
    pub async fn add_events(&self, input: &str) -> Result<Vec<CalendarEvent>> {
        let new_events = parse_event_pairs(input)?;
        if new_events.is_empty() {
            return Ok(new_events);
        }

        let mut events = self.load().await?;
        events.extend(new_events.iter().cloned());
        self.save(&events).await?;

        for event in &new_events {
            tracing::info!("📅 Added {} on {} to calendar", event.event_name, event.date);
        }
        Ok(new_events)
    }

    /// Removes every entry with this exact name; returns how many were removed.
    pub async fn delete_event(&self, event_name: &str) -> Result<usize> {
        let mut events = self.load().await?;
        let before = events.len();
        events.retain(|event| event.event_name != event_name.trim());
        let removed = before - events.len();

        if removed > 0 {
            self.save(&events).await?;
            tracing::info!("🗑️ Deleted {} calendar entries named '{}'", removed, event_name);
        } else {
            tracing::warn!("No calendar entry named '{}'", event_name);
        }
        Ok(removed)
    }

    pub async fn upcoming(&self, today: NaiveDate) -> Result<Vec<CalendarEvent>> {
        let mut events = self.list_events().await?;
        events.retain(|event| event.date >= today);
        Ok(events)
    }
}

#[async_trait]
impl CalendarStore for JsonCalendarStore {
    async fn list_events(&self) -> Result<Vec<CalendarEvent>> {
        let mut events = self.load().await?;
        events.sort_by_key(|event| event.date);
        Ok(events)
    }
}

pub fn parse_event_pairs(input: &str) -> Result<Vec<CalendarEvent>> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() % 2 != 0 {
        return Err(EventSearchError::Calendar {
            message: format!(
                "expected pairs of event name and date, got {} values: {}",
                parts.len(),
                input
            ),
        });
    }

    let mut events = Vec::new();
    for pair in parts.chunks(2) {
        let (name, raw_date) = (pair[0], pair[1]);
        if name.is_empty() {
            tracing::warn!("Skipping calendar entry with empty name (date {})", raw_date);
            continue;
        }
        match NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") {
            Ok(date) => events.push(CalendarEvent::new(name, date)),
            Err(e) => tracing::warn!(
                "Event {} not added to calendar, invalid date '{}': {}",
                name,
                raw_date,
                e
            ),
        }
    }
    Ok(events)
}
