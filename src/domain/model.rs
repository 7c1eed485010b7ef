use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// 已知的活動供應商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Ticketmaster,
    Skiddle,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Ticketmaster, ProviderId::Skiddle];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Ticketmaster => "ticketmaster",
            ProviderId::Skiddle => "skiddle",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ticketmaster" => Ok(ProviderId::Ticketmaster),
            "skiddle" => Ok(ProviderId::Skiddle),
            other => Err(format!(
                "unknown provider '{}', expected one of: ticketmaster, skiddle",
                other
            )),
        }
    }
}

/// 供應商查詢地點的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationMode {
    /// 一次請求帶入所有城市名稱
    CityNames,
    /// 每個城市各自以經緯度查詢
    Coordinates,
}

/// 供應商回傳的活動，正規化後的統一格式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundEvent {
    pub name: String,
    pub date: NaiveDate,
    pub city: String,
    pub ticket_url: String,
    pub genre: String,
    pub subgenre: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityCoordinate {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub cities: Vec<String>,
    pub genres: Vec<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub enabled_providers: BTreeSet<ProviderId>,
}

impl SearchRequest {
    /// 預設啟用所有供應商
    pub fn new(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self {
            cities: Vec::new(),
            genres: Vec::new(),
            date_from,
            date_to,
            enabled_providers: ProviderId::ALL.into_iter().collect(),
        }
    }

    pub fn with_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cities = ordered_unique(cities);
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.genres = ordered_unique(genres);
        self
    }

    pub fn with_providers<I>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = ProviderId>,
    {
        self.enabled_providers = providers.into_iter().collect();
        self
    }

    pub fn is_enabled(&self, provider: ProviderId) -> bool {
        self.enabled_providers.contains(&provider)
    }
}

/// 把逗號分隔的輸入切成清單 (例如 "Manchester, Leeds")
pub fn split_list(input: &str) -> Vec<String> {
    ordered_unique(input.split(','))
}

fn ordered_unique<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.iter().any(|existing| existing.eq_ignore_ascii_case(trimmed)) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// 使用者行事曆中已存在的活動
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub event_name: String,
    pub date: NaiveDate,
}

impl CalendarEvent {
    pub fn new(event_name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            event_name: event_name.into(),
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ClashStatus {
    Clashing { calendar_event: String },
    Clear,
}

impl ClashStatus {
    pub fn is_clashing(&self) -> bool {
        matches!(self, ClashStatus::Clashing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedEvent {
    pub event: FoundEvent,
    pub clash: ClashStatus,
}
