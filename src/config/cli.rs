use crate::domain::model::{split_list, ProviderId, SearchRequest};
use crate::utils::error::{EventSearchError, Result};
use crate::utils::validation::Validate;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "event-scout")]
#[command(about = "Search event providers by city, genre and date, and check them against your calendar")]
#[command(version)]
pub struct Cli {
    #[arg(long, short, global = true, default_value = "event-scout.toml")]
    pub config: PathBuf,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 搜尋活動
    Search(SearchArgs),
    /// 管理個人行事曆
    Calendar {
        #[command(subcommand)]
        action: CalendarAction,
    },
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Comma separated, e.g. "Manchester, Leeds"
    #[arg(long)]
    pub cities: String,

    /// Comma separated free-text genres, e.g. "techno, jazz"
    #[arg(long, default_value = "")]
    pub genres: String,

    /// First day to search (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day to search, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,

    /// Providers to query; all configured providers when omitted
    #[arg(long, value_delimiter = ',')]
    pub providers: Vec<ProviderId>,

    /// Mark events that fall on a day already in your calendar
    #[arg(long)]
    pub check_calendar: bool,

    /// Also write the results to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

impl SearchArgs {
    pub fn to_request(&self) -> SearchRequest {
        let request = SearchRequest::new(self.from, self.to)
            .with_cities(split_list(&self.cities))
            .with_genres(split_list(&self.genres));

        if self.providers.is_empty() {
            request
        } else {
            request.with_providers(self.providers.iter().copied())
        }
    }
}

impl Validate for SearchArgs {
    fn validate(&self) -> Result<()> {
        if split_list(&self.cities).is_empty() {
            return Err(EventSearchError::MissingConfigError {
                field: "cities".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Subcommand)]
pub enum CalendarAction {
    /// Add events: "name, YYYY-MM-DD, name 2, YYYY-MM-DD"
    Add { events: String },
    /// Delete every entry with this name
    Delete { name: String },
    /// List entries from today onwards
    Upcoming,
}
