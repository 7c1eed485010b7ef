use crate::utils::error::{EventSearchError, Result};
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub geocoding: GeocodingConfig,
    pub search: SearchConfig,
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub ticketmaster: TicketmasterConfig,
    pub skiddle: SkiddleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketmasterConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: String,
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for TicketmasterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://app.ticketmaster.com/discovery/v2/events.json".to_string(),
            api_key: String::new(),
            page_size: 100,
            max_pages: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkiddleConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: String,
    pub radius_miles: u32,
    pub include_description: bool,
}

impl Default for SkiddleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://www.skiddle.com/api/v1/events/search/".to_string(),
            api_key: String::new(),
            radius_miles: 8,
            include_description: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.opencagedata.com/geocode/v1/json".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub genres_file: String,
    pub request_timeout_seconds: u64,
    pub strict_date_validation: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            genres_file: "data/genres.json".to_string(),
            request_timeout_seconds: 15,
            strict_date_validation: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub path: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            path: "calendar.json".to_string(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EventSearchError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                "Config file {} not found, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EventSearchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TICKETMASTER_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EventSearchError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!("Environment variable {} is not set", var_name);
                String::new()
            })
        });

        Ok(result.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.search.request_timeout_seconds)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        let ticketmaster = &self.providers.ticketmaster;
        if ticketmaster.enabled {
            validate_url("providers.ticketmaster.endpoint", &ticketmaster.endpoint)?;
            validate_range(
                "providers.ticketmaster.page_size",
                ticketmaster.page_size,
                1,
                200,
            )?;
            validate_positive_number(
                "providers.ticketmaster.max_pages",
                u64::from(ticketmaster.max_pages),
                1,
            )?;
        }

        let skiddle = &self.providers.skiddle;
        if skiddle.enabled {
            validate_url("providers.skiddle.endpoint", &skiddle.endpoint)?;
            validate_positive_number(
                "providers.skiddle.radius_miles",
                u64::from(skiddle.radius_miles),
                1,
            )?;
            validate_url("geocoding.endpoint", &self.geocoding.endpoint)?;
        }

        validate_path("search.genres_file", &self.search.genres_file)?;
        validate_positive_number(
            "search.request_timeout_seconds",
            self.search.request_timeout_seconds,
            1,
        )?;
        validate_path("calendar.path", &self.calendar.path)?;

        Ok(())
    }
}
