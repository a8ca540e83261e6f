use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub scheduling: SchedulingConfig,
}

/// Working-hours window and search bounds used by the slot finder.
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulingConfig {
    pub slot_start_hour: u32,
    pub slot_end_hour: u32,
    pub search_step_minutes: u32,
    pub search_horizon_days: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_start_hour: 10,
            slot_end_hour: 18,
            search_step_minutes: 30,
            search_horizon_days: 90,
        }
    }
}

impl SchedulingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            slot_start_hour: env_or("SLOT_START_HOUR", defaults.slot_start_hour),
            slot_end_hour: env_or("SLOT_END_HOUR", defaults.slot_end_hour),
            search_step_minutes: env_or("SEARCH_STEP_MINUTES", defaults.search_step_minutes),
            search_horizon_days: env_or("SEARCH_HORIZON_DAYS", defaults.search_horizon_days),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        // A slot must end on the calendar day it starts.
        anyhow::ensure!(
            self.slot_end_hour <= 23,
            "SLOT_END_HOUR must be at most 23 (got {})",
            self.slot_end_hour
        );
        anyhow::ensure!(
            self.slot_start_hour < self.slot_end_hour,
            "SLOT_START_HOUR ({}) must be before SLOT_END_HOUR ({})",
            self.slot_start_hour,
            self.slot_end_hour
        );
        anyhow::ensure!(self.search_step_minutes > 0, "SEARCH_STEP_MINUTES must be positive");
        anyhow::ensure!(self.search_horizon_days > 0, "SEARCH_HORIZON_DAYS must be positive");
        Ok(())
    }

    pub fn window_hours(&self) -> u32 {
        self.slot_end_hour.saturating_sub(self.slot_start_hour)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "bookings.db".to_string()),
            scheduling: SchedulingConfig::from_env(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
