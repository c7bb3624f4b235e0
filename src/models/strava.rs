use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================================================================================================
// GET /athlete/activities
// ==================================================================================================

/// One activity as listed by Strava (summary representation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub id: u64,
    pub name: String,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub moving_time: u64,
    /// Seconds
    pub elapsed_time: u64,
    /// Meters
    pub total_elevation_gain: f64,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub start_date: DateTime<Utc>,
    /// Meters per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
}

// ==================================================================================================
// GET /athlete
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

// ==================================================================================================
// GET /athletes/{id}/stats
// ==================================================================================================

/// Totals for one time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTotals {
    pub count: u64,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub moving_time: u64,
    /// Seconds
    pub elapsed_time: u64,
    /// Meters
    pub elevation_gain: f64,
}

/// Running totals: last four weeks, year to date and all time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteStats {
    pub recent_run_totals: ActivityTotals,
    pub ytd_run_totals: ActivityTotals,
    pub all_run_totals: ActivityTotals,
}
