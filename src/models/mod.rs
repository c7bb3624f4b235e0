// Data models for the Strava API

pub mod strava;

pub use strava::{ActivitySummary, ActivityTotals, Athlete, AthleteStats};
