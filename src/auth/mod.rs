// Authentication module
// Strava credentials and access-token lifecycle

mod manager;
mod refresh;
mod types;

pub use manager::TokenManager;
pub use types::{Credentials, TokenState};
