pub mod backends;
pub mod provider;
pub mod state;
