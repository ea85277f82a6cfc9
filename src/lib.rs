pub mod analytics;
pub mod api;
pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod logging;
pub mod medicines;
pub mod memory;
pub mod orders;
pub mod seed;
pub mod state;
pub mod stores;
pub mod supplies;
pub mod users;

#[cfg(test)]
mod testing;
