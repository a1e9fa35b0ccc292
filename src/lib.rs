//! Scheduling and CRM backend for small businesses, plus the sync client
//! and chat assistant that run against it.

pub mod api;
pub mod assistant;
pub mod client;
pub mod config;
pub mod database;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
mod testing;
