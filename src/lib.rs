//! Library exports for leaguedesk, shared between the binary and tests.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod inflight;
pub mod league;
pub mod models;
pub mod rules;
pub mod session;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
pub mod views;
