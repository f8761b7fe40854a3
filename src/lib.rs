//! Saya Backend Library
//!
//! This library exports the core modules for the Saya backend server and the
//! wallet, player, and authentication building blocks shared with clients.

pub mod app_state;
pub mod auth;
pub mod catalog;
pub mod handlers;
pub mod ipfs;
pub mod models;
pub mod player;
pub mod routes;
pub mod wallet;
