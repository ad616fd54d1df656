//! Hotel Auth - authentication and tenant scoping for the hotel management API
//!
//! Verifies bearer/cookie tokens, resolves them to SuperAdmin or HotelOwner
//! principals, and keeps hotel owners inside their own hotel's resources.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod resolver;
pub mod resources;
pub mod routes;
pub mod state;
pub mod users;

#[cfg(test)]
mod test_support;
