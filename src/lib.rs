//! GreenTrace - Disaster Relief Volunteer Coordination
//!
//! A terminal application for relief volunteers: account signup and login,
//! emergency positioning with SOS, field tasks with AI first-aid advice,
//! legal records of on-site actions and a profile with volunteer levels.

pub mod config;
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
mod test_utils;

pub use domain::*;
pub use application::*;
