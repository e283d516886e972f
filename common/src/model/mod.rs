//! Domain models for the NeoBank services

pub mod account;
pub mod user;
