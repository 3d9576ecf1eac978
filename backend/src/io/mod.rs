//! # IO Module
//!
//! Interface layer exposing the engine over HTTP. Handlers translate DTOs
//! from `shared` into domain commands and domain errors into HTTP
//! responses; they hold no business rules of their own.

pub mod rest;
