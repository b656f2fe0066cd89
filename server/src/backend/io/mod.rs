//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Handlers parse
//! and validate the wire format, call one service method and map the result
//! back to a `shared` DTO. Business rules stay in the domain layer.

pub mod rest;
