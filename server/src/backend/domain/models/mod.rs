//! Domain models. Dates use `chrono` types here; the REST mappers convert
//! them to the string forms used by the `shared` DTOs.

pub mod budget;
pub mod category;
pub mod notification;
pub mod transaction;
pub mod user;

/// Round a money amount to 2 decimals
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
