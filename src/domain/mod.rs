// Domain layer - Pure types and rules, no I/O
pub mod coordinate;
pub mod forecast;
pub mod gesture;
pub mod location;
pub mod measurement;
pub mod reading;
pub mod severity;
