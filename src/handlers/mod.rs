pub mod conditions;
pub mod locations;
pub mod session;
pub mod upload;
