//! CDEK API gateway: city lookup and tariff calculation.

pub mod gateway;
pub mod types;

pub use gateway::CdekGateway;
