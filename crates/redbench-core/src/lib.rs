pub mod adapter_api;
pub mod compare;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod errors;
pub mod fingerprint;
pub mod model;
pub mod providers;
pub mod score;

pub mod report;
