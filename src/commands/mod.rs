pub mod monitor;
pub mod rules;
pub mod status;
