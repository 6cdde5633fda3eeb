pub mod config;
pub mod firewall;
pub mod telemetry;
