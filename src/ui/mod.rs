pub mod formatters;

pub use formatters::{print_mutation_outcome, print_rule_table, print_telemetry_snapshot};
