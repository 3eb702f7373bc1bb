//! CLI subcommand implementations.

pub mod inspect;
pub mod simulate;
