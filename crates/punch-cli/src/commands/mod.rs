//! CLI subcommand implementations.

pub mod clear_week;
pub mod day;
pub mod edit;
pub mod session;
pub mod status;
pub mod summary;
pub mod util;
pub mod watch;
pub mod week;
