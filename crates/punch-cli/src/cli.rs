//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Work session time tracker.
///
/// Records when you start, pause, resume and stop work, and reports hours
/// worked per day, week and month.
#[derive(Debug, Parser)]
#[command(name = "punch", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start working (also starts a new session on a stopped day).
    Start,

    /// Take a break.
    Pause,

    /// Come back from a break.
    Resume,

    /// End the working day.
    Stop,

    /// Show today's session.
    Status,

    /// Show a live elapsed-time counter until interrupted.
    Watch,

    /// Show one day's log.
    Day {
        /// Date to show: YYYY-MM-DD, `today`, `yesterday` or `N days ago`.
        date: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show totals for each day of a week.
    Week {
        /// Any date in the week to show (defaults to the current week).
        #[arg(long)]
        week: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show all-time statistics.
    Summary {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Correct a recorded time.
    Edit {
        /// Which time to change.
        field: EditField,

        /// New time: HH:MM or h:mm AM/PM.
        value: String,

        /// Which break, counting from 1 (break fields only).
        #[arg(long, default_value_t = 1)]
        index: usize,

        /// Day to edit (defaults to today).
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete everything recorded in a week.
    ClearWeek {
        /// Any date in the week to clear (defaults to the current week).
        #[arg(long)]
        week: Option<String>,

        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

/// Editable times in a day's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EditField {
    /// When the day started.
    Start,
    /// When the day ended.
    End,
    /// When a break started.
    BreakStart,
    /// When a break ended.
    BreakEnd,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_edit_with_break_index() {
        let cli = Cli::parse_from(["punch", "edit", "break-end", "1:15 PM", "--index", "2"]);
        match cli.command {
            Some(Commands::Edit {
                field,
                value,
                index,
                date,
            }) => {
                assert_eq!(field, EditField::BreakEnd);
                assert_eq!(value, "1:15 PM");
                assert_eq!(index, 2);
                assert_eq!(date, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["punch", "week", "--json", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Some(Commands::Week {
                week: None,
                json: true
            })
        ));
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
