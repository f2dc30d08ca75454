use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    name = "meetnotes",
    version,
    about = "Meeting notes with templates, filtering and export"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Path to the notes file, overriding the configuration
    #[clap(long, value_parser)]
    pub data_file: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the meetnotes application
    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list_filters() {
        let cli = Cli::parse_from([
            "meetnotes", "-v", "list", "--category", "meeting", "--sort-by", "title", "--order",
            "asc",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::List {
                category,
                sort_by,
                order,
                ..
            } => {
                assert_eq!(category.as_deref(), Some("meeting"));
                assert_eq!(sort_by, crate::SortBy::Title);
                assert_eq!(order, crate::SortOrder::Asc);
            }
            _ => panic!("expected list"),
        }
    }
}
