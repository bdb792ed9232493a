use clap::{ArgAction, Parser, Subcommand};
use lumen_library::{SearchType, SortKey, SortOrder};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "lumen",
    version,
    about = "Browse and search a media library, with cached thumbnails and durations",
    long_about = None,
)]
pub struct Args {
    /// Config file (TOML, YAML or JSON) [default: <config dir>/lumen/config.toml]
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Media root directory, overriding the configured one
    #[arg(short = 'r', long, value_name = "DIR", global = true)]
    pub media_root: Option<PathBuf>,

    /// More logging: -v for debug, -vv for trace (overrides RUST_LOG)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Print the sorted media tree below PATH (the media root by default)
    Browse {
        #[arg(default_value = "")]
        path: String,
        /// One of: name, size, modified, duration, type
        #[arg(short, long, default_value_t)]
        sort: SortKey,
        /// One of: asc, desc
        #[arg(short, long, default_value_t)]
        order: SortOrder,
    },
    /// Find files or folders whose name contains QUERY
    Search {
        query: String,
        /// One of: file, folder
        #[arg(short = 't', long = "type", default_value_t)]
        search_type: SearchType,
        /// Only search below this path
        #[arg(long, value_name = "PATH")]
        within: Option<String>,
    },
    /// Print the cached (or freshly derived) metadata of one media file
    Metadata { path: String },
    /// List every video in the library
    Videos,
    /// List the subtitle tracks available for a video
    Subtitles { path: String },
}

/// Log filter directive for the number of `-v` flags, if any were given.
pub fn verbosity(count: u8) -> Option<&'static str> {
    match count {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_browse_defaults() {
        let args = Args::try_parse_from(["lumen", "browse"]).unwrap();
        assert_eq!(
            args.command,
            Command::Browse { path: String::new(), sort: SortKey::Name, order: SortOrder::Asc }
        );
        assert_eq!(args.verbose, 0);
    }

    #[rstest]
    #[case(&["lumen", "browse", "movies", "--sort", "duration", "--order", "desc"], Command::Browse {
        path: "movies".into(),
        sort: SortKey::Duration,
        order: SortOrder::Desc,
    })]
    #[case(&["lumen", "search", "holiday", "--type", "folder"], Command::Search {
        query: "holiday".into(),
        search_type: SearchType::Folder,
        within: None,
    })]
    #[case(&["lumen", "search", "a", "--within", "movies"], Command::Search {
        query: "a".into(),
        search_type: SearchType::File,
        within: Some("movies".into()),
    })]
    #[case(&["lumen", "metadata", "movies/a.mp4"], Command::Metadata { path: "movies/a.mp4".into() })]
    #[case(&["lumen", "videos"], Command::Videos)]
    #[case(&["lumen", "subtitles", "movies/a.mp4"], Command::Subtitles { path: "movies/a.mp4".into() })]
    fn test_commands(#[case] argv: &[&str], #[case] expected: Command) {
        assert_eq!(Args::try_parse_from(argv).unwrap().command, expected);
    }

    #[rstest]
    #[case(&["lumen", "browse", "--sort", "rating"])]
    #[case(&["lumen", "browse", "--order", "sideways"])]
    #[case(&["lumen", "search", "a", "--type", "album"])]
    #[case(&["lumen"])]
    fn test_rejects_invalid(#[case] argv: &[&str]) {
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_global_flags() {
        let args = Args::try_parse_from(["lumen", "videos", "-vv", "--config", "lumen.yaml", "-r", "/srv/media"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(verbosity(args.verbose), Some("trace"));
        assert_eq!(args.config, Some(PathBuf::from("lumen.yaml")));
        assert_eq!(args.media_root, Some(PathBuf::from("/srv/media")));
        assert_eq!(verbosity(0), None);
    }
}
