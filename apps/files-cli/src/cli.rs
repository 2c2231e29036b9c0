use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "taskpilot-files")]
#[command(about = "Upload, list, download and delete Taskpilot files", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// API root, overriding config and environment
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Maximum number of stored files
    #[arg(long, global = true)]
    pub max_files: Option<usize>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List stored files
    List,

    /// Upload one or more files
    Upload {
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Retry failed uploads up to N more times
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },

    /// Delete a stored file
    Delete {
        /// Stored file id
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Download a stored file
    Download {
        /// Stored file id
        id: String,

        /// Target directory (defaults to the configured download dir)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload_with_retries() {
        let cli = Cli::parse_from(["taskpilot-files", "upload", "a.txt", "b.pdf", "--retries", "2"]);
        match cli.command {
            Command::Upload { paths, retries } => {
                assert_eq!(paths, [PathBuf::from("a.txt"), PathBuf::from("b.pdf")]);
                assert_eq!(retries, 2);
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn upload_requires_a_path() {
        assert!(Cli::try_parse_from(["taskpilot-files", "upload"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "taskpilot-files",
            "list",
            "--api-url",
            "http://x/api",
            "--max-files",
            "3",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://x/api"));
        assert_eq!(cli.max_files, Some(3));
    }

    #[test]
    fn delete_yes_flag() {
        let cli = Cli::parse_from(["taskpilot-files", "delete", "f1", "-y"]);
        assert!(matches!(cli.command, Command::Delete { ref id, yes: true } if id == "f1"));
    }

    #[test]
    fn verify_command() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
