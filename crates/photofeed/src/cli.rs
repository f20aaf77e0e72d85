//! Clap derive structures for the `photofeed` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// photofeed -- browse, like, and sign in to a photo feed from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "photofeed",
    version,
    about = "Browse and like photos from the command line",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PHOTOFEED_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Photos per page (overrides config)
    #[arg(long, global = true)]
    pub per_page: Option<u32>,

    /// Keep the access token in memory instead of the system keyring
    #[arg(long, env = "PHOTOFEED_NO_KEYRING", global = true)]
    pub no_keyring: bool,

    /// Use this access token for the invocation (implies --no-keyring)
    #[arg(long, env = "PHOTOFEED_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize this app and store an access token
    Auth(AuthArgs),

    /// List photos and toggle likes
    #[command(alias = "f")]
    Feed(FeedArgs),

    /// Show the signed-in user's profile
    Profile,

    /// Forget the stored token and clear session state
    Logout,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Print the URL to open in a browser to authorize this app
    Url,

    /// Exchange an authorization code for an access token
    Login {
        /// Authorization code, or the full redirect URL carrying it.
        /// Prompted for when omitted.
        code: Option<String>,
    },
}

// ── Feed ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FeedArgs {
    #[command(subcommand)]
    pub command: FeedCommand,
}

#[derive(Debug, Subcommand)]
pub enum FeedCommand {
    /// List the newest photos
    #[command(alias = "ls")]
    List {
        /// Number of pages to fetch
        #[arg(long, default_value = "1")]
        pages: u32,
    },

    /// Like a photo
    Like(LikeArgs),

    /// Remove a like
    Unlike(LikeArgs),
}

#[derive(Debug, Args)]
pub struct LikeArgs {
    /// Photo id
    pub id: String,

    /// Pages to search for the photo before giving up
    #[arg(long, default_value = "3")]
    pub pages: u32,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init,

    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn like_defaults_search_depth() {
        let cli = Cli::try_parse_from(["photofeed", "feed", "like", "abc"]).unwrap();
        let Command::Feed(FeedArgs {
            command: FeedCommand::Like(args),
        }) = cli.command
        else {
            panic!("expected feed like");
        };
        assert_eq!(args.id, "abc");
        assert_eq!(args.pages, 3);
    }

    #[test]
    fn global_flags_apply_after_subcommand() {
        let cli =
            Cli::try_parse_from(["photofeed", "feed", "list", "--pages", "2", "-o", "json", "-vv"])
                .unwrap();
        assert!(matches!(cli.global.output, OutputFormat::Json));
        assert_eq!(cli.global.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Feed(FeedArgs {
                command: FeedCommand::List { pages: 2 }
            })
        ));
    }

    #[test]
    fn login_code_is_optional() {
        let cli = Cli::try_parse_from(["photofeed", "auth", "login"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Auth(AuthArgs {
                command: AuthCommand::Login { code: None }
            })
        ));
    }
}
