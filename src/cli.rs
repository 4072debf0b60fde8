//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::guard::Route;

pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// Client for the school league: sessions, teams and recruiting.
#[derive(Parser, Debug)]
#[command(name = "leaguedesk", version, about = "School league client")]
pub struct Cli {
    /// Path to the YAML config file.
    #[arg(long = "config", global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Print the config JSON schema and exit.
    #[arg(long = "print-schema")]
    pub print_schema: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Session state, profile, team and pending requests.
    Status,

    /// Sign in with school credentials.
    Login {
        #[arg(value_name = "ACCOUNT")]
        account_id: String,
        password: String,
    },

    /// Link a Riot account.
    Link {
        #[arg(value_name = "GAME_NAME")]
        game_name: String,
        #[arg(value_name = "TAG_LINE")]
        tag_line: String,
    },

    Logout,

    /// Try reaching the server again.
    Retry,

    /// List all teams.
    Teams,

    /// Show one team.
    Team { id: i64 },

    MyTeam,

    /// Players without a team.
    Players,

    /// Recruit requests waiting for your answer.
    Pending,

    /// Recruit requests your team has sent.
    TeamRequests,

    CreateTeam {
        /// Team name; may span several words.
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        name: Vec<String>,
    },

    /// Invite a player onto your team.
    Recruit {
        user_id: i64,
        /// Optional note for the player; everything after the id.
        #[arg(num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },

    Accept {
        request_id: i64,
    },

    Reject {
        request_id: i64,
    },

    Leave,

    Kick {
        user_id: i64,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::Login { .. } => "login",
            Command::Link { .. } => "link",
            Command::Logout => "logout",
            Command::Retry => "retry",
            Command::Teams => "teams",
            Command::Team { .. } => "team",
            Command::MyTeam => "my-team",
            Command::Players => "players",
            Command::Pending => "pending",
            Command::TeamRequests => "team-requests",
            Command::CreateTeam { .. } => "create-team",
            Command::Recruit { .. } => "recruit",
            Command::Accept { .. } => "accept",
            Command::Reject { .. } => "reject",
            Command::Leave => "leave",
            Command::Kick { .. } => "kick",
        }
    }

    /// The page this command stands for. `None` runs without consulting the guard.
    pub fn route(&self) -> Option<Route> {
        match self {
            Command::Login { .. } | Command::Logout | Command::Retry => None,
            Command::Status => Some(Route::Home),
            Command::Link { .. } => Some(Route::LinkGameAccount),
            Command::CreateTeam { .. } => Some(Route::CreateTeam),
            Command::Pending | Command::Accept { .. } | Command::Reject { .. } => {
                Some(Route::Profile)
            }
            Command::Teams
            | Command::Team { .. }
            | Command::MyTeam
            | Command::Players
            | Command::TeamRequests
            | Command::Recruit { .. }
            | Command::Leave
            | Command::Kick { .. } => Some(Route::Teams),
        }
    }
}

/// Joins a multi-word argument back together; `None` when it was left out.
pub fn joined(words: &[String]) -> Option<String> {
    (!words.is_empty()).then(|| words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("leaguedesk").chain(line.split_whitespace()))
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_without_arguments() {
        let cli = parse("").unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!cli.print_schema);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn flags_and_command() {
        let cli = parse("--config /etc/ld.yaml kick 7").unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/ld.yaml"));
        assert_eq!(cli.command, Some(Command::Kick { user_id: 7 }));

        let cli = parse("kick 7 --config /etc/ld.yaml").unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/ld.yaml"));

        assert!(parse("--print-schema").unwrap().print_schema);
    }

    #[test]
    fn multi_word_arguments() {
        let Some(Command::Recruit { user_id, message }) =
            parse("recruit 12 join us please").unwrap().command
        else {
            panic!("expected recruit");
        };
        assert_eq!(user_id, 12);
        assert_eq!(joined(&message).as_deref(), Some("join us please"));

        let Some(Command::Recruit { message, .. }) = parse("recruit 12").unwrap().command else {
            panic!("expected recruit");
        };
        assert_eq!(joined(&message), None);

        let Some(Command::CreateTeam { name }) = parse("create-team Blue Side").unwrap().command
        else {
            panic!("expected create-team");
        };
        assert_eq!(joined(&name).as_deref(), Some("Blue Side"));
    }

    #[test]
    fn message_words_that_look_like_flags_stay_in_the_message() {
        let cli = parse("recruit 12 --print-schema is not a flag here").unwrap();
        assert!(!cli.print_schema);
        let Some(Command::Recruit { message, .. }) = cli.command else {
            panic!("expected recruit");
        };
        assert_eq!(
            joined(&message).as_deref(),
            Some("--print-schema is not a flag here")
        );
    }

    #[test]
    fn bad_input() {
        assert!(parse("team red").is_err());
        assert!(parse("login only-account").is_err());
        assert!(parse("fly").is_err());
        assert!(parse("leave now").is_err());
        assert!(parse("--verbose status").is_err());
        assert!(parse("create-team").is_err());
    }

    #[test]
    fn routes() {
        assert_eq!(Command::Status.route(), Some(Route::Home));
        assert_eq!(Command::Accept { request_id: 1 }.route(), Some(Route::Profile));
        assert_eq!(
            Command::CreateTeam {
                name: vec!["x".to_string()]
            }
            .route(),
            Some(Route::CreateTeam)
        );
        assert_eq!(Command::Retry.route(), None);
        assert_eq!(Command::Logout.route(), None);
        assert_eq!(parse("my-team").unwrap().command.map(|c| c.name()), Some("my-team"));
    }
}
