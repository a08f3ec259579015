use testapp_db::Database;
use testapp_types::UserSummary;
use tracing::warn;

pub const HELP: &str = "\
Commands:
  register <username> <password> [email]   Register a new user
  list | refresh                           Show registered users
  version                                  Show the installed version
  check                                    Check for updates now
  help                                     Show this help
  quit                                     Exit";

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register {
        username: String,
        password: String,
        email: String,
    },
    List,
    Version,
    CheckNow,
    Help,
    Quit,
}

/// Result of running a [`Command`] against the store, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Registered {
        message: String,
        users: Vec<UserSummary>,
    },
    Users(Vec<UserSummary>),
    Version(String),
    Error(String),
    CheckNow,
    Help,
    Quit,
}

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "register" => {
                let username = words.next().unwrap_or_default().trim().to_string();
                let password = words.next().unwrap_or_default().trim().to_string();
                let email = words.next().unwrap_or_default().trim().to_string();
                if username.is_empty() || password.is_empty() {
                    return Err("Username and password are required!".into());
                }
                Self::Register {
                    username,
                    password,
                    email,
                }
            }
            "list" | "refresh" => Self::List,
            "version" => Self::Version,
            "check" => Self::CheckNow,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("Unknown command: {} (try 'help')", other)),
        };

        Ok(Some(command))
    }
}

/// Runs store-backed commands. Update checks are left to the caller, which
/// owns the background task.
pub fn execute(db: &Database, command: Command) -> Reply {
    match command {
        Command::Register {
            username,
            password,
            email,
        } => match db.register(&username, &password, &email) {
            Ok(()) => match db.list_users() {
                Ok(users) => Reply::Registered {
                    message: "User registered successfully!".into(),
                    users,
                },
                Err(e) => Reply::Error(format!("Error refreshing users: {}", e)),
            },
            Err(e) => {
                warn!("Registration of {} failed: {}", username, e);
                Reply::Error(e.user_message())
            }
        },
        Command::List => match db.list_users() {
            Ok(users) => Reply::Users(users),
            Err(e) => Reply::Error(format!("Error refreshing users: {}", e)),
        },
        Command::Version => Reply::Version(db.get_version()),
        Command::CheckNow => Reply::CheckNow,
        Command::Help => Reply::Help,
        Command::Quit => Reply::Quit,
    }
}

/// Fixed-width table of users followed by a status line.
pub fn format_users(users: &[UserSummary]) -> String {
    let mut out = format!("{:<20} {:<30} {}\n", "Username", "Email", "Created At");
    for user in users {
        out.push_str(&format!(
            "{:<20} {:<30} {}\n",
            user.username, user.email, user.created_at
        ));
    }
    out.push_str(&format!("Ready - {} users registered", users.len()));
    out
}

/// `y`/`yes` (any case) confirm; everything else declines.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
