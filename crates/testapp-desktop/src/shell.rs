use std::io::Write;
use std::time::Duration;

use testapp_db::Database;
use testapp_types::APP_NAME;
use testapp_updater::{UpdateEvent, UpdateStage, UpdateTask};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::commands::{self, Command, HELP, Reply};

/// How the foreground loop ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Exit {
    /// The user quit or input closed.
    Quit,
    /// An update was installed; the process must exit so it can be restarted.
    Updated,
}

/// Foreground loop: reads commands from `input` and renders them and
/// worker events to `out`.
///
/// Store calls run here synchronously. Network and subprocess work only
/// happens on the update task, which reports back over `events`.
pub async fn run<R, W>(
    db: &Database,
    updates: &UpdateTask,
    mut events: mpsc::UnboundedReceiver<UpdateEvent>,
    input: R,
    out: &mut W,
) -> anyhow::Result<Exit>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let version = db.get_version();
    writeln!(out, "{} v{}", APP_NAME, version)?;
    writeln!(out, "Ready - Database: {}", db.path().display())?;
    render(out, commands::execute(db, Command::List))?;
    writeln!(out, "Type 'help' for commands.")?;
    out.flush()?;

    let mut lines = input.lines();
    let mut pending: Option<oneshot::Sender<bool>> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed, exiting");
                    return Ok(Exit::Quit);
                };

                if let Some(reply) = pending.take() {
                    let confirmed = commands::is_yes(&line);
                    if reply.send(confirmed).is_err() {
                        debug!("Update task no longer waiting for an answer");
                    }
                    continue;
                }

                let command = match Command::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(message) => {
                        writeln!(out, "Error: {}", message)?;
                        out.flush()?;
                        continue;
                    }
                };

                match commands::execute(db, command) {
                    Reply::Quit => return Ok(Exit::Quit),
                    Reply::CheckNow => {
                        if updates.spawn(Duration::ZERO).is_some() {
                            writeln!(out, "Checking for updates...")?;
                        } else {
                            writeln!(out, "An update check is already running.")?;
                        }
                    }
                    reply => render(out, reply)?,
                }
                out.flush()?;
            }
            Some(event) = events.recv() => {
                match event {
                    UpdateEvent::Confirm { current_version, latest_version, reply } => {
                        writeln!(out)?;
                        writeln!(out, "Update Available")?;
                        writeln!(out, "A new version ({}) is available.", latest_version)?;
                        writeln!(out, "Current version: {}", current_version)?;
                        writeln!(out, "Do you want to update now? [y/N]")?;
                        pending = Some(reply);
                    }
                    UpdateEvent::Stage(stage) => writeln!(out, "Update: {}", stage_message(stage))?,
                    UpdateEvent::NoUpdate => debug!("No update available"),
                    UpdateEvent::Declined => writeln!(out, "Update skipped.")?,
                    UpdateEvent::Completed(report) => {
                        if !report.restored {
                            writeln!(out, "Warning: user data could not be restored after the update.")?;
                        }
                        writeln!(out, "Update Complete")?;
                        writeln!(out, "Update to {} completed successfully!", report.version)?;
                        writeln!(out, "Please restart the application.")?;
                        out.flush()?;
                        return Ok(Exit::Updated);
                    }
                    UpdateEvent::Failed(message) => {
                        writeln!(out, "Update Error: Update failed: {}", message)?;
                    }
                }
                out.flush()?;
            }
        }
    }
}

fn render<W: Write>(out: &mut W, reply: Reply) -> std::io::Result<()> {
    match reply {
        Reply::Registered { message, users } => {
            writeln!(out, "{}", message)?;
            writeln!(out, "{}", commands::format_users(&users))
        }
        Reply::Users(users) => writeln!(out, "{}", commands::format_users(&users)),
        Reply::Version(version) => writeln!(out, "{} v{}", APP_NAME, version),
        Reply::Error(message) => writeln!(out, "Error: {}", message),
        Reply::Help => writeln!(out, "{}", HELP),
        Reply::CheckNow | Reply::Quit => Ok(()),
    }
}

fn stage_message(stage: UpdateStage) -> &'static str {
    match stage {
        UpdateStage::BackingUp => "Backing up user data...",
        UpdateStage::Downloading => "Downloading update...",
        UpdateStage::Extracting => "Extracting update...",
        UpdateStage::Installing => "Installing update...",
        UpdateStage::Restoring => "Restoring user data...",
    }
}
