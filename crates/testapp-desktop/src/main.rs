mod commands;
mod shell;

use testapp_db::Database;
use testapp_types::{APP_NAME, APP_VERSION, AppConfig};
use testapp_updater::{UpdateTask, http_client};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::info;

use crate::shell::Exit;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they stay out of the interactive output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "simple_test_app=info,testapp_db=info,testapp_updater=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env();
    info!("{} v{} starting", APP_NAME, APP_VERSION);

    let db = Database::open(&config.db_path())?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let updates = UpdateTask::new(http_client()?, config.clone(), event_tx);
    updates.spawn(config.update_delay);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    match shell::run(&db, &updates, event_rx, stdin, &mut stdout).await? {
        Exit::Quit => Ok(()),
        Exit::Updated => {
            info!("Exiting after update");
            // A blocked stdin read would otherwise hold up runtime shutdown.
            std::process::exit(0);
        }
    }
}
