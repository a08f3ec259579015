use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::Client;
use testapp_types::AppConfig;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::checker::UpdateChecker;
use crate::installer::{InstallReport, Installer, UpdateStage};

/// Messages from the update worker to the foreground. The worker never
/// touches UI state; everything it has to say goes through this channel.
#[derive(Debug)]
pub enum UpdateEvent {
    /// A newer release exists. Answer on `reply`; dropping it counts as "no".
    Confirm {
        current_version: String,
        latest_version: String,
        reply: oneshot::Sender<bool>,
    },
    Stage(UpdateStage),
    /// Up to date, or the feed could not be read.
    NoUpdate,
    Declined,
    /// The update is installed; the process should exit.
    Completed(InstallReport),
    Failed(String),
}

/// Single-shot background update job.
///
/// Cloning shares the busy flag, so at most one run is in flight across all
/// clones.
#[derive(Clone)]
pub struct UpdateTask {
    inner: Arc<Inner>,
}

struct Inner {
    checker: UpdateChecker,
    installer: Installer,
    current_version: String,
    busy: AtomicBool,
    events: mpsc::UnboundedSender<UpdateEvent>,
}

impl UpdateTask {
    pub fn new(
        client: Client,
        config: AppConfig,
        events: mpsc::UnboundedSender<UpdateEvent>,
    ) -> Self {
        let checker = UpdateChecker::new(client.clone(), &config);
        let current_version = config.current_version.clone();
        let installer = Installer::new(client, config);

        Self {
            inner: Arc::new(Inner {
                checker,
                installer,
                current_version,
                busy: AtomicBool::new(false),
                events,
            }),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    /// Starts a run after `delay`. Returns `None` without spawning if a run
    /// is already in flight.
    pub fn spawn(&self, delay: Duration) -> Option<JoinHandle<()>> {
        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Update check already running");
            return None;
        }

        let inner = self.inner.clone();
        Some(tokio::spawn(async move {
            let _guard = BusyGuard(&inner.busy);
            tokio::time::sleep(delay).await;
            inner.run_once().await;
        }))
    }
}

impl Inner {
    async fn run_once(&self) {
        let Some(release) = self.checker.check_for_update(&self.current_version).await else {
            self.emit(UpdateEvent::NoUpdate);
            return;
        };

        let (reply, answer) = oneshot::channel();
        self.emit(UpdateEvent::Confirm {
            current_version: self.current_version.clone(),
            latest_version: release.latest_version().to_string(),
            reply,
        });

        if !answer.await.unwrap_or(false) {
            info!("Update to {} declined", release.latest_version());
            self.emit(UpdateEvent::Declined);
            return;
        }

        let events = self.events.clone();
        let outcome = self
            .installer
            .run(&release, move |stage| {
                let _ = events.send(UpdateEvent::Stage(stage));
            })
            .await;

        match outcome {
            Ok(report) => self.emit(UpdateEvent::Completed(report)),
            Err(e) => {
                error!("Update failed: {}", e);
                self.emit(UpdateEvent::Failed(e.to_string()));
            }
        }
    }

    fn emit(&self, event: UpdateEvent) {
        if self.events.send(event).is_err() {
            warn!("Update event dropped: foreground is gone");
        }
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
