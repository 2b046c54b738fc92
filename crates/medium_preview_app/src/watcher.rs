//! File watching for the focused document.
//!
//! Uses inotify-style notifications when available and falls back to polling
//! the modification time.

use notify::{Event as NotifyEvent, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

type Error = Box<dyn std::error::Error + Send + Sync>;

/// Polling interval used when native notifications are unavailable.
const POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Watches one document and sends a clone of `event` on `event_tx` for every change.
///
/// The watch stops when this is dropped.
pub struct DocumentWatcher<E> {
    shutdown_tx: Option<mpsc::Sender<()>>,
    file_path: PathBuf,
    _event: std::marker::PhantomData<E>,
}

impl<E: Clone + Send + 'static> DocumentWatcher<E> {
    /// Start watching `path`, sending `event` on every modification.
    pub fn new(path: &Path, event_tx: UnboundedSender<E>, event: E) -> Result<Self, Error> {
        let file_path = path.to_path_buf();

        let native = Self::try_native_watcher(&file_path, event_tx.clone(), event.clone());
        let shutdown_tx = match native {
            Ok(shutdown_tx) => {
                tracing::info!(path = ?file_path, "Started native file watcher");
                shutdown_tx
            }
            Err(err) => {
                tracing::warn!(
                    ?err,
                    path = ?file_path,
                    "Native file watcher failed, falling back to polling"
                );
                Self::spawn_polling_watcher(&file_path, event_tx, event)
            }
        };

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            file_path,
            _event: std::marker::PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn try_native_watcher(
        file_path: &Path,
        event_tx: UnboundedSender<E>,
        event: E,
    ) -> Result<mpsc::Sender<()>, Error> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel();

        // Editors often save via write-rename, so watch the parent directory.
        let (Some(watch_target), Some(file_name)) = (file_path.parent(), file_path.file_name())
        else {
            return Err("Invalid file path".into());
        };
        let watch_target = if watch_target.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            watch_target.to_path_buf()
        };
        let file_name = file_name.to_os_string();

        std::thread::spawn(move || {
            let mut watcher = match RecommendedWatcher::new(
                move |res: Result<NotifyEvent, notify::Error>| match res {
                    Ok(notify_event) => {
                        let is_target_file = notify_event
                            .paths
                            .iter()
                            .any(|p| p.file_name() == Some(file_name.as_os_str()));

                        if is_target_file
                            && (notify_event.kind.is_modify()
                                || notify_event.kind.is_create()
                                || notify_event.kind.is_remove())
                        {
                            let _ = event_tx.send(event.clone());
                        }
                    }
                    Err(e) => {
                        tracing::error!(?e, "File watcher error");
                    }
                },
                notify::Config::default(),
            ) {
                Ok(w) => w,
                Err(err) => {
                    let _ = started_tx.send(Err(err.to_string()));
                    return;
                }
            };

            if let Err(err) = watcher.watch(&watch_target, RecursiveMode::NonRecursive) {
                let _ = started_tx.send(Err(err.to_string()));
                return;
            }

            let _ = started_tx.send(Ok(()));

            // Keep the watcher alive until shutdown
            loop {
                match shutdown_rx.recv_timeout(Duration::from_secs(1)) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }
            }
        });

        match started_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(Ok(())) => Ok(shutdown_tx),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err("Watcher startup timeout".into()),
        }
    }

    fn spawn_polling_watcher(
        file_path: &Path,
        event_tx: UnboundedSender<E>,
        event: E,
    ) -> mpsc::Sender<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let file_path = file_path.to_path_buf();

        tokio::spawn(async move {
            let modified_at = |path: &Path| std::fs::metadata(path).and_then(|m| m.modified()).ok();
            let mut last_mtime = modified_at(&file_path);

            tracing::info!(path = ?file_path, "Started polling file watcher");

            loop {
                match shutdown_rx.try_recv() {
                    Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
                    Err(mpsc::TryRecvError::Empty) => {}
                }

                tokio::time::sleep(POLL_INTERVAL).await;

                let current_mtime = modified_at(&file_path);
                if current_mtime != last_mtime {
                    last_mtime = current_mtime;
                    if event_tx.send(event.clone()).is_err() {
                        break;
                    }
                }
            }
        });

        shutdown_tx
    }
}

impl<E> Drop for DocumentWatcher<E> {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
