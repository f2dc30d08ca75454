// src/autosave.rs - Periodic body auto-save for editing sessions
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, error, info, trace, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::ContentSource;

/// Receives the new body whenever it changed since the last save.
pub type AutoSaveCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct AutoSaveStatus {
    /// Whether the auto-save task is running
    pub is_running: bool,
    /// When the callback was last invoked
    pub last_saved_at: Option<DateTime<Utc>>,
    /// How many times the callback has been invoked
    pub saves: usize,
}

#[derive(Debug, Clone)]
pub enum AutoSaveCommand {
    /// Check for changes immediately instead of waiting for the next tick
    CheckNow,
    /// Stop the auto-save task
    Stop,
}

/// A periodic task that watches a [`ContentSource`] and hands changed
/// content to a callback.
///
/// The task is bound to this value: [`AutoSaver::stop`] ends it gracefully,
/// and dropping the value aborts it, so no tick can fire for a session that
/// no longer exists.
pub struct AutoSaver {
    /// Channel to send commands to the auto-save task
    command_tx: mpsc::Sender<AutoSaveCommand>,

    /// Handle to the auto-save task
    task: Option<JoinHandle<()>>,

    /// Shared with the task
    status: Arc<Mutex<AutoSaveStatus>>,
}

impl AutoSaver {
    /// Spawns the auto-save task on the current tokio runtime.
    ///
    /// `baseline` is the content already persisted; the callback only fires
    /// once the source reports something different.
    pub fn start(
        source: Arc<dyn ContentSource>,
        baseline: String,
        period: Duration,
        on_save: AutoSaveCallback,
    ) -> Self {
        info!("Starting auto-save every {:?}", period);
        let (command_tx, mut command_rx) = mpsc::channel(10);
        let status = Arc::new(Mutex::new(AutoSaveStatus {
            is_running: true,
            ..AutoSaveStatus::default()
        }));
        let task_status = Arc::clone(&status);

        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // Initial tick

            let mut last_saved = baseline;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        check_for_changes(source.as_ref(), &mut last_saved, &on_save, &task_status);
                    }
                    cmd = command_rx.recv() => match cmd {
                        Some(AutoSaveCommand::CheckNow) => {
                            check_for_changes(source.as_ref(), &mut last_saved, &on_save, &task_status);
                        }
                        Some(AutoSaveCommand::Stop) | None => {
                            debug!("Auto-save task stopping...");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            command_tx,
            task: Some(task),
            status,
        }
    }

    /// Stops the task and waits for it, so no callback runs after this returns.
    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = self.command_tx.send(AutoSaveCommand::Stop).await {
                warn!("Failed to send stop command to auto-save: {}", e);
                task.abort();
            }

            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!("Auto-save task failed: {}", e);
                }
            }

            self.set_running(false);
            info!("Auto-save stopped");
        } else {
            debug!("Auto-save is not running");
        }
    }

    /// Asks the task to compare content right away.
    pub async fn check_now(&self) {
        if self.task.is_some() {
            if let Err(e) = self.command_tx.send(AutoSaveCommand::CheckNow).await {
                warn!("Failed to send check command to auto-save: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn get_status(&self) -> AutoSaveStatus {
        self.status
            .lock()
            .map(|status| status.clone())
            .unwrap_or_default()
    }

    fn set_running(&self, running: bool) {
        if let Ok(mut status) = self.status.lock() {
            status.is_running = running;
        }
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Aborting auto-save task");
            task.abort();
        }
    }
}

fn check_for_changes(
    source: &dyn ContentSource,
    last_saved: &mut String,
    on_save: &AutoSaveCallback,
    status: &Mutex<AutoSaveStatus>,
) {
    let content = match source.html() {
        Ok(content) => content,
        Err(e) => {
            warn!("Auto-save could not read content: {}", e);
            return;
        }
    };

    if content == *last_saved {
        trace!("Auto-save: no changes");
        return;
    }

    debug!("Auto-saving {} bytes", content.len());
    on_save(content.clone());
    *last_saved = content;

    if let Ok(mut status) = status.lock() {
        status.saves += 1;
        status.last_saved_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::HtmlBuffer;

    fn counting() -> (Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>, AutoSaveCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (c, s) = (Arc::clone(&count), Arc::clone(&seen));
        let callback: AutoSaveCallback = Arc::new(move |content: String| {
            c.fetch_add(1, Ordering::SeqCst);
            s.lock().unwrap().push(content);
        });
        (count, seen, callback)
    }

    #[tokio::test]
    async fn unchanged_content_never_saves() {
        let source = Arc::new(HtmlBuffer::new("<p>same</p>"));
        let (count, _, callback) = counting();

        let mut saver = AutoSaver::start(
            source,
            "<p>same</p>".into(),
            Duration::from_millis(10),
            callback,
        );
        time::sleep(Duration::from_millis(80)).await;
        saver.stop().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!saver.get_status().is_running);
    }

    #[tokio::test]
    async fn changed_content_saves_once_per_change() {
        let source = Arc::new(HtmlBuffer::new("<p>old</p>"));
        let (count, seen, callback) = counting();

        let mut saver = AutoSaver::start(
            Arc::clone(&source) as Arc<dyn ContentSource>,
            "<p>old</p>".into(),
            Duration::from_millis(10),
            callback,
        );
        source.set("<p>new</p>");
        time::sleep(Duration::from_millis(80)).await;
        saver.stop().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec!["<p>new</p>"]);
        assert_eq!(saver.get_status().saves, 1);
    }

    #[tokio::test]
    async fn check_now_saves_without_waiting_for_a_tick() {
        let source = Arc::new(HtmlBuffer::new("<p>draft</p>"));
        let (count, _, callback) = counting();

        let mut saver = AutoSaver::start(source, String::new(), Duration::from_secs(3600), callback);
        saver.check_now().await;
        saver.stop().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_callback_after_stop_or_drop() {
        let source = Arc::new(HtmlBuffer::new("a"));
        let (count, _, callback) = counting();

        let mut saver = AutoSaver::start(
            Arc::clone(&source) as Arc<dyn ContentSource>,
            "a".into(),
            Duration::from_millis(10),
            Arc::clone(&callback),
        );
        saver.stop().await;
        assert!(!saver.is_running());
        source.set("b");
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        let dropped = AutoSaver::start(
            Arc::clone(&source) as Arc<dyn ContentSource>,
            "b".into(),
            Duration::from_millis(10),
            callback,
        );
        drop(dropped);
        source.set("c");
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
