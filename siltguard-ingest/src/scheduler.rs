//! Periodic polling and command loop
//!
//! One loop owns the interval timer and the command channel. Each tick, when
//! live, spawns an incremental poll; each command spawns the operation it
//! names. Operations run as their own tasks so the loop keeps ticking while a
//! fetch is outstanding, and the controller's in-flight flag drops whatever
//! overlaps.
//!
//! This function runs until [`Command::Shutdown`] arrives or every
//! [`SchedulerHandle`] is dropped.

use std::sync::Arc;

use log::{debug, info, warn};
use siltguard_core::TimeSource;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::{IngestError, IngestionController, RangeSelector, ReadingStore};

/// Commands accepted from presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Load a range from scratch
    FullRefresh(RangeSelector),
    /// Re-run the last range
    ManualRefresh,
    /// Resume or pause interval polling
    SetLive(bool),
    /// Stop the loop
    Shutdown,
}

/// Cloneable sender side of the command channel
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<Command>,
}

impl SchedulerHandle {
    pub async fn send(&self, command: Command) -> Result<(), IngestError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| IngestError::SchedulerClosed)
    }

    pub async fn full_refresh(&self, range: RangeSelector) -> Result<(), IngestError> {
        self.send(Command::FullRefresh(range)).await
    }

    pub async fn manual_refresh(&self) -> Result<(), IngestError> {
        self.send(Command::ManualRefresh).await
    }

    pub async fn set_live(&self, live: bool) -> Result<(), IngestError> {
        self.send(Command::SetLive(live)).await
    }

    pub async fn shutdown(&self) -> Result<(), IngestError> {
        self.send(Command::Shutdown).await
    }
}

/// Interval-driven sync loop
pub struct Scheduler<S, T> {
    controller: Arc<IngestionController<S, T>>,
    commands: mpsc::Receiver<Command>,
}

/// Bound on queued commands
const COMMAND_BUFFER: usize = 16;

impl<S, T> Scheduler<S, T>
where
    S: ReadingStore + 'static,
    T: TimeSource + Send + Sync + 'static,
{
    pub fn new(controller: Arc<IngestionController<S, T>>) -> (Self, SchedulerHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let scheduler = Self {
            controller,
            commands: rx,
        };
        (scheduler, SchedulerHandle { commands: tx })
    }

    /// Run on the current runtime until shut down
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        let period = self.controller.poll_interval();
        info!("Starting sync scheduler (interval: {}ms)", period.as_millis());

        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick fires immediately; polling starts one period in
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if self.controller.is_live() {
                        self.spawn_poll();
                    }
                }
                command = self.commands.recv() => match command {
                    Some(Command::FullRefresh(range)) => self.spawn_refresh(Some(range)),
                    Some(Command::ManualRefresh) => self.spawn_refresh(None),
                    Some(Command::SetLive(live)) => self.controller.set_live(live),
                    Some(Command::Shutdown) | None => break,
                },
            }
        }

        info!("Sync scheduler stopped");
    }

    fn spawn_poll(&self) {
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            if let Err(e) = controller.incremental_poll().await {
                warn!("Poll failed, will retry next tick: {}", e);
            }
        });
    }

    fn spawn_refresh(&self, range: Option<RangeSelector>) {
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            let result = match range {
                Some(range) => controller.full_refresh(range).await,
                None => controller.manual_refresh().await,
            };
            match result {
                Ok(outcome) => debug!("Refresh finished: {:?}", outcome),
                Err(e) => warn!("Refresh failed: {}", e),
            }
        });
    }
}
