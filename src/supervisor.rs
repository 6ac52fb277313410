//! Front-end lifecycle supervisor.
//!
//! Each front end runs as an independent tokio task; the supervisor owns a
//! shared [`CancellationToken`] and waits for every task to finish. This
//! replaces ad-hoc background threads hosting secondary event loops.

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Owns the lifecycle of the front-end tasks.
#[derive(Default)]
pub struct Supervisor {
    token: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Supervisor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token a front end should watch for shutdown.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn a named front-end task.
    pub fn spawn<F>(&mut self, name: &'static str, front_end: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        info!("Starting front end: {name}");
        self.tasks.push((name, tokio::spawn(front_end)));
    }

    /// Request shutdown of every front end.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Wait for all front ends to finish.
    pub async fn run(self) {
        let (names, handles): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();
        for (name, result) in names.into_iter().zip(join_all(handles).await) {
            match result {
                Ok(()) => info!("Front end stopped: {name}"),
                Err(e) => warn!("Front end {name} aborted: {e}"),
            }
        }
    }
}
