//! Shared access to one engine from many async callers.
//!
//! A single blocking task owns the `BucketEngine`; callers send requests over a
//! bounded channel and wait on a oneshot reply. Every check, limit change and
//! reset is therefore serialised, and document I/O stays off the async workers.

use tokio::sync::{mpsc, oneshot};

use super::{BucketEngine, Decision, StatusReport};
use crate::types::{Config, Error, Result, ToolId, UserId};

enum Request {
    Check {
        tool: ToolId,
        user: UserId,
        reply: oneshot::Sender<Result<Decision>>,
    },
    SetLimit {
        tool: ToolId,
        capacity: u32,
        refill_rate: f64,
        reply: oneshot::Sender<Result<()>>,
    },
    Status {
        reply: oneshot::Sender<StatusReport>,
    },
    Reset {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Cloneable async front end to a single `BucketEngine`.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Request>,
}

impl EngineHandle {
    /// Move `engine` onto a blocking task and return a handle to it.
    ///
    /// The task exits once every handle has been dropped. Must be called
    /// from within a tokio runtime.
    pub fn spawn(engine: BucketEngine, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::task::spawn_blocking(move || run(engine, rx));
        Self { tx }
    }

    /// Open an engine from `config` and spawn it with the configured queue length.
    pub fn open(config: &Config) -> Result<Self> {
        let engine = BucketEngine::from_config(config)?;
        Ok(Self::spawn(engine, config.engine.channel_capacity))
    }

    pub async fn check(&self, tool: ToolId, user: UserId) -> Result<Decision> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Check { tool, user, reply }).await?;
        rx.await.map_err(|_| Error::EngineClosed)?
    }

    pub async fn set_limit(&self, tool: ToolId, capacity: u32, refill_rate: f64) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::SetLimit {
            tool,
            capacity,
            refill_rate,
            reply,
        })
        .await?;
        rx.await.map_err(|_| Error::EngineClosed)?
    }

    pub async fn status(&self) -> Result<StatusReport> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Status { reply }).await?;
        rx.await.map_err(|_| Error::EngineClosed)
    }

    pub async fn reset(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Request::Reset { reply }).await?;
        rx.await.map_err(|_| Error::EngineClosed)?
    }

    async fn send(&self, request: Request) -> Result<()> {
        self.tx.send(request).await.map_err(|_| Error::EngineClosed)
    }
}

fn run(mut engine: BucketEngine, mut rx: mpsc::Receiver<Request>) {
    tracing::debug!("engine task started");
    while let Some(request) = rx.blocking_recv() {
        // A dropped reply receiver means the caller gave up; nothing to do.
        match request {
            Request::Check { tool, user, reply } => {
                let _ = reply.send(engine.check(&tool, &user));
            }
            Request::SetLimit {
                tool,
                capacity,
                refill_rate,
                reply,
            } => {
                let _ = reply.send(engine.set_limit(&tool, capacity, refill_rate));
            }
            Request::Status { reply } => {
                let _ = reply.send(engine.status());
            }
            Request::Reset { reply } => {
                let _ = reply.send(engine.reset());
            }
        }
    }
    tracing::debug!("engine task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ManualClock;
    use crate::types::StoreConfig;
    use std::sync::Arc;

    fn engine(dir: &tempfile::TempDir) -> BucketEngine {
        let store = StoreConfig::new(dir.path().join("config.json"), dir.path().join("state.json"));
        BucketEngine::open_with_clock(&store, Arc::new(ManualClock::new(0.0))).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_never_overspend() {
        let dir = tempfile::tempdir().unwrap();
        let handle = EngineHandle::spawn(engine(&dir), 16);
        let tool = ToolId::new("search").unwrap();
        handle.set_limit(tool.clone(), 10, 0.0).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let handle = handle.clone();
            let tool = tool.clone();
            tasks.push(tokio::spawn(async move {
                handle
                    .check(tool, UserId::new("alice").unwrap())
                    .await
                    .unwrap()
            }));
        }

        let mut allowed = 0;
        for task in tasks {
            if task.await.unwrap().is_allowed() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 10);

        let report = handle.status().await.unwrap();
        assert_eq!(report.tool("search").unwrap().users.get("alice"), Some(&0.0));
    }

    #[tokio::test]
    async fn test_handle_reset_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let handle = EngineHandle::spawn(engine(&dir), 4);
        let tool = ToolId::new("search").unwrap();
        let user = UserId::new("bob").unwrap();

        let err = handle.check(tool.clone(), user.clone()).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTool(_)));

        handle.set_limit(tool.clone(), 1, 0.0).await.unwrap();
        assert!(handle.check(tool.clone(), user.clone()).await.unwrap().is_allowed());
        assert!(!handle.check(tool.clone(), user.clone()).await.unwrap().is_allowed());

        handle.reset().await.unwrap();
        assert!(handle.check(tool, user).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.store = StoreConfig::new(dir.path().join("config.json"), dir.path().join("state.json"));

        let handle = EngineHandle::open(&config).unwrap();
        handle
            .set_limit(ToolId::new("search").unwrap(), 2, 1.0)
            .await
            .unwrap();
        let report = handle.status().await.unwrap();
        assert_eq!(report.tool("search").unwrap().capacity, 2);
    }

    #[tokio::test]
    async fn test_invalid_limit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let handle = EngineHandle::spawn(engine(&dir), 4);
        let err = handle
            .set_limit(ToolId::new("search").unwrap(), 0, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
