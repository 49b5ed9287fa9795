//! Blocking wrapper around an async backend session.
//!
//! Each connection owns one session handle plus a private tokio runtime.
//! Every backend call is driven to completion on that runtime and races
//! against the configured timeout and the connection's cancellation token.

use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::watch;

use super::error::{DbError, Result};

pub(crate) fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("chambers-data-session")
        .enable_all()
        .build()
        .map_err(|e| DbError::Failed(format!("could not start session runtime: {e}")))
}

pub(crate) struct Session<S: ?Sized> {
    handle: Option<Box<S>>,
    runtime: Runtime,
    cancel: watch::Sender<bool>,
    timeout: Duration,
    last_error: Option<DbError>,
}

impl<S: ?Sized + Send> Session<S> {
    pub(crate) fn new(handle: Box<S>, runtime: Runtime, timeout: Duration) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            handle: Some(handle),
            runtime,
            cancel,
            timeout,
            last_error: None,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DbError::SessionClosed)
        }
    }

    pub(crate) fn last_error(&self) -> Option<DbError> {
        self.last_error.clone()
    }

    /// Records a failure raised outside a session call, e.g. while
    /// normalizing a result.
    pub(crate) fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_session_failure() {
                self.last_error = Some(err.clone());
            }
        }
        result
    }

    /// Runs one backend call against the session handle.
    pub(crate) fn call<T>(
        &mut self,
        operation: &'static str,
        f: impl for<'s> FnOnce(&'s mut S) -> BoxFuture<'s, anyhow::Result<T>>,
    ) -> Result<T> {
        let handle = self.handle.as_deref_mut().ok_or(DbError::SessionClosed)?;
        let result = drive(
            &self.runtime,
            &self.cancel,
            self.timeout,
            operation,
            f(handle),
        );
        self.track(result)
    }

    /// Releases the handle exactly once, then fires the cancellation token.
    pub(crate) fn close(
        &mut self,
        f: impl FnOnce(Box<S>) -> BoxFuture<'static, anyhow::Result<()>>,
    ) -> Result<()> {
        let handle = self.handle.take().ok_or(DbError::AlreadyClosed)?;
        let timeout = self.timeout;
        let result = self.runtime.block_on(async move {
            match tokio::time::timeout(timeout, f(handle)).await {
                Ok(res) => res.map_err(|e| DbError::backend("close", e)),
                Err(_) => Err(DbError::Timeout {
                    operation: "close",
                    after: timeout,
                }),
            }
        });
        self.cancel.send_replace(true);
        self.track(result)
    }
}

fn drive<T>(
    runtime: &Runtime,
    cancel: &watch::Sender<bool>,
    timeout: Duration,
    operation: &'static str,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> Result<T> {
    let mut cancelled = cancel.subscribe();
    runtime.block_on(async move {
        tokio::select! {
            res = tokio::time::timeout(timeout, fut) => match res {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(DbError::backend(operation, format!("{err:#}"))),
                Err(_) => Err(DbError::Timeout { operation, after: timeout }),
            },
            _ = cancelled.wait_for(|c| *c) => Err(DbError::Cancelled { operation }),
        }
    })
}
