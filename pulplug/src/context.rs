//! Request-scoped context handed to every provider RPC
//!
//! A Context names the RPC being served, carries the caller's deadline (taken
//! from the `grpc-timeout` header when present) and observes two cancellation
//! signals: its own, and the server-wide one fired by the `Cancel` RPC.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time;

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// Context carries the method name, deadline and cancellation state of one request
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    method: &'static str,
    deadline: Option<Instant>,
    parent: Option<watch::Receiver<bool>>,
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
}

impl Context {
    pub fn new(method: &'static str) -> Self {
        Self::build(method, None, None)
    }

    /// Build the context for an incoming gRPC request, linked to the server-wide
    /// cancellation signal.
    pub fn from_request<T>(
        method: &'static str,
        request: &tonic::Request<T>,
        cancellation: &Cancellation,
    ) -> Self {
        let deadline = request
            .metadata()
            .get(GRPC_TIMEOUT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_grpc_timeout)
            .map(|timeout| Instant::now() + timeout);

        Self::build(method, deadline, Some(cancellation.subscribe()))
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self::build(
            self.inner.method,
            Some(Instant::now() + timeout),
            self.inner.parent.clone(),
        )
    }

    fn build(
        method: &'static str,
        deadline: Option<Instant>,
        parent: Option<watch::Receiver<bool>>,
    ) -> Self {
        let (done_tx, done) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                method,
                deadline,
                parent,
                done,
                done_tx,
            }),
        }
    }

    /// The RPC method this context was created for, e.g. `Configure`
    pub fn method(&self) -> &'static str {
        self.inner.method
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        if *self.inner.done.borrow() {
            return true;
        }
        if let Some(parent) = &self.inner.parent {
            if *parent.borrow() {
                return true;
            }
        }
        matches!(self.inner.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    /// Resolves once this context is cancelled, its parent is cancelled, or the
    /// deadline passes.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }

        let mut done = self.inner.done.clone();
        let mut parent = self.inner.parent.clone();
        let deadline = self.inner.deadline;

        tokio::select! {
            _ = wait_for_cancel(&mut done) => {}
            _ = async {
                match parent.as_mut() {
                    Some(rx) => wait_for_cancel(rx).await,
                    None => std::future::pending().await,
                }
            } => {}
            _ = async {
                match deadline {
                    Some(deadline) => time::sleep_until(deadline.into()).await,
                    None => std::future::pending().await,
                }
            } => {}
        }
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }
}

async fn wait_for_cancel(rx: &mut watch::Receiver<bool>) {
    // A dropped sender can never cancel.
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Server-wide cancellation signal; every request context subscribes to it.
#[derive(Clone)]
pub struct Cancellation {
    tx: Arc<watch::Sender<bool>>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a gRPC `grpc-timeout` header value: at most 8 digits followed by one
/// of the units `H`, `M`, `S`, `m`, `u`, `n`.
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    match unit {
        "H" => Some(Duration::from_secs(amount * 60 * 60)),
        "M" => Some(Duration::from_secs(amount * 60)),
        "S" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_millis(amount)),
        "u" => Some(Duration::from_micros(amount)),
        "n" => Some(Duration::from_nanos(amount)),
        _ => None,
    }
}
