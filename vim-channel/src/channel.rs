//! Request/reply correlation over a Vim JSON channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::debug;
use tracing::trace;
use tracing::warn;
use walker_core::HostError;
use walker_core::HostResult;

use crate::proto;
use crate::proto::FrameDecoder;
use crate::proto::Incoming;
use crate::proto::VIM_ERROR;

const READ_CHUNK: usize = 8 * 1024;

/// A message the editor sent on its own initiative.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: i64,
    pub payload: Value,
}

#[derive(Default)]
struct Pending {
    closed: bool,
    waiters: HashMap<i64, oneshot::Sender<Value>>,
}

struct Shared {
    outgoing: mpsc::UnboundedSender<Value>,
    pending: Mutex<Pending>,
    next_id: AtomicI64,
}

/// Cheap to clone; every clone talks to the same editor.
#[derive(Clone)]
pub struct VimChannel {
    shared: Arc<Shared>,
}

/// Starts the reader and writer tasks for a channel over `reader`/`writer`.
/// Editor-initiated messages are delivered on the returned receiver, which
/// closes when the editor goes away.
pub fn spawn<R, W>(reader: R, writer: W) -> (VimChannel, mpsc::UnboundedReceiver<Request>)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
    let (requests_tx, requests) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        outgoing,
        pending: Mutex::new(Pending::default()),
        next_id: AtomicI64::new(1),
    });
    tokio::spawn(write_loop(writer, outgoing_rx));
    tokio::spawn(read_loop(reader, Arc::clone(&shared), requests_tx));
    (VimChannel { shared }, requests)
}

impl VimChannel {
    /// Evaluates `expr` in the editor.
    pub async fn expr(&self, expr: &str) -> HostResult<Value> {
        self.request(expr, |id| proto::expr(expr, id)).await
    }

    /// Evaluates `expr` and decodes the result.
    pub async fn eval<T: DeserializeOwned>(&self, expr: &str) -> HostResult<T> {
        let value = self.expr(expr).await?;
        serde_json::from_value(value).map_err(|err| HostError::decode(expr, err))
    }

    /// Calls the editor function `func` with `args`.
    pub async fn call(&self, func: &str, args: Vec<Value>) -> HostResult<Value> {
        self.request(func, |id| proto::call(func, args, id)).await
    }

    /// Runs an Ex command. Vim does not answer these.
    pub fn ex(&self, command: &str) -> HostResult<()> {
        self.send(proto::ex(command))
    }

    pub fn redraw(&self, force: bool) -> HostResult<()> {
        self.send(proto::redraw(force))
    }

    /// Answers the editor request `id`.
    pub fn reply(&self, id: i64, value: Value) -> HostResult<()> {
        self.send(proto::reply(id, value))
    }

    fn send(&self, message: Value) -> HostResult<()> {
        self.shared
            .outgoing
            .send(message)
            .map_err(|_| HostError::Disconnected)
    }

    async fn request(
        &self,
        what: &str,
        message: impl FnOnce(i64) -> Value,
    ) -> HostResult<Value> {
        let id = -self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self
                .shared
                .pending
                .lock()
                .map_err(|_| HostError::Disconnected)?;
            if pending.closed {
                return Err(HostError::Disconnected);
            }
            pending.waiters.insert(id, tx);
        }
        if let Err(err) = self.send(message(id)) {
            self.forget(id);
            return Err(err);
        }
        let result = rx.await.map_err(|_| HostError::Disconnected)?;
        trace!(id, what, %result, "reply");
        if result.as_str() == Some(VIM_ERROR) {
            return Err(HostError::call(what, "the editor could not evaluate the call"));
        }
        Ok(result)
    }

    fn forget(&self, id: i64) {
        if let Ok(mut pending) = self.shared.pending.lock() {
            pending.waiters.remove(&id);
        }
    }
}

async fn write_loop<W>(mut writer: W, mut outgoing: mpsc::UnboundedReceiver<Value>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outgoing.recv().await {
        let bytes = proto::encode(&message);
        if let Err(err) = writer.write_all(&bytes).await {
            warn!("failed to write to editor: {err}");
            break;
        }
        if let Err(err) = writer.flush().await {
            warn!("failed to flush editor channel: {err}");
            break;
        }
    }
    debug!("writer finished");
}

async fn read_loop<R>(
    mut reader: R,
    shared: Arc<Shared>,
    requests: mpsc::UnboundedSender<Request>,
) where
    R: AsyncRead + Unpin,
{
    let mut decoder = FrameDecoder::default();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let read = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) => {
                warn!("failed to read from editor: {err}");
                break;
            }
        };
        decoder.push(&chunk[..read]);
        while let Some(frame) = decoder.next_frame() {
            match frame.and_then(Incoming::from_value) {
                Ok(Incoming::Reply { id, result }) => deliver(&shared, id, result),
                Ok(Incoming::Request { id, payload }) => {
                    // Nobody serving requests anymore is not a reason to stop
                    // routing replies.
                    let _ = requests.send(Request { id, payload });
                }
                Err(err) => warn!("dropping message: {err}"),
            }
        }
    }
    if !decoder.is_empty() {
        warn!("editor closed the channel mid-message");
    }
    debug!("editor channel closed");
    if let Ok(mut pending) = shared.pending.lock() {
        pending.closed = true;
        // Dropping the senders fails every outstanding call.
        pending.waiters.clear();
    }
}

fn deliver(shared: &Shared, id: i64, result: Value) {
    let waiter = match shared.pending.lock() {
        Ok(mut pending) => pending.waiters.remove(&id),
        Err(_) => None,
    };
    match waiter {
        Some(waiter) => {
            let _ = waiter.send(result);
        }
        None => debug!(id, "reply to an unknown call"),
    }
}
