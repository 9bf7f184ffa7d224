use crate::config::TimeoutTier;
use crate::decode::decode_event;
use crate::frame::FrameAssembler;
use crate::request::RequestClient;
use futures_util::{Stream, StreamExt};
use planor_core::{PlanorError, StreamEvent};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tracing::{debug, info, warn};

/// Callbacks for one streaming call.
///
/// `on_message` fires for every non-terminal event in arrival order.
/// The terminal callbacks are consumed on dispatch, so a second
/// terminal delivery is unrepresentable.
pub struct StreamCallbacks {
    on_message: Box<dyn FnMut(StreamEvent) + Send>,
    on_error: Box<dyn FnOnce(PlanorError) + Send>,
    on_complete: Box<dyn FnOnce() + Send>,
}

impl StreamCallbacks {
    /// Boxes the three callbacks.
    pub fn new(
        on_message: impl FnMut(StreamEvent) + Send + 'static,
        on_error: impl FnOnce(PlanorError) + Send + 'static,
        on_complete: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            on_message: Box::new(on_message),
            on_error: Box::new(on_error),
            on_complete: Box::new(on_complete),
        }
    }
}

/// Handle to an in-flight streaming call.
///
/// Dropping the handle does not cancel the stream; call [`cancel`].
///
/// [`cancel`]: StreamHandle::cancel
#[derive(Debug)]
pub struct StreamHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// Aborts the underlying connection at the next read boundary.
    ///
    /// If no terminal event has fired yet, the error callback receives
    /// [`PlanorError::Aborted`]; if one has, cancelling is a no-op.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Waits until the pump task has finished and every callback has
    /// been dispatched.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Owns one streaming request end-to-end: initiation, chunk pump,
/// timeout, cancellation, terminal dispatch.
pub struct StreamTransport;

impl StreamTransport {
    /// Opens `path` as a streaming POST through `client` and pumps
    /// decoded events into `callbacks` until a terminal event, the
    /// streaming deadline, or cancellation.
    ///
    /// The streaming timeout tier is armed when the call starts and
    /// covers both connection setup and the whole read loop. The
    /// response body is owned by the pump task and dropped on every
    /// exit path, which releases the connection.
    pub fn open(
        client: Arc<RequestClient>,
        path: String,
        body: serde_json::Value,
        callbacks: StreamCallbacks,
    ) -> StreamHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(pump(client, path, body, callbacks, cancel_rx));
        StreamHandle {
            cancel: cancel_tx,
            task,
        }
    }
}

/// How the read loop ended. Exactly one of these is dispatched per call.
#[derive(Debug)]
enum Outcome {
    Complete,
    Failed(PlanorError),
}

async fn pump(
    client: Arc<RequestClient>,
    path: String,
    body: serde_json::Value,
    callbacks: StreamCallbacks,
    mut cancel: watch::Receiver<bool>,
) {
    let StreamCallbacks {
        mut on_message,
        on_error,
        on_complete,
    } = callbacks;

    let timeout = client.config().timeout(TimeoutTier::Streaming);
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    // Connection setup runs under the same deadline as the read loop.
    let open = client.open_stream(&path, &body);
    tokio::pin!(open);
    let resp = tokio::select! {
        biased;
        _ = cancelled(&mut cancel) => {
            debug!(%path, "Stream cancelled during connect");
            on_error(PlanorError::Aborted);
            return;
        }
        _ = deadline.as_mut() => {
            warn!(%path, ?timeout, "Stream timed out during connect");
            on_error(PlanorError::Timeout(timeout));
            return;
        }
        resp = &mut open => match resp {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%path, error = %e, "Stream request failed before streaming began");
                on_error(e);
                return;
            }
        },
    };

    info!(%path, "Stream open");
    let stream = resp
        .bytes_stream()
        .map(|r| match r {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(e) => Err(PlanorError::Http(e.to_string())),
        });
    let stream = Box::pin(stream);

    let outcome = read_loop(stream, &mut *on_message, &mut cancel, deadline, timeout).await;
    match outcome {
        Outcome::Complete => {
            info!(%path, "Stream complete");
            on_complete();
        }
        Outcome::Failed(e) => {
            warn!(%path, error = %e, "Stream ended in error");
            on_error(e);
        }
    }
}

/// Pumps decoded frames from `stream` into `on_message` until a
/// terminal event, cancellation, the deadline, or end-of-stream.
///
/// Generic over the byte stream so the loop is testable without a
/// network; the transport feeds it the response body. Cancellation is
/// cooperative — observed at the next read boundary, after in-flight
/// dispatch of an already-received chunk has run to completion.
async fn read_loop<S>(
    mut stream: S,
    on_message: &mut (dyn FnMut(StreamEvent) + Send),
    cancel: &mut watch::Receiver<bool>,
    mut deadline: Pin<&mut Sleep>,
    timeout: Duration,
) -> Outcome
where
    S: Stream<Item = Result<Vec<u8>, PlanorError>> + Unpin,
{
    let mut assembler = FrameAssembler::new();
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancelled(cancel) => return Outcome::Failed(PlanorError::Aborted),
            _ = deadline.as_mut() => return Outcome::Failed(PlanorError::Timeout(timeout)),
            chunk = stream.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                if let Some(outcome) = dispatch(assembler.push(&bytes), on_message) {
                    return outcome;
                }
            }
            Some(Err(e)) => return Outcome::Failed(e),
            // End of stream without a terminal event: best-effort flush
            // of a trailing partial frame, then report the violation.
            None => {
                if let Some(outcome) = dispatch(assembler.finish(), on_message) {
                    return outcome;
                }
                return Outcome::Failed(PlanorError::Stream(
                    "stream closed before completion".to_string(),
                ));
            }
        }
    }
}

/// Decodes and dispatches a batch of frame payloads in order. Returns
/// the outcome as soon as a terminal event is seen; payloads after it
/// are not delivered.
fn dispatch(
    payloads: Vec<String>,
    on_message: &mut (dyn FnMut(StreamEvent) + Send),
) -> Option<Outcome> {
    for payload in payloads {
        match decode_event(&payload) {
            Some(StreamEvent::Complete) => return Some(Outcome::Complete),
            Some(StreamEvent::Error { message }) => {
                return Some(Outcome::Failed(PlanorError::Generation(message)))
            }
            Some(event) => on_message(event),
            // Unparsable payload: skip the frame, keep the stream.
            None => debug!(len = payload.len(), "Skipping unparsable frame payload"),
        }
    }
    None
}

/// Resolves only when the handle requests cancellation. Pends forever
/// if the handle was dropped without cancelling, so an abandoned handle
/// never aborts a stream.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
