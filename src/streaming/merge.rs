//! Ordered merge of content sources.
//!
//! # Responsibilities
//! - Accept content sources in a FIFO queue while the output is draining
//! - Emit each source's bytes fully before starting the next
//! - Forward the first error as the terminal item of the output
//!
//! # Design Decisions
//! - Commit order is `add()` order, never completion order
//! - Production and consumption are decoupled: callers start producers
//!   eagerly (see [`Source::spawn`]) and queue the handle; the drain loop
//!   only awaits them in turn
//! - `add()` after `end()` or after the output finished is an error

use std::collections::VecDeque;
use std::future::{ready, Future};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::Notify;

use crate::streaming::error::{MergeError, RenderError};

/// A stream of output chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, RenderError>>;

/// One queued piece of content.
pub enum Source {
    /// Literal content.
    Text(Bytes),
    /// Content that is not available yet.
    Pending(BoxFuture<'static, Result<Source, RenderError>>),
    /// A chunked byte stream.
    Stream(ByteStream),
    /// Another ordered merge, drained in place.
    Merge(OrderedMerge),
}

impl Source {
    /// An empty placeholder.
    pub fn empty() -> Self {
        Source::Text(Bytes::new())
    }

    pub fn pending(fut: impl Future<Output = Result<Source, RenderError>> + Send + 'static) -> Self {
        Source::Pending(fut.boxed())
    }

    pub fn stream(s: impl Stream<Item = Result<Bytes, RenderError>> + Send + 'static) -> Self {
        Source::Stream(s.boxed())
    }

    /// Start producing on the runtime right away and queue the handle.
    pub fn spawn(
        label: impl Into<String>,
        fut: impl Future<Output = Result<Source, RenderError>> + Send + 'static,
    ) -> Self {
        let label = label.into();
        let handle = tokio::spawn(fut);
        Source::pending(async move {
            handle.await.map_err(|e| RenderError::Task {
                node: label,
                message: e.to_string(),
            })?
        })
    }

    /// Swallow errors so the surrounding output keeps flowing.
    ///
    /// Bytes produced before the failure are kept; `on_error` is called once.
    pub fn isolate(self, on_error: impl Fn(&RenderError) + Send + 'static) -> Self {
        let stream = self
            .into_stream()
            .map(move |item| match item {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    on_error(&e);
                    None
                }
            })
            .take_while(|item| ready(item.is_some()))
            .filter_map(|item| ready(item.map(Ok)));
        Source::stream(stream)
    }

    /// Flatten into a byte stream.
    pub fn into_stream(self) -> ByteStream {
        match self {
            Source::Text(bytes) => stream::once(ready(Ok(bytes))).boxed(),
            Source::Pending(fut) => fut
                .into_stream()
                .flat_map(|resolved| match resolved {
                    Ok(source) => source.into_stream(),
                    Err(e) => stream::once(ready(Err(e))).boxed(),
                })
                .boxed(),
            Source::Stream(s) => s,
            Source::Merge(merge) => merge.into_stream(),
        }
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Source::Text(Bytes::from(s))
    }
}

impl From<&'static str> for Source {
    fn from(s: &'static str) -> Self {
        Source::Text(Bytes::from_static(s.as_bytes()))
    }
}

impl From<Bytes> for Source {
    fn from(b: Bytes) -> Self {
        Source::Text(b)
    }
}

impl From<OrderedMerge> for Source {
    fn from(m: OrderedMerge) -> Self {
        Source::Merge(m)
    }
}

struct Entry {
    source: Source,
    debug_name: Option<String>,
}

#[derive(Default)]
struct State {
    queue: VecDeque<Entry>,
    /// No further sources will be added.
    ended: bool,
    /// The output stream has completed or failed.
    finished: bool,
    draining: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    notify: Notify,
}

enum Next {
    Source(Entry),
    Wait,
    Finished,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next(&self) -> Next {
        let mut state = self.lock();
        match state.queue.pop_front() {
            Some(entry) => Next::Source(entry),
            None if state.ended => {
                state.finished = true;
                Next::Finished
            }
            None => Next::Wait,
        }
    }

    fn finish(&self) {
        let mut state = self.lock();
        state.finished = true;
        state.queue.clear();
    }
}

/// A FIFO sequencer producing one ordered byte stream.
///
/// Handles are cheap to clone; all clones feed the same queue. Exactly one
/// clone may be turned into the output stream.
#[derive(Clone, Default)]
pub struct OrderedMerge {
    shared: Arc<Shared>,
}

impl OrderedMerge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source to the tail of the queue.
    pub fn add(&self, source: impl Into<Source>, debug_name: Option<&str>) -> Result<(), MergeError> {
        let mut state = self.shared.lock();
        if state.ended || state.finished {
            let name = debug_name.unwrap_or("<unnamed>").to_string();
            tracing::error!(source = %name, "Source added to an ordered merge after it ended");
            return Err(MergeError::Closed(name));
        }
        state.queue.push_back(Entry {
            source: source.into(),
            debug_name: debug_name.map(str::to_string),
        });
        drop(state);
        self.shared.notify.notify_one();
        Ok(())
    }

    /// Signal that no more sources will be added.
    pub fn end(&self) {
        self.shared.lock().ended = true;
        self.shared.notify.notify_one();
    }

    pub fn is_ended(&self) -> bool {
        let state = self.shared.lock();
        state.ended || state.finished
    }

    /// The ordered output. Completes once `end()` was called and the queue
    /// is drained; terminates after the first error.
    pub fn into_stream(self) -> ByteStream {
        {
            let mut state = self.shared.lock();
            if state.draining {
                return stream::once(ready(Err(MergeError::AlreadyDraining.into()))).boxed();
            }
            state.draining = true;
        }

        struct Drain {
            shared: Arc<Shared>,
            current: Option<(ByteStream, Option<String>)>,
            failed: bool,
        }

        let drain = Drain {
            shared: self.shared,
            current: None,
            failed: false,
        };

        stream::unfold(drain, |mut drain| async move {
            loop {
                if drain.failed {
                    return None;
                }
                if let Some((current, name)) = drain.current.as_mut() {
                    match current.next().await {
                        Some(Ok(bytes)) => return Some((Ok(bytes), drain)),
                        Some(Err(e)) => {
                            tracing::debug!(source = ?name, error = %e, "Ordered merge source failed");
                            drain.failed = true;
                            drain.shared.finish();
                            return Some((Err(e), drain));
                        }
                        None => {
                            tracing::trace!(source = ?name, "Ordered merge source drained");
                            drain.current = None;
                        }
                    }
                    continue;
                }
                match drain.shared.next() {
                    Next::Source(entry) => {
                        drain.current = Some((entry.source.into_stream(), entry.debug_name));
                    }
                    Next::Wait => drain.shared.notify.notified().await,
                    Next::Finished => return None,
                }
            }
        })
        .boxed()
    }
}

/// Collect a byte stream into a string, stopping at the first error.
pub async fn collect_string(mut stream: ByteStream) -> Result<String, RenderError> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}
