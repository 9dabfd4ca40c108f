//! Delivery of streamed output to the caller.
//!
//! A call produces any number of `on_chunk` invocations followed by exactly one
//! terminal invocation: `on_error` or `on_done`. Nothing is delivered after the
//! terminal callback. Cancellation ends with `on_done` and empty metadata.

use tokio::sync::mpsc;

use super::{CompletionMetadata, StreamChunk};
use crate::domain::DomainError;

pub trait CompletionHandler: Send {
    fn on_chunk(&mut self, chunk: StreamChunk);

    fn on_error(&mut self, error: DomainError);

    fn on_done(&mut self, metadata: CompletionMetadata);
}

/// Handler built from three closures
pub struct CompletionCallbacks<C, E, D> {
    on_chunk: C,
    on_error: E,
    on_done: D,
}

impl<C, E, D> CompletionCallbacks<C, E, D>
where
    C: FnMut(StreamChunk) + Send,
    E: FnMut(DomainError) + Send,
    D: FnMut(CompletionMetadata) + Send,
{
    pub fn new(on_chunk: C, on_error: E, on_done: D) -> Self {
        Self {
            on_chunk,
            on_error,
            on_done,
        }
    }
}

impl<C, E, D> CompletionHandler for CompletionCallbacks<C, E, D>
where
    C: FnMut(StreamChunk) + Send,
    E: FnMut(DomainError) + Send,
    D: FnMut(CompletionMetadata) + Send,
{
    fn on_chunk(&mut self, chunk: StreamChunk) {
        (self.on_chunk)(chunk)
    }

    fn on_error(&mut self, error: DomainError) {
        (self.on_error)(error)
    }

    fn on_done(&mut self, metadata: CompletionMetadata) {
        (self.on_done)(metadata)
    }
}

/// Single-channel view of the callback triple
#[derive(Debug)]
pub enum CompletionEvent {
    Chunk(StreamChunk),
    Error(DomainError),
    Done(CompletionMetadata),
}

impl CompletionEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CompletionEvent::Chunk(_))
    }
}

/// Forward events into a channel; a dropped receiver silently discards them
impl CompletionHandler for mpsc::UnboundedSender<CompletionEvent> {
    fn on_chunk(&mut self, chunk: StreamChunk) {
        let _ = self.send(CompletionEvent::Chunk(chunk));
    }

    fn on_error(&mut self, error: DomainError) {
        let _ = self.send(CompletionEvent::Error(error));
    }

    fn on_done(&mut self, metadata: CompletionMetadata) {
        let _ = self.send(CompletionEvent::Done(metadata));
    }
}

#[cfg(test)]
pub mod recording {
    use super::*;

    /// Records every callback in order
    #[derive(Debug, Default)]
    pub struct RecordingHandler {
        pub events: Vec<CompletionEvent>,
    }

    impl RecordingHandler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn chunks(&self) -> Vec<StreamChunk> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    CompletionEvent::Chunk(chunk) => Some(chunk.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn content(&self) -> String {
            self.chunks()
                .iter()
                .filter(|c| c.is_content())
                .map(|c| c.text())
                .collect()
        }

        pub fn terminal_count(&self) -> usize {
            self.events.iter().filter(|e| e.is_terminal()).count()
        }

        /// Metadata of the single terminal `on_done`, if that is how the call ended
        pub fn done(&self) -> Option<&CompletionMetadata> {
            match self.events.last() {
                Some(CompletionEvent::Done(metadata)) => Some(metadata),
                _ => None,
            }
        }

        pub fn error(&self) -> Option<&DomainError> {
            match self.events.last() {
                Some(CompletionEvent::Error(error)) => Some(error),
                _ => None,
            }
        }

        /// Exactly one terminal event, and it is the last one
        pub fn assert_terminated_once(&self) {
            assert_eq!(self.terminal_count(), 1, "events: {:?}", self.events);
            assert!(self.events.last().is_some_and(CompletionEvent::is_terminal));
        }
    }

    impl CompletionHandler for RecordingHandler {
        fn on_chunk(&mut self, chunk: StreamChunk) {
            self.events.push(CompletionEvent::Chunk(chunk));
        }

        fn on_error(&mut self, error: DomainError) {
            self.events.push(CompletionEvent::Error(error));
        }

        fn on_done(&mut self, metadata: CompletionMetadata) {
            self.events.push(CompletionEvent::Done(metadata));
        }
    }
}
