//! Completion service - streaming and one-shot chat completions

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    ChatRequest, ChatTransport, CompletionHandler, CompletionMetadata, CredentialMap, DomainError,
    EventStream, GenerationConfig, Message, ProviderConfig, StreamChunk, TransportEvent,
    UsageAccumulator,
};
use crate::infrastructure::llm::{HttpClient, TransportFactory};

/// Stream consumption settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSettings {
    /// Longest wait for the next event before the call fails with a timeout.
    /// `None` waits indefinitely.
    pub idle_timeout: Option<Duration>,
}

impl StreamSettings {
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }
}

/// Resolves after `timeout`, or never when no timeout is set
async fn idle_timer(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending::<()>().await,
    }
}

fn idle_error(timeout: Option<Duration>) -> DomainError {
    DomainError::timeout(format!(
        "No data received for {:?}",
        timeout.unwrap_or_default()
    ))
}

/// How a stream ended
#[derive(Debug)]
enum Outcome {
    Finished(CompletionMetadata),
    Cancelled,
    Failed(DomainError),
}

/// Completion service dispatching chat requests to provider transports
#[derive(Debug, Clone)]
pub struct CompletionService {
    http_client: HttpClient,
    settings: StreamSettings,
}

impl Default for CompletionService {
    fn default() -> Self {
        Self::new(HttpClient::new())
    }
}

impl CompletionService {
    pub fn new(http_client: HttpClient) -> Self {
        Self {
            http_client,
            settings: StreamSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: StreamSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> StreamSettings {
        self.settings
    }

    /// Stream a chat completion into `handler`.
    ///
    /// Never fails directly: every outcome is delivered as exactly one
    /// `on_error` or `on_done`. Cancelling `cancel` ends the call with
    /// `on_done` and empty metadata.
    #[allow(clippy::too_many_arguments)]
    pub async fn stream_chat_completion<H: CompletionHandler>(
        &self,
        provider: &ProviderConfig,
        credentials: &CredentialMap,
        model_id: &str,
        messages: &[Message],
        cancel: &CancellationToken,
        handler: &mut H,
        generation: Option<GenerationConfig>,
    ) {
        if cancel.is_cancelled() {
            tracing::debug!(provider = %provider.id(), "Completion cancelled before request");
            handler.on_done(CompletionMetadata::default());
            return;
        }

        let (transport, request) =
            match self.prepare(provider, credentials, model_id, messages, generation) {
                Ok(prepared) => prepared,
                Err(e) => {
                    tracing::warn!(provider = %provider.id(), error = %e, "Completion request rejected");
                    handler.on_error(e);
                    return;
                }
            };

        tracing::info!(
            provider = %provider.id(),
            protocol = %transport.protocol(),
            model = %request.model,
            messages = request.messages.len(),
            "Starting streaming completion"
        );

        self.stream_with_transport(transport.as_ref(), &request, cancel, handler)
            .await;
    }

    /// Drive an already selected transport into `handler`
    pub async fn stream_with_transport<H: CompletionHandler>(
        &self,
        transport: &dyn ChatTransport,
        request: &ChatRequest,
        cancel: &CancellationToken,
        handler: &mut H,
    ) {
        let accumulator = UsageAccumulator::start();
        let idle_timeout = self.settings.idle_timeout;

        // The idle timeout also bounds the wait for response headers
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Outcome::Cancelled),
            result = transport.open_stream(request) => result.map_err(Outcome::Failed),
            _ = idle_timer(idle_timeout) => Err(Outcome::Failed(idle_error(idle_timeout))),
        };

        let outcome = match opened {
            Ok(events) => self.consume(events, accumulator, cancel, handler).await,
            Err(outcome) => outcome,
        };

        match outcome {
            Outcome::Finished(metadata) => {
                tracing::info!(
                    model = %request.model,
                    total_tokens = ?metadata.usage.and_then(|u| u.total_tokens),
                    speed = ?metadata.speed,
                    "Completion finished"
                );
                handler.on_done(metadata);
            }
            Outcome::Cancelled => {
                tracing::info!(model = %request.model, "Completion cancelled");
                handler.on_done(CompletionMetadata::default());
            }
            Outcome::Failed(e) => {
                tracing::error!(model = %request.model, error = %e, "Completion failed");
                handler.on_error(e);
            }
        }
    }

    /// Forward chunks until a terminal condition; the stream is dropped on return
    async fn consume<H: CompletionHandler>(
        &self,
        mut events: EventStream,
        mut accumulator: UsageAccumulator,
        cancel: &CancellationToken,
        handler: &mut H,
    ) -> Outcome {
        let idle_timeout = self.settings.idle_timeout;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Outcome::Cancelled,
                next = events.next() => next,
                _ = idle_timer(idle_timeout) => return Outcome::Failed(idle_error(idle_timeout)),
            };

            match next {
                Some(Ok(TransportEvent::Chunk(chunk))) => {
                    if let StreamChunk::Reasoning(ref text) = chunk {
                        accumulator.record_reasoning(text);
                    }
                    handler.on_chunk(chunk);
                }
                Some(Ok(TransportEvent::Usage(usage))) => {
                    tracing::debug!(?usage, "Usage reported");
                    accumulator.record_usage(usage);
                }
                Some(Ok(TransportEvent::Done)) | None => {
                    return Outcome::Finished(accumulator.finish());
                }
                Some(Err(e)) => return Outcome::Failed(e),
            }
        }
    }

    /// Run a one-shot completion and return its text
    pub async fn generate_text_completion(
        &self,
        provider: &ProviderConfig,
        credentials: &CredentialMap,
        model_id: &str,
        messages: &[Message],
        generation: Option<GenerationConfig>,
    ) -> Result<String, DomainError> {
        let (transport, request) =
            self.prepare(provider, credentials, model_id, messages, generation)?;

        tracing::info!(
            provider = %provider.id(),
            protocol = %transport.protocol(),
            model = %request.model,
            "Starting completion"
        );

        self.complete_with_transport(transport.as_ref(), &request)
            .await
    }

    /// Run a one-shot completion on an already selected transport
    pub async fn complete_with_transport(
        &self,
        transport: &dyn ChatTransport,
        request: &ChatRequest,
    ) -> Result<String, DomainError> {
        let text = transport.complete(request).await?;
        tracing::debug!(model = %request.model, chars = text.len(), "Completion returned");
        Ok(text)
    }

    fn prepare(
        &self,
        provider: &ProviderConfig,
        credentials: &CredentialMap,
        model_id: &str,
        messages: &[Message],
        generation: Option<GenerationConfig>,
    ) -> Result<(Arc<dyn ChatTransport>, ChatRequest), DomainError> {
        if model_id.trim().is_empty() {
            return Err(DomainError::validation("Model id must not be empty"));
        }

        if messages.is_empty() {
            return Err(DomainError::validation("At least one message is required"));
        }

        let credential = credentials.resolve(provider)?;
        let transport = TransportFactory::create(provider, credential, self.http_client.clone())?;
        let request = ChatRequest::new(model_id, messages.to_vec()).with_generation(generation);

        Ok((transport, request))
    }
}
