//! Async job layer: file decoding and render requests on tokio's blocking
//! pool, with cancellation and a progress channel.
//!
//! Every job owns its inputs and shares nothing but the `CancelToken`.

use std::future::Future;
use std::path::Path;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use crate::buffer::SampleBuffer;
use crate::codec::{self, ContainerHint};
use crate::compose::{ComposeRequest, compose_cancellable};
use crate::config::FilterConfig;
use crate::error::{DecodeError, EngineError};
use crate::graph::CancelToken;
use crate::graph::remaster::remaster_cancellable;
use crate::mixdown::mixdown_cancellable;

/// Receives percent-complete updates from a running job.
pub type ProgressSender = UnboundedSender<f32>;

fn forwarder(sender: Option<ProgressSender>) -> Option<impl FnMut(f32)> {
    sender.map(|tx| {
        move |percent: f32| {
            if tx.send(percent).is_err() {
                trace!(percent, "progress receiver dropped");
            }
        }
    })
}

fn blocking<T, F>(job: F) -> impl Future<Output = Result<T, EngineError>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);
    async move {
        handle
            .await
            .unwrap_or_else(|e| Err(EngineError::Join(e.to_string())))
    }
}

/// Read `path` and decode it off the async runtime.
pub async fn decode_file(
    path: impl AsRef<Path>,
    hint: ContainerHint,
) -> Result<SampleBuffer, EngineError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(DecodeError::from)?;
    debug!(path = %path.display(), bytes = bytes.len(), "read audio file");
    blocking(move || Ok(codec::decode(&bytes, hint)?)).await
}

/// Remaster `input` on the blocking pool.
pub async fn spawn_remaster(
    input: SampleBuffer,
    config: FilterConfig,
    token: CancelToken,
    progress: Option<ProgressSender>,
) -> Result<SampleBuffer, EngineError> {
    blocking(move || {
        let mut sink = forwarder(progress);
        let progress = sink.as_mut().map(|f| f as &mut dyn FnMut(f32));
        Ok(remaster_cancellable(&input, &config, progress, &token)?)
    })
    .await
}

/// Compose a backing track on the blocking pool.
pub async fn spawn_compose(
    request: ComposeRequest,
    token: CancelToken,
    progress: Option<ProgressSender>,
) -> Result<SampleBuffer, EngineError> {
    blocking(move || {
        let mut sink = forwarder(progress);
        let progress = sink.as_mut().map(|f| f as &mut dyn FnMut(f32));
        Ok(compose_cancellable(&request, progress, &token)?)
    })
    .await
}

/// Mix a vocal over a backing track on the blocking pool.
pub async fn spawn_mixdown(
    vocal: SampleBuffer,
    backing: SampleBuffer,
    token: CancelToken,
    progress: Option<ProgressSender>,
) -> Result<SampleBuffer, EngineError> {
    blocking(move || {
        let mut sink = forwarder(progress);
        let progress = sink.as_mut().map(|f| f as &mut dyn FnMut(f32));
        Ok(mixdown_cancellable(&vocal, &backing, progress, &token)?)
    })
    .await
}
