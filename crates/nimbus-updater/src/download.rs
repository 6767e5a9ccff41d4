//! Abortable, progress-tracked artifact download.
//!
//! A [`DownloadTask`] streams one release artifact to local storage. Its
//! state is an explicit tagged value observed through a `watch` channel;
//! there is no task hierarchy to subclass and no shared mutable abort flag.
//! Cancellation rides a [`CancellationToken`] checked at every chunk
//! boundary, so it composes with the streaming fetch and is testable in
//! isolation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, UpdateError};
use crate::fetch::Fetch;

/// Observable state of a download task.
///
/// `Pending -> Running -> {Completed | Cancelled | Failed}`; terminal states
/// are never left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    /// The task has been created but not started.
    Pending,
    /// Bytes are being streamed to the destination.
    Running {
        /// Bytes written so far; monotonically non-decreasing.
        transferred: u64,
        /// Declared total, or `None` when the server omitted a length.
        total: Option<u64>,
    },
    /// The task was cancelled by its owner. Not a failure.
    Cancelled,
    /// Every byte reached the destination file.
    Completed,
    /// Streaming failed; the full error went to the awaiting caller.
    Failed {
        /// Rendered error message for observers.
        error: String,
    },
}

impl DownloadState {
    /// Whether this state admits no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Completed | Self::Failed { .. }
        )
    }
}

/// How a finished download resolved.
///
/// Cancellation resolves the awaiting caller without an error; only genuine
/// stream or disk failures surface as [`UpdateError::Download`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The artifact was fully written to the destination.
    Completed,
    /// The task was cancelled; a partial file may remain.
    Cancelled,
}

/// Streams a release artifact to local storage.
///
/// One task per update attempt, exclusively owned by its creator; the
/// subsystem never runs concurrent attempts for one application instance.
pub struct DownloadTask {
    fetcher: Arc<dyn Fetch>,
    url: String,
    destination: PathBuf,
    state: watch::Sender<DownloadState>,
    cancel: CancellationToken,
}

impl DownloadTask {
    /// Creates a task that will download `url` to `destination`.
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        let (state, _) = watch::channel(DownloadState::Pending);
        Self {
            fetcher,
            url: url.into(),
            destination: destination.into(),
            state,
            cancel: CancellationToken::new(),
        }
    }

    /// The artifact URL being downloaded.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The local file being written.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Subscribes to state changes.
    ///
    /// Progress updates are published in the order bytes are written, so the
    /// transferred count a subscriber observes only ever grows.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DownloadState> {
        self.state.subscribe()
    }

    /// Requests cooperative cancellation.
    ///
    /// Idempotent and safe to call from any thread while [`start`] is in
    /// flight. Has no effect once the task reached a terminal state.
    ///
    /// [`start`]: DownloadTask::start
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Runs the download until completion, cancellation, or failure.
    ///
    /// The destination file is flushed and closed on every exit path. A
    /// cancelled or failed attempt leaves a partial file the caller may
    /// remove or overwrite on retry.
    pub async fn start(&self) -> Result<DownloadOutcome> {
        match self.run().await {
            Ok(DownloadOutcome::Completed) => {
                self.set_state(DownloadState::Completed);
                Ok(DownloadOutcome::Completed)
            }
            Ok(DownloadOutcome::Cancelled) => {
                tracing::info!("Download of {} cancelled", self.url);
                self.set_state(DownloadState::Cancelled);
                Ok(DownloadOutcome::Cancelled)
            }
            Err(err) => {
                tracing::warn!("Download of {} failed: {}", self.url, err);
                self.set_state(DownloadState::Failed {
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run(&self) -> Result<DownloadOutcome> {
        if self.cancel.is_cancelled() {
            return Ok(DownloadOutcome::Cancelled);
        }

        tracing::info!("Starting download from {}", self.url);

        let response = tokio::select! {
            () = self.cancel.cancelled() => return Ok(DownloadOutcome::Cancelled),
            response = self.fetcher.fetch(&self.url) => {
                response.map_err(|source| self.download_error(source))?
            }
        };

        if !response.is_success() {
            return Err(UpdateError::Network {
                url: self.url.clone(),
                status: response.status,
            });
        }

        let total = response.content_length;
        let mut body = response.body;

        let mut file = File::create(&self.destination)
            .await
            .map_err(|source| self.download_error(source))?;

        let mut transferred = 0u64;
        self.set_state(DownloadState::Running { transferred, total });

        let outcome = loop {
            let next = tokio::select! {
                () = self.cancel.cancelled() => break DownloadOutcome::Cancelled,
                next = body.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(source)) => {
                    let _ = file.flush().await;
                    return Err(self.download_error(source));
                }
                None => break DownloadOutcome::Completed,
            };

            if let Err(source) = file.write_all(&chunk).await {
                let _ = file.flush().await;
                return Err(self.download_error(source));
            }

            transferred += chunk.len() as u64;
            if let Some(total) = total
                && transferred > total
            {
                let _ = file.flush().await;
                return Err(self.download_error(io::Error::other(format!(
                    "server sent more than the declared {total} bytes"
                ))));
            }

            self.set_state(DownloadState::Running { transferred, total });
        };

        file.flush()
            .await
            .map_err(|source| self.download_error(source))?;
        drop(file);

        if outcome == DownloadOutcome::Completed {
            tracing::info!(
                "Download complete: {} bytes written to {}",
                transferred,
                self.destination.display()
            );
        }

        Ok(outcome)
    }

    /// Publishes a state change unless the task already terminated.
    fn set_state(&self, next: DownloadState) {
        self.state.send_if_modified(|state| {
            if state.is_terminal() {
                return false;
            }
            *state = next;
            true
        });
    }

    fn download_error(&self, source: io::Error) -> UpdateError {
        UpdateError::Download {
            url: self.url.clone(),
            destination: self.destination.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::fetch::testing::{ChannelFetch, PanicFetch, StaticFetch};

    const URL: &str = "https://example.com/nimbus-2.3.0-win.zip";

    fn destination(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("pending_update.zip")
    }

    /// Blocks until the observed transferred count reaches `expected`.
    async fn wait_for_transferred(rx: &mut watch::Receiver<DownloadState>, expected: u64) {
        loop {
            if let DownloadState::Running { transferred, .. } = *rx.borrow()
                && transferred >= expected
            {
                return;
            }
            rx.changed().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_download_writes_every_byte() {
        let dir = tempfile::tempdir().unwrap();
        let dest = destination(&dir);

        let payload: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let fetcher = StaticFetch {
            status: 200,
            content_length: Some(1000),
            chunks: payload.chunks(250).map(Bytes::copy_from_slice).collect(),
        };

        let task = DownloadTask::new(Arc::new(fetcher), URL, &dest);
        let outcome = task.start().await.unwrap();

        assert_eq!(outcome, DownloadOutcome::Completed);
        assert_eq!(*task.subscribe().borrow(), DownloadState::Completed);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_progress_is_ordered_and_sums_to_total() {
        let dir = tempfile::tempdir().unwrap();
        let dest = destination(&dir);

        let (fetcher, tx) = ChannelFetch::new(Some(1000));
        let task = Arc::new(DownloadTask::new(Arc::new(fetcher), URL, &dest));
        let mut rx = task.subscribe();

        let handle = tokio::spawn({
            let task = Arc::clone(&task);
            async move { task.start().await }
        });

        // Feed the body in four chunks, observing each cumulative count
        // before releasing the next chunk.
        for step in 1..=4u64 {
            tx.send(Ok(Bytes::from(vec![0u8; 250]))).unwrap();
            wait_for_transferred(&mut rx, step * 250).await;
        }
        drop(tx);

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome, DownloadOutcome::Completed);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 1000);
    }

    #[tokio::test]
    async fn test_cancel_mid_download_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = destination(&dir);

        let (fetcher, tx) = ChannelFetch::new(Some(1000));
        let task = Arc::new(DownloadTask::new(Arc::new(fetcher), URL, &dest));
        let mut rx = task.subscribe();

        let handle = tokio::spawn({
            let task = Arc::clone(&task);
            async move { task.start().await }
        });

        tx.send(Ok(Bytes::from(vec![0u8; 400]))).unwrap();
        wait_for_transferred(&mut rx, 400).await;
        task.cancel();

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome, DownloadOutcome::Cancelled);
        assert_eq!(*task.subscribe().borrow(), DownloadState::Cancelled);

        // The handle is closed; the partial file can be removed.
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 400);
        std::fs::remove_file(&dest).unwrap();
    }

    #[tokio::test]
    async fn test_cancel_before_start_skips_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let task = DownloadTask::new(Arc::new(PanicFetch), URL, destination(&dir));

        task.cancel();
        task.cancel(); // idempotent

        let outcome = task.start().await.unwrap();
        assert_eq!(outcome, DownloadOutcome::Cancelled);
        assert_eq!(*task.subscribe().borrow(), DownloadState::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_after_completion_keeps_completed_state() {
        let dir = tempfile::tempdir().unwrap();
        let task = DownloadTask::new(
            Arc::new(StaticFetch::ok(b"payload")),
            URL,
            destination(&dir),
        );

        task.start().await.unwrap();
        task.cancel();
        assert_eq!(*task.subscribe().borrow(), DownloadState::Completed);
    }

    #[tokio::test]
    async fn test_stream_error_fails_the_task() {
        let dir = tempfile::tempdir().unwrap();
        let dest = destination(&dir);

        let (fetcher, tx) = ChannelFetch::new(Some(1000));
        let task = Arc::new(DownloadTask::new(Arc::new(fetcher), URL, &dest));
        let mut rx = task.subscribe();

        let handle = tokio::spawn({
            let task = Arc::clone(&task);
            async move { task.start().await }
        });

        tx.send(Ok(Bytes::from(vec![0u8; 100]))).unwrap();
        wait_for_transferred(&mut rx, 100).await;
        tx.send(Err(io::Error::other("connection reset"))).unwrap();
        drop(tx);

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, UpdateError::Download { .. }));
        assert!(matches!(
            &*task.subscribe().borrow(),
            DownloadState::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_rejected_response_fails_the_task() {
        let dir = tempfile::tempdir().unwrap();
        let task = DownloadTask::new(Arc::new(StaticFetch::status(404)), URL, destination(&dir));

        let err = task.start().await.unwrap_err();
        assert!(matches!(err, UpdateError::Network { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_unknown_length_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let dest = destination(&dir);

        let fetcher = StaticFetch {
            status: 200,
            content_length: None,
            chunks: vec![Bytes::from_static(b"chunked body")],
        };
        let task = DownloadTask::new(Arc::new(fetcher), URL, &dest);

        let outcome = task.start().await.unwrap();
        assert_eq!(outcome, DownloadOutcome::Completed);
        assert_eq!(std::fs::read(&dest).unwrap(), b"chunked body");
    }

    #[tokio::test]
    async fn test_overlong_body_fails() {
        let dir = tempfile::tempdir().unwrap();

        let fetcher = StaticFetch {
            status: 200,
            content_length: Some(4),
            chunks: vec![Bytes::from_static(b"more than four bytes")],
        };
        let task = DownloadTask::new(Arc::new(fetcher), URL, destination(&dir));

        let err = task.start().await.unwrap_err();
        assert!(matches!(err, UpdateError::Download { .. }));
    }
}
