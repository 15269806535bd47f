use std::path::{Path, PathBuf};

use futures::{stream::BoxStream, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use url::Url;

use crate::{
    api::HttpClient,
    domain::{AppError, ProgressState},
    utils,
};

/// Filename of the one stored image, constant across runs.
const STORED_IMAGE_NAME: &str = "file.jpg";

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Progress(ProgressState),
    /// Transfer finished; the bytes sit at this temporary location.
    Delivered(PathBuf),
    Failed(AppError),
}

#[derive(Clone, Default)]
pub struct DownloadCoordinator {
    http: HttpClient,
}

impl DownloadCoordinator {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Destination for the finished image: `<documents>/file.jpg`.
    pub fn destination_path(&self) -> PathBuf {
        utils::document_dir().join(STORED_IMAGE_NAME)
    }

    /// Streams one transfer attempt into a fresh temp file, emitting a
    /// progress event per chunk and exactly one terminal event.
    pub fn download_stream(&self, url: Url) -> BoxStream<'static, DownloadEvent> {
        self.download_stream_to(url, utils::temp_download_path())
    }

    fn download_stream_to(&self, url: Url, temp: PathBuf) -> BoxStream<'static, DownloadEvent> {
        futures::stream::unfold(
            DownloadRuntimeState::Start {
                client: self.http.clone(),
                url,
                temp,
            },
            |state| async move {
                match state {
                    DownloadRuntimeState::Start { client, url, temp } => {
                        let file = match tokio::fs::File::create(&temp).await {
                            Ok(file) => file,
                            Err(e) => {
                                return Some((
                                    DownloadEvent::Failed(AppError::Io(format!(
                                        "failed to create temp file: {}",
                                        e
                                    ))),
                                    DownloadRuntimeState::Finished,
                                ));
                            }
                        };

                        match client.fetch_stream(url).await {
                            Ok((total, stream)) => {
                                let progress = ProgressState::new(0, total);
                                Some((
                                    DownloadEvent::Progress(progress),
                                    DownloadRuntimeState::Downloading {
                                        file,
                                        stream: stream.boxed(),
                                        progress,
                                        temp,
                                    },
                                ))
                            }
                            Err(e) => {
                                let _ = tokio::fs::remove_file(&temp).await;
                                Some((
                                    DownloadEvent::Failed(AppError::Http(e.to_string())),
                                    DownloadRuntimeState::Finished,
                                ))
                            }
                        }
                    }
                    DownloadRuntimeState::Downloading {
                        mut file,
                        mut stream,
                        mut progress,
                        temp,
                    } => match stream.next().await {
                        Some(Ok(chunk)) => {
                            if let Err(e) = file.write_all(&chunk).await {
                                drop(file);
                                let _ = tokio::fs::remove_file(&temp).await;
                                return Some((
                                    DownloadEvent::Failed(AppError::Io(format!(
                                        "write error: {}",
                                        e
                                    ))),
                                    DownloadRuntimeState::Finished,
                                ));
                            }

                            progress.downloaded += chunk.len() as u64;

                            Some((
                                DownloadEvent::Progress(progress),
                                DownloadRuntimeState::Downloading {
                                    file,
                                    stream,
                                    progress,
                                    temp,
                                },
                            ))
                        }
                        Some(Err(e)) => {
                            drop(file);
                            let _ = tokio::fs::remove_file(&temp).await;
                            Some((
                                DownloadEvent::Failed(AppError::Http(e.to_string())),
                                DownloadRuntimeState::Finished,
                            ))
                        }
                        None => {
                            if let Err(e) = file.sync_all().await {
                                drop(file);
                                let _ = tokio::fs::remove_file(&temp).await;
                                return Some((
                                    DownloadEvent::Failed(AppError::Io(format!(
                                        "failed to sync file: {}",
                                        e
                                    ))),
                                    DownloadRuntimeState::Finished,
                                ));
                            }

                            Some((
                                DownloadEvent::Delivered(temp),
                                DownloadRuntimeState::Finished,
                            ))
                        }
                    },
                    DownloadRuntimeState::Finished => None,
                }
            },
        )
        .boxed()
    }

    /// Installs a delivered temp file at the destination and reports which
    /// path to display.
    ///
    /// When a previous image already sits at the destination it wins: the
    /// existing file is displayed and the fresh temp file is dropped. This
    /// mirrors the screen's long-standing behavior and is pinned by a
    /// regression test.
    pub async fn finish_download(&self, temp: PathBuf) -> Result<PathBuf, AppError> {
        self.finish_download_at(temp, self.destination_path()).await
    }

    async fn finish_download_at(
        &self,
        temp: PathBuf,
        destination: PathBuf,
    ) -> Result<PathBuf, AppError> {
        if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
            info!(
                path = %destination.display(),
                "destination already present, displaying existing file"
            );
            let _ = tokio::fs::remove_file(&temp).await;
            return Ok(destination);
        }

        move_file(&temp, &destination).await.map_err(|e| {
            error!(error = %e, "failed to move downloaded file to destination");
            AppError::Io(format!("failed to move downloaded file: {}", e))
        })?;

        info!(path = %destination.display(), "stored downloaded image");
        Ok(destination)
    }
}

/// Rename first; fall back to copy+remove when the temp dir and the
/// documents dir live on different filesystems.
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}

enum DownloadRuntimeState {
    Start {
        client: HttpClient,
        url: Url,
        temp: PathBuf,
    },
    Downloading {
        file: tokio::fs::File,
        stream: BoxStream<'static, crate::api::Result<bytes::Bytes>>,
        progress: ProgressState,
        temp: PathBuf,
    },
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> DownloadCoordinator {
        DownloadCoordinator::default()
    }

    #[tokio::test]
    async fn first_finish_moves_temp_to_destination() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("incoming.tmp");
        tokio::fs::write(&temp, b"fresh jpeg bytes").await.unwrap();
        let destination = dir.path().join("file.jpg");

        let shown = coordinator()
            .finish_download_at(temp.clone(), destination.clone())
            .await
            .unwrap();

        assert_eq!(shown, destination);
        assert_eq!(
            tokio::fs::read(&destination).await.unwrap(),
            b"fresh jpeg bytes"
        );
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn existing_destination_wins_over_new_download() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("file.jpg");
        tokio::fs::write(&destination, b"old image").await.unwrap();
        let temp = dir.path().join("incoming.tmp");
        tokio::fs::write(&temp, b"new image").await.unwrap();

        let shown = coordinator()
            .finish_download_at(temp, destination.clone())
            .await
            .unwrap();

        // The stale file stays in place untouched; the new bytes are dropped.
        assert_eq!(shown, destination);
        assert_eq!(tokio::fs::read(&destination).await.unwrap(), b"old image");
    }

    #[tokio::test]
    async fn move_failure_is_reported_not_panicked() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("incoming.tmp");
        tokio::fs::write(&temp, b"bytes").await.unwrap();
        let destination = dir.path().join("no-such-dir").join("file.jpg");

        let result = coordinator().finish_download_at(temp, destination).await;

        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn download_stream_yields_progress_then_delivery() {
        let mut server = mockito::Server::new_async().await;
        let body = vec![42u8; 2048];
        let _mock = server
            .mock("GET", "/pic.jpg")
            .with_body(body.clone())
            .create_async()
            .await;
        let url = Url::parse(&format!("{}/pic.jpg", server.url())).unwrap();

        let mut events = coordinator().download_stream(url);
        let mut last_progress = None;
        let mut delivered = None;
        while let Some(event) = events.next().await {
            match event {
                DownloadEvent::Progress(progress) => last_progress = Some(progress),
                DownloadEvent::Delivered(path) => delivered = Some(path),
                DownloadEvent::Failed(e) => panic!("unexpected failure: {}", e),
            }
        }

        let progress = last_progress.unwrap();
        assert_eq!(progress.downloaded, body.len() as u64);
        assert_eq!(progress.total, Some(body.len() as u64));
        assert_eq!(progress.percent(), 100);

        let temp = delivered.expect("transfer should deliver a temp file");
        assert_eq!(tokio::fs::read(&temp).await.unwrap(), body);
        tokio::fs::remove_file(temp).await.unwrap();
    }

    #[tokio::test]
    async fn overlapping_downloads_each_terminate_once() {
        let mut server = mockito::Server::new_async().await;
        let body = vec![9u8; 1024];
        let _mock = server
            .mock("GET", "/pic.jpg")
            .with_body(body.clone())
            .create_async()
            .await;
        let url = Url::parse(&format!("{}/pic.jpg", server.url())).unwrap();

        // A second press does not cancel the first transfer; both run to
        // completion against the same destination.
        let coordinator = coordinator();
        let (first, second) = tokio::join!(
            coordinator.download_stream(url.clone()).collect::<Vec<_>>(),
            coordinator.download_stream(url).collect::<Vec<_>>(),
        );

        let terminal = |events: &[DownloadEvent]| {
            events
                .iter()
                .filter(|event| !matches!(event, DownloadEvent::Progress(_)))
                .count()
        };
        assert_eq!(terminal(&first), 1);
        assert_eq!(terminal(&second), 1);

        // Both deliveries race one destination: the first install wins, the
        // second finds the existing file and drops its temp copy.
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("file.jpg");
        for events in [first, second] {
            match events.last().unwrap() {
                DownloadEvent::Delivered(temp) => {
                    let shown = coordinator
                        .finish_download_at(temp.clone(), destination.clone())
                        .await
                        .unwrap();
                    assert_eq!(shown, destination);
                    assert!(!temp.exists());
                }
                other => panic!("expected delivery, got {:?}", other),
            }
        }
        assert_eq!(tokio::fs::read(&destination).await.unwrap(), body);
    }

    #[tokio::test]
    async fn mid_stream_error_cleans_up_partial_file() {
        use std::io::Write;

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/pic.jpg")
            .with_chunked_body(|writer| {
                writer.write_all(&[0u8; 1024])?;
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionAborted,
                    "connection dropped",
                ))
            })
            .create_async()
            .await;
        let url = Url::parse(&format!("{}/pic.jpg", server.url())).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("partial.tmp");
        let events: Vec<_> = coordinator()
            .download_stream_to(url, temp.clone())
            .collect()
            .await;

        assert!(matches!(events.last(), Some(DownloadEvent::Failed(_))));
        // No partial file lingers after a failed transfer.
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn transfer_error_terminates_with_single_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/pic.jpg")
            .with_status(500)
            .create_async()
            .await;
        let url = Url::parse(&format!("{}/pic.jpg", server.url())).unwrap();

        let events: Vec<_> = coordinator().download_stream(url).collect().await;

        // Exactly one terminal outcome per attempt.
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DownloadEvent::Failed(_)));
    }
}
