use std::path::PathBuf;

use iced::Task;
use tracing::{error, info};
use url::Url;

use crate::api::HttpClient;
use crate::application::{DownloadCoordinator, DownloadEvent};
use crate::domain::{AppError, DownloadPhase};
use crate::ui::{DownloadMessage, DownloadView};

/// The one image this screen knows how to fetch.
pub const IMAGE_URL: &str = "http://mmd.ninjacdn.com/images/brandphotos/HighRes/Image7HighRes_9.jpg";

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadApp {
    pub fn new() -> Self {
        Self {
            view: DownloadView::default(),
            coordinator: DownloadCoordinator::new(HttpClient::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    Ui(DownloadMessage),
    /// Progress and terminal events from the transfer stream
    Transfer(DownloadEvent),
    /// Path the finished image was installed at, or the move error
    Installed(Result<PathBuf, AppError>),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::Ui(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::DownloadPressed => {
                    let url = match Url::parse(IMAGE_URL) {
                        Ok(url) => url,
                        Err(e) => {
                            // Hard-coded constant; a parse failure is a
                            // programming error, pinned by a test below.
                            error!(error = %e, "invalid download URL");
                            app.view.phase = DownloadPhase::Failed;
                            app.view.status_message = "Invalid download URL".to_string();
                            return Task::none();
                        }
                    };

                    info!(%url, "download started");
                    // A second press while a transfer is in flight does not
                    // cancel it; another stream simply starts against the
                    // same destination.
                    Task::stream(app.coordinator.download_stream(url)).map(Message::Transfer)
                }
            }
        }
        Message::Transfer(event) => match event {
            DownloadEvent::Progress(progress) => {
                app.view.progress = progress;
                Task::none()
            }
            DownloadEvent::Delivered(temp) => {
                let coordinator = app.coordinator.clone();
                Task::perform(
                    async move { coordinator.finish_download(temp).await },
                    Message::Installed,
                )
            }
            DownloadEvent::Failed(e) => {
                error!(error = %e, "download failed");
                app.view.phase = DownloadPhase::Failed;
                app.view.status_message = format!("Download failed: {}", e);
                Task::none()
            }
        },
        Message::Installed(result) => {
            match result {
                Ok(path) => {
                    // Display only what is actually on disk.
                    if path.exists() {
                        info!(path = %path.display(), "displaying image");
                        app.view.image = Some(iced::widget::image::Handle::from_path(&path));
                        app.view.phase = DownloadPhase::Completed;
                        app.view.status_message = format!("Saved: {}", path.display());
                    }
                }
                Err(e) => {
                    // Already logged by the coordinator; the image view is
                    // left as it was.
                    app.view.phase = DownloadPhase::Failed;
                    app.view.status_message = format!("Download failed: {}", e);
                }
            }
            Task::none()
        }
    }
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::Ui)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProgressState;

    #[test]
    fn image_url_is_valid() {
        Url::parse(IMAGE_URL).unwrap();
    }

    #[test]
    fn press_resets_progress_and_clears_image_synchronously() {
        let mut app = DownloadApp::new();
        app.view.image = Some(iced::widget::image::Handle::from_bytes(vec![0u8; 4]));
        app.view.progress = ProgressState::new(50, Some(100));

        let _task = update(&mut app, Message::Ui(DownloadMessage::DownloadPressed));

        assert!(app.view.image.is_none());
        assert_eq!(app.view.progress.fraction(), 0.0);
        assert_eq!(app.view.progress.percent(), 0);
        assert_eq!(app.view.phase, DownloadPhase::Downloading);
    }

    #[test]
    fn progress_event_updates_view_counters() {
        let mut app = DownloadApp::new();

        let _ = update(
            &mut app,
            Message::Transfer(DownloadEvent::Progress(ProgressState::new(1, Some(3)))),
        );

        assert_eq!(app.view.progress.percent(), 33);
    }

    #[test]
    fn failure_leaves_image_unchanged() {
        let mut app = DownloadApp::new();
        app.view.image = Some(iced::widget::image::Handle::from_bytes(vec![1u8; 4]));

        let _ = update(
            &mut app,
            Message::Installed(Err(AppError::Io("move failed".to_string()))),
        );

        assert!(app.view.image.is_some());
        assert_eq!(app.view.phase, DownloadPhase::Failed);
    }
}
