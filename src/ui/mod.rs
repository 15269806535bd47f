use iced::{
    gradient,
    widget::{button, column, container, image, progress_bar, text, Space},
    Alignment, Background, Color, Element, Length, Radians,
};

use crate::domain::{DownloadPhase, ProgressState};

/// Backdrop gradient stops, top to bottom.
const GRADIENT_TOP: Color = Color {
    r: 73.0 / 255.0,
    g: 223.0 / 255.0,
    b: 185.0 / 255.0,
    a: 1.0,
};
const GRADIENT_BOTTOM: Color = Color {
    r: 36.0 / 255.0,
    g: 115.0 / 255.0,
    b: 192.0 / 255.0,
    a: 1.0,
};

/// Main view state
pub struct DownloadView {
    pub progress: ProgressState,
    pub phase: DownloadPhase,
    pub image: Option<image::Handle>,
    pub status_message: String,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            progress: ProgressState::default(),
            phase: DownloadPhase::Idle,
            image: None,
            status_message: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    DownloadPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::DownloadPressed => {
                // Reset is synchronous, before any network byte arrives.
                self.image = None;
                self.progress = ProgressState::default();
                self.phase = DownloadPhase::Downloading;
                self.status_message = String::new();
            }
        }
    }

    fn status_line(&self) -> String {
        match self.phase {
            DownloadPhase::Idle => "Press download to fetch the image".to_string(),
            DownloadPhase::Downloading => "Downloading...".to_string(),
            DownloadPhase::Completed | DownloadPhase::Failed => self.status_message.clone(),
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let mut content = column![
            progress_bar(0.0..=1.0, self.progress.fraction()),
            text(format!("{} %", self.progress.percent())).size(16),
            Space::new().height(Length::Fixed(10.0)),
            button("Download")
                .on_press(DownloadMessage::DownloadPressed)
                .padding([10, 20]),
            Space::new().height(Length::Fixed(10.0)),
            text(self.status_line()).size(14),
        ]
        .width(Length::Fixed(320.0))
        .padding(20)
        .spacing(10)
        .align_x(Alignment::Center);

        if let Some(handle) = &self.image {
            content = content.push(image(handle.clone()).width(Length::Fixed(280.0)));
        }

        container(content)
            .center(Length::Fill)
            .style(|_theme| container::Style {
                background: Some(Background::Gradient(backdrop().into())),
                ..container::Style::default()
            })
            .into()
    }
}

fn backdrop() -> gradient::Linear {
    gradient::Linear::new(Radians(std::f32::consts::PI))
        .add_stop(0.0, GRADIENT_TOP)
        .add_stop(1.0, GRADIENT_BOTTOM)
}
