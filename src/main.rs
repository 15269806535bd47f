mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use iced::window;
use tracing_subscriber::EnvFilter;

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("Gradient Downloader")
        .window(window::Settings {
            icon: app_icon(),
            ..Default::default()
        })
        .run()
}

/// Window icon rendered from the backdrop colors, no bundled asset needed.
fn app_icon() -> Option<window::Icon> {
    const SIZE: u32 = 32;
    let img = image::RgbaImage::from_fn(SIZE, SIZE, |_, y| {
        let t = y as f32 / (SIZE - 1) as f32;
        let lerp = |a: f32, b: f32| (a + (b - a) * t) as u8;
        image::Rgba([
            lerp(73.0, 36.0),
            lerp(223.0, 115.0),
            lerp(185.0, 192.0),
            255,
        ])
    });
    window::icon::from_rgba(img.into_raw(), SIZE, SIZE).ok()
}
