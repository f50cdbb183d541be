use {
    crate::view::HitView,
    std::{sync::Arc, time::Duration},
    tokio::{sync::RwLock, time::interval},
};

/// One-line summary of the current view
pub fn summary(view: &HitView) -> String {
    format!(
        "{} gears, {} hits, {} requests (cycle {})",
        view.gear_count(),
        view.hit_count(),
        view.total_size(),
        view.cycles()
    )
}

/// Log a summary whenever the view signals a redraw, instead of drawing
pub async fn run_headless(view: Arc<RwLock<HitView>>, check_interval: Duration) {
    log::info!("📜 Headless mode: logging redraws");

    let mut timer = interval(check_interval);
    let mut last_generation = 0;
    let mut last_error: Option<String> = None;

    loop {
        timer.tick().await;

        let view = view.read().await;

        if view.generation() != last_generation {
            last_generation = view.generation();
            log::info!("🔄 {}", summary(&view));
        }

        let error = view.last_error().map(str::to_string);
        if error != last_error {
            if let Some(ref e) = error {
                log::warn!("Poll error: {}", e);
            }
            last_error = error;
        }
    }
}
