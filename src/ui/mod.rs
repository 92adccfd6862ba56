use std::future::Future;

use adw::Application;
use gtk4::glib;

use crate::app::AppConfig;

pub mod chat_view;
pub mod login;
pub mod main_window;
pub mod sidebar;

pub fn build_ui(app: &Application) {
    let config = AppConfig::load();
    if config.is_configured() {
        main_window::show_main_window(app, config);
    } else {
        login::show_login_window(app);
    }
}

/// Runs `fut` on the shared tokio runtime and hands its output to `on_done`
/// on the GTK main thread.
pub fn run_async_to_main<T, Fut, F>(fut: Fut, on_done: F)
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    F: FnOnce(T) + 'static,
{
    let task = crate::utils::RUNTIME.spawn(fut);
    glib::MainContext::default().spawn_local(async move {
        match task.await {
            Ok(value) => on_done(value),
            Err(e) => log::error!("Background task failed: {}", e),
        }
    });
}
