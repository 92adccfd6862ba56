use adw::prelude::*;
use adw::Application;
use gtk4::glib;

fn main() -> glib::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = Application::builder()
        .application_id("br.dev.centauri.Chat")
        .build();
    app.connect_activate(|app| {
        centauri_chat::ui::build_ui(app);
    });
    app.run()
}
