use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use std::rc::Rc;

use crate::api::client::ApiClient;
use crate::app::AppConfig;

pub fn show_login_window(app: &Application) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Centauri Login")
        .default_width(420)
        .default_height(300)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    // Root container
    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    // Title
    let title = gtk::Label::new(Some("Connect to Centauri"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    // Server URL
    let server_entry = gtk::Entry::new();
    server_entry.set_placeholder_text(Some("Server URL (e.g. https://centauri.example.com)"));
    server_entry.set_hexpand(true);

    // Email used as the login name
    let user_entry = gtk::Entry::new();
    user_entry.set_placeholder_text(Some("Email"));
    user_entry.set_hexpand(true);

    // Password
    let pass_entry = gtk::PasswordEntry::new();
    pass_entry.set_placeholder_text(Some("Password"));
    pass_entry.set_hexpand(true);

    // Arrange fields
    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&server_entry);
    form.append(&user_entry);
    form.append(&pass_entry);
    root.append(&form);

    // Status label (small, muted)
    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    // Login button
    let login_btn = gtk::Button::with_label("Connect");
    login_btn.add_css_class("suggested-action");
    login_btn.set_halign(gtk::Align::End);
    root.append(&login_btn);

    toast_overlay.set_child(Some(&root));
    // Header bar inside content for window decorations
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let header_title = gtk::Label::new(Some("Centauri Chat"));
    header.set_title_widget(Some(&header_title));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    // Validate fields, log in, then swap to the main window
    let on_connect = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let server_entry = server_entry.clone();
        let user_entry = user_entry.clone();
        let pass_entry = pass_entry.clone();
        move || {
            let mut config = AppConfig::load();
            config.base_url = crate::utils::normalize_url(&server_entry.text());
            config.username = user_entry.text().trim().to_string();
            config.password = pass_entry.text().to_string();
            if !config.is_configured() || config.password.is_empty() {
                overlay.add_toast(adw::Toast::new("Please enter server URL, email and password."));
                return;
            }
            let client = match ApiClient::from_config(&config) {
                Ok(client) => client,
                Err(e) => {
                    overlay.add_toast(adw::Toast::new(&format!("Invalid server URL: {}", e)));
                    return;
                }
            };

            // Credentials are saved only after the server accepts them
            status.set_label("Connecting…");
            let username = config.username.clone();
            let password = config.password.clone();
            let status_label = status.clone();
            let app = app.clone();
            let window = window.clone();
            let overlay = overlay.clone();
            crate::ui::run_async_to_main(
                async move { client.login(&username, &password).await },
                move |res| match res {
                    Ok(()) => {
                        status_label.set_label("Connected");
                        if let Err(e) = config.save() {
                            overlay.add_toast(adw::Toast::new(&format!("Failed to save settings: {}", e)));
                        }
                        crate::ui::main_window::show_main_window(&app, config);
                        window.close();
                    }
                    Err(err) => {
                        log::warn!("Login failed: {}", err);
                        status_label.set_label("Connection failed");
                        overlay.add_toast(adw::Toast::new("Could not log in. Check URL, email and password."));
                    }
                },
            );
        }
    };

    let on_connect: Rc<dyn Fn()> = Rc::new(on_connect);
    // Button click
    {
        let on_connect = on_connect.clone();
        login_btn.connect_clicked(move |_| (on_connect)());
    }
    // Enter in any field triggers connect
    {
        let on_connect = on_connect.clone();
        server_entry.connect_activate(move |_| (on_connect)());
    }
    {
        let on_connect = on_connect.clone();
        user_entry.connect_activate(move |_| (on_connect)());
    }
    {
        let on_connect = on_connect.clone();
        pass_entry.connect_activate(move |_| (on_connect)());
    }

    window.present();
}
