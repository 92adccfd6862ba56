use adw::prelude::*;
use adw::Application;
use gtk4::glib;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::api::client::{ApiClient, Transport};
use crate::api::models::Contact;
use crate::app::AppConfig;
use crate::chat::engine::{SyncEngine, SyncSettings};
use crate::error::TransportError;
use crate::ui::chat_view::ChatView;
use crate::ui::sidebar::Sidebar;

pub fn show_main_window(app: &Application, config: AppConfig) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Centauri Chat")
        .default_width(960)
        .default_height(640)
        .build();

    let overlay = adw::ToastOverlay::new();

    let split = adw::Flap::builder()
        .reveal_flap(true)
        .locked(true)
        .modal(false)
        .build();

    let sidebar = Rc::new(Sidebar::new());
    sidebar.set_items(config.contacts.clone());
    sidebar.set_sensitive(false);
    split.set_flap(Some(&sidebar.widget()));

    let chat = ChatView::new(overlay.clone());
    split.set_content(Some(&chat.widget()));

    overlay.set_child(Some(&split));

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk4::Label::new(Some("Centauri Chat"));
    header.set_title_widget(Some(&title));

    let add_contact_btn = gtk4::Button::with_label("Add Contact");
    add_contact_btn.add_css_class("suggested-action");
    header.pack_end(&add_contact_btn);
    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));
    window.present();

    let client = match ApiClient::from_config(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("Invalid server settings: {}", e);
            overlay.add_toast(adw::Toast::new(&format!("Invalid server settings: {}", e)));
            return;
        }
    };

    let transport: Arc<dyn Transport> = client.clone();
    let (engine, events) = SyncEngine::new(
        transport,
        chat.clone(),
        crate::utils::runtime_handle(),
        SyncSettings::from(&config),
    );
    let handle = engine.handle();
    sidebar.connect_selected(handle.clone());
    chat.connect_submit(handle.clone());
    glib::MainContext::default().spawn_local(engine.run(events));
    window.connect_close_request(move |_| {
        handle.shutdown();
        glib::Propagation::Proceed
    });

    {
        let login_client = client.clone();
        let username = config.username.clone();
        let password = config.password.clone();
        let overlay = overlay.clone();
        let sidebar = sidebar.clone();
        crate::ui::run_async_to_main(
            async move { login_client.login(&username, &password).await },
            move |res| match res {
                Ok(()) => sidebar.set_sensitive(true),
                Err(err) => {
                    overlay.add_toast(adw::Toast::new(&format!("Login failed: {}", err)));
                }
            },
        );
    }

    let config = Rc::new(RefCell::new(config));
    add_contact_btn.connect_clicked(move |_| {
        let dialog = gtk4::Dialog::builder()
            .title("Add Contact")
            .transient_for(&window)
            .modal(true)
            .build();
        let content = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
        content.set_margin_top(12);
        content.set_margin_bottom(12);
        content.set_margin_start(12);
        content.set_margin_end(12);

        let info = gtk4::Label::new(Some("Email of a registered user:"));
        info.set_halign(gtk4::Align::Start);
        content.append(&info);

        let entry = gtk4::Entry::new();
        entry.set_placeholder_text(Some("name@example.com"));
        entry.set_hexpand(true);
        content.append(&entry);

        dialog.set_child(Some(&content));
        let _ = dialog.add_button("Cancel", gtk4::ResponseType::Cancel);
        let ok_btn = dialog.add_button("Add", gtk4::ResponseType::Ok);
        ok_btn.add_css_class("suggested-action");
        dialog.set_default_response(gtk4::ResponseType::Ok);

        let overlay = overlay.clone();
        let sidebar = sidebar.clone();
        let client = client.clone();
        let config = config.clone();
        dialog.connect_response(move |dlg, resp| {
            if resp == gtk4::ResponseType::Ok {
                let email = entry.text().trim().to_string();
                if email.is_empty() {
                    overlay.add_toast(adw::Toast::new("Please enter an email."));
                    return;
                }

                let client = client.clone();
                let overlay = overlay.clone();
                let sidebar = sidebar.clone();
                let config = config.clone();
                crate::ui::run_async_to_main(
                    find_and_add_contact(client, email),
                    move |res| match res {
                        Ok(Some(contact)) => {
                            let mut config = config.borrow_mut();
                            if config.remember_contact(contact.clone()) {
                                sidebar.push(contact);
                                if let Err(e) = config.save() {
                                    log::warn!("Failed to save contacts: {}", e);
                                }
                            }
                        }
                        Ok(None) => overlay.add_toast(adw::Toast::new("No user with that email.")),
                        Err(err) => overlay
                            .add_toast(adw::Toast::new(&format!("Failed to add contact: {}", err))),
                    },
                );
            }
            dlg.close();
        });

        dialog.present();
    });
}

/// Looks the email up and, if a user exists, associates it as a contact.
async fn find_and_add_contact(
    client: Arc<ApiClient>,
    email: String,
) -> Result<Option<Contact>, TransportError> {
    let Some(contact) = client.search_contact(&email).await?.into_iter().next() else {
        return Ok(None);
    };
    client.add_contact(&contact.address).await?;
    Ok(Some(contact))
}
