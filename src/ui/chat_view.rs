use adw::prelude::*;
use gtk4 as gtk;
use gtk4::glib;
use std::rc::Rc;

use crate::api::models::Contact;
use crate::chat::cache::ConversationState;
use crate::chat::events::{EngineHandle, Notice};
use crate::chat::message::Direction;
use crate::chat::render::{bubbles, Renderer, EMPTY_PLACEHOLDER};

/// Conversation pane: title, scrolling transcript and the input row.
#[derive(Clone)]
pub struct ChatView {
    root: gtk::Box,
    title: gtk::Label,
    messages_box: gtk::Box,
    scroller: gtk::ScrolledWindow,
    entry: gtk::Entry,
    send_btn: gtk::Button,
    toasts: adw::ToastOverlay,
}

impl ChatView {
    pub fn new(toasts: adw::ToastOverlay) -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let title = gtk::Label::new(Some("Select a contact"));
        title.add_css_class("title-4");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        // Input row, enabled once a contact is selected
        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Type a message…"));
        entry.set_sensitive(false);
        let send_btn = gtk::Button::with_label("Send");
        send_btn.set_sensitive(false);
        input_row.append(&entry);
        input_row.append(&send_btn);
        root.append(&input_row);

        Self {
            root,
            title,
            messages_box,
            scroller,
            entry,
            send_btn,
            toasts,
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    /// Enter and the send button both submit the entry text to the engine.
    pub fn connect_submit(&self, handle: EngineHandle) {
        let entry = self.entry.clone();
        let send: Rc<dyn Fn()> = Rc::new(move || {
            let text = entry.text().to_string();
            handle.submit(text.clone());
            if !text.trim().is_empty() {
                entry.set_text("");
            }
        });
        {
            let send = send.clone();
            self.send_btn.connect_clicked(move |_| (send)());
        }
        {
            let send = send.clone();
            self.entry.connect_activate(move |_| (send)());
        }
    }

    fn clear(&self) {
        while let Some(child) = self.messages_box.first_child() {
            self.messages_box.remove(&child);
        }
    }

    fn scroll_to_bottom(&self) {
        let scroller = self.scroller.clone();
        // upper bound is only updated after the next layout pass
        glib::idle_add_local_once(move || {
            let adj = scroller.vadjustment();
            adj.set_value(adj.upper());
        });
    }
}

impl Renderer for ChatView {
    fn render(&mut self, contact: &Contact, conversation: &ConversationState) {
        self.title.set_label(&contact.name);
        self.entry.set_sensitive(true);
        self.send_btn.set_sensitive(true);
        self.clear();

        let bubbles = bubbles(conversation);
        if bubbles.is_empty() {
            let lbl = gtk::Label::new(Some(EMPTY_PLACEHOLDER));
            lbl.add_css_class("dim-label");
            self.messages_box.append(&lbl);
            return;
        }

        for bubble in bubbles {
            let lbl = gtk::Label::new(Some(&format!("{}\n{}", bubble.content, bubble.timestamp)));
            lbl.set_wrap(true);
            lbl.set_xalign(0.0);
            match bubble.direction {
                Direction::Received => {
                    lbl.set_halign(gtk::Align::Start);
                    lbl.add_css_class("message-received");
                }
                Direction::Sent => {
                    lbl.set_halign(gtk::Align::End);
                    lbl.add_css_class("message-sent");
                }
            }
            if bubble.pending {
                lbl.add_css_class("dim-label");
            }
            self.messages_box.append(&lbl);
        }
        self.scroll_to_bottom();
    }

    fn notify(&mut self, notice: &Notice) {
        self.toasts.add_toast(adw::Toast::new(&notice.to_string()));
    }
}
