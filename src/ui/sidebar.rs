use gtk4::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::models::Contact;
use crate::chat::events::EngineHandle;

pub struct Sidebar {
    root: gtk::Box,
    list: gtk::ListBox,
    contacts: Rc<RefCell<Vec<Contact>>>,
}

impl Sidebar {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let title = gtk::Label::new(Some("Contacts"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let list = gtk::ListBox::new();
        root.append(&list);

        Self {
            root,
            list,
            contacts: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn set_sensitive(&self, sensitive: bool) {
        self.list.set_sensitive(sensitive);
    }

    pub fn set_items(&self, items: Vec<Contact>) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        self.contacts.borrow_mut().clear();
        for contact in items {
            self.push(contact);
        }
    }

    pub fn push(&self, contact: Contact) {
        let row = gtk::ListBoxRow::new();
        let label = gtk::Label::new(Some(&contact.name));
        label.set_tooltip_text(Some(&contact.address));
        label.set_margin_top(8);
        label.set_margin_bottom(8);
        label.set_margin_start(8);
        label.set_margin_end(8);
        label.set_halign(gtk::Align::Start);
        row.set_child(Some(&label));
        self.list.append(&row);
        self.contacts.borrow_mut().push(contact);
    }

    /// Activating a row selects that contact in the engine.
    pub fn connect_selected(&self, handle: EngineHandle) {
        let contacts = self.contacts.clone();
        self.list.connect_row_activated(move |_, row| {
            let Ok(idx) = usize::try_from(row.index()) else {
                return;
            };
            if let Some(contact) = contacts.borrow().get(idx) {
                handle.select_contact(contact.clone());
            }
        });
    }
}
