//! Retained menu widgets.
//!
//! This is the surface the menu builders draw on: a tree of [`Menu`]s and [`MenuItem`]s with
//! toolkit semantics (styles, enablement, selection state, cascades, disposal, show/hide
//! listeners). Front-ends project it onto a real toolkit; tests inspect it directly.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::cache::Icon;
use crate::error::MenuError;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ItemStyle {
    Push,
    Check,
    Radio,
    Separator,
    Cascade,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MenuEventKind {
    Shown,
    Hidden,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MenuEvent {
    pub kind: MenuEventKind,
    /// Raised by code rather than by the platform (e.g. always-built menus).
    pub synthetic: bool,
}

impl MenuEvent {
    pub fn shown() -> Self {
        Self {
            kind: MenuEventKind::Shown,
            synthetic: false,
        }
    }

    pub fn hidden() -> Self {
        Self {
            kind: MenuEventKind::Hidden,
            synthetic: false,
        }
    }

    pub fn synthetic_shown() -> Self {
        Self {
            kind: MenuEventKind::Shown,
            synthetic: true,
        }
    }
}

pub trait MenuListener {
    fn menu_shown(&self, menu: &Menu, event: &MenuEvent);
    fn menu_hidden(&self, menu: &Menu, event: &MenuEvent);
}

pub type SelectionListener = Rc<dyn Fn(&MenuItem)>;

#[derive(Default)]
struct MenuInner {
    items: RefCell<Vec<MenuItem>>,
    listeners: RefCell<Vec<Rc<dyn MenuListener>>>,
    enabled: Cell<bool>,
    disposed: Cell<bool>,
}

#[derive(Clone)]
pub struct Menu(Rc<MenuInner>);

struct ItemInner {
    style: ItemStyle,
    text: RefCell<String>,
    enabled: Cell<bool>,
    selection: Cell<bool>,
    disposed: Cell<bool>,
    image: RefCell<Option<Rc<Icon>>>,
    submenu: RefCell<Option<Menu>>,
    listeners: RefCell<Vec<SelectionListener>>,
    parent: Weak<MenuInner>,
}

#[derive(Clone)]
pub struct MenuItem(Rc<ItemInner>);

impl Menu {
    pub fn new() -> Self {
        Self(Rc::new(MenuInner {
            enabled: Cell::new(true),
            ..Default::default()
        }))
    }

    /// Append a new item of `style`. Adding to a disposed menu yields a detached, disposed item.
    pub fn add_item(&self, style: ItemStyle) -> MenuItem {
        let item = MenuItem(Rc::new(ItemInner {
            style,
            text: RefCell::new(String::new()),
            enabled: Cell::new(true),
            selection: Cell::new(false),
            disposed: Cell::new(self.is_disposed()),
            image: RefCell::new(None),
            submenu: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            parent: Rc::downgrade(&self.0),
        }));
        if !self.is_disposed() {
            self.0.items.borrow_mut().push(item.clone());
        }
        item
    }

    pub fn items(&self) -> Vec<MenuItem> {
        self.0.items.borrow().clone()
    }

    pub fn item_count(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn item(&self, index: usize) -> Option<MenuItem> {
        self.0.items.borrow().get(index).cloned()
    }

    pub fn is_enabled(&self) -> bool {
        self.0.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.0.enabled.set(enabled);
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.get()
    }

    pub fn add_menu_listener(&self, listener: Rc<dyn MenuListener>) {
        self.0.listeners.borrow_mut().push(listener);
    }

    /// Deliver the platform's "about to show" signal.
    pub fn notify_shown(&self) {
        self.notify(&MenuEvent::shown());
    }

    /// Deliver the platform's "hidden" signal.
    pub fn notify_hidden(&self) {
        self.notify(&MenuEvent::hidden());
    }

    pub fn notify(&self, event: &MenuEvent) {
        if self.is_disposed() {
            return;
        }
        let listeners = self.0.listeners.borrow().clone();
        for l in listeners {
            match event.kind {
                MenuEventKind::Shown => l.menu_shown(self, event),
                MenuEventKind::Hidden => l.menu_hidden(self, event),
            }
        }
    }

    pub fn dispose_items(&self) {
        dispose_all(self.items());
    }

    pub fn dispose(&self) {
        if self.is_disposed() {
            return;
        }
        self.dispose_items();
        self.0.disposed.set(true);
        self.0.listeners.borrow_mut().clear();
    }

    pub fn ptr_eq(&self, other: &Menu) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Menu")
            .field("items", &*self.0.items.borrow())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl MenuItem {
    pub fn style(&self) -> ItemStyle {
        self.0.style
    }

    pub fn text(&self) -> String {
        self.0.text.borrow().clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.0.text.borrow_mut() = text.into();
    }

    pub fn is_enabled(&self) -> bool {
        self.0.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.0.enabled.set(enabled);
    }

    pub fn selection(&self) -> bool {
        self.0.selection.get()
    }

    pub fn set_selection(&self, selected: bool) {
        self.0.selection.set(selected);
    }

    pub fn image(&self) -> Option<Rc<Icon>> {
        self.0.image.borrow().clone()
    }

    pub fn set_image(&self, image: Option<Rc<Icon>>) {
        *self.0.image.borrow_mut() = image;
    }

    pub fn menu(&self) -> Option<Menu> {
        self.0.submenu.borrow().clone()
    }

    pub fn set_menu(&self, menu: Menu) {
        *self.0.submenu.borrow_mut() = Some(menu);
    }

    pub fn add_selection_listener(&self, listener: SelectionListener) {
        self.0.listeners.borrow_mut().push(listener);
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.get()
    }

    /// The user picked this item: check items toggle, radio items turn on,
    /// then the selection listeners run.
    pub fn select(&self) {
        if self.is_disposed() || !self.is_enabled() {
            return;
        }
        match self.style() {
            ItemStyle::Check => self.set_selection(!self.selection()),
            ItemStyle::Radio => self.set_selection(true),
            _ => {}
        }
        let listeners = self.0.listeners.borrow().clone();
        for l in listeners {
            l(self);
        }
    }

    pub fn dispose(&self) {
        if self.is_disposed() {
            return;
        }
        self.0.disposed.set(true);
        let submenu = self.0.submenu.borrow_mut().take();
        if let Some(sub) = submenu {
            sub.dispose();
        }
        self.0.listeners.borrow_mut().clear();
        if let Some(parent) = self.0.parent.upgrade() {
            parent.items.borrow_mut().retain(|i| !Rc::ptr_eq(&i.0, &self.0));
        }
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem")
            .field("style", &self.style())
            .field("text", &*self.0.text.borrow())
            .field("enabled", &self.is_enabled())
            .field("selection", &self.selection())
            .field("submenu", &*self.0.submenu.borrow())
            .finish()
    }
}

/// Dispose each item that is still alive.
pub fn dispose_all(items: impl IntoIterator<Item = MenuItem>) {
    for item in items {
        if !item.is_disposed() {
            item.dispose();
        }
    }
}

/// Append a separator unless the menu is empty or already ends with one.
pub fn add_separator(menu: &Menu) {
    if menu.is_disposed() || menu.item_count() == 0 {
        return;
    }
    let last_is_separator = menu
        .0
        .items
        .borrow()
        .last()
        .map(|i| i.style() == ItemStyle::Separator)
        .unwrap_or(false);
    if !last_is_separator {
        menu.add_item(ItemStyle::Separator);
    }
}

/// Walk `path` (item indices) from `root`, descending into cascades. With `show`, every
/// sub-menu on the way down gets its "shown" signal before it is searched, so lazily
/// built menus are filled in.
pub fn item_at_path(root: &Menu, path: &[usize], show: bool) -> Result<MenuItem, MenuError> {
    let missing = || MenuError::NoItemAtPath(path.to_vec());
    let (last, parents) = path.split_last().ok_or_else(missing)?;
    let mut menu = root.clone();
    for &idx in parents {
        let sub = menu.item(idx).and_then(|i| i.menu()).ok_or_else(missing)?;
        if show {
            sub.notify_shown();
        }
        menu = sub;
    }
    menu.item(*last).ok_or_else(missing)
}
