//! Toolkit-independent menu model that plugins contribute to.
//!
//! A [`PluginMenuItem`] describes an entry; it is turned into widgets by
//! [`crate::plugin::add_plugin_menu_items`] each time the hosting menu is shown. `T` is the
//! type of the objects the menu acts on (e.g. selected downloads).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::cache::Icon;
use crate::i18n::{item_text, Lang};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MenuItemStyle {
    Push,
    Check,
    Radio,
    Separator,
    Menu,
}

#[derive(Debug, Clone)]
pub enum Graphic {
    Icon(Rc<Icon>),
    /// Image id resolved through the session icon cache.
    Uri(String),
}

pub type FillListener<T> = Rc<dyn Fn(&PluginMenuItem<T>, &[T])>;
pub type MultiListener<T> = Rc<dyn Fn(&PluginMenuItem<T>, &[T])>;
pub type SubmenuBuilder<T> = Rc<dyn Fn(&PluginMenuItem<T>, &[T]) -> anyhow::Result<()>>;

struct ItemState<T> {
    resource_key: String,
    text: RefCell<String>,
    style: Cell<MenuItemStyle>,
    visible: Cell<bool>,
    enabled: Cell<bool>,
    data: Cell<Option<bool>>,
    graphic: RefCell<Option<Graphic>>,
    children: RefCell<Vec<PluginMenuItem<T>>>,
    fill_listeners: RefCell<Vec<FillListener<T>>>,
    multi_listeners: RefCell<Vec<MultiListener<T>>>,
    submenu_builder: RefCell<Option<SubmenuBuilder<T>>>,
}

pub struct PluginMenuItem<T>(Rc<ItemState<T>>);

impl<T> Clone for PluginMenuItem<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> fmt::Debug for PluginMenuItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginMenuItem")
            .field("resource_key", &self.0.resource_key)
            .field("style", &self.style())
            .field("children", &self.0.children.borrow().len())
            .finish()
    }
}

impl<T> PluginMenuItem<T> {
    pub fn new(resource_key: &str, text: impl Into<String>) -> Self {
        Self(Rc::new(ItemState {
            resource_key: resource_key.to_string(),
            text: RefCell::new(text.into()),
            style: Cell::new(MenuItemStyle::Push),
            visible: Cell::new(true),
            enabled: Cell::new(true),
            data: Cell::new(None),
            graphic: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            fill_listeners: RefCell::new(Vec::new()),
            multi_listeners: RefCell::new(Vec::new()),
            submenu_builder: RefCell::new(None),
        }))
    }

    pub fn resource_key(&self) -> &str {
        &self.0.resource_key
    }

    pub fn text(&self) -> String {
        self.0.text.borrow().clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.0.text.borrow_mut() = text.into();
    }

    pub fn style(&self) -> MenuItemStyle {
        self.0.style.get()
    }

    pub fn set_style(&self, style: MenuItemStyle) {
        self.0.style.set(style);
    }

    pub fn is_visible(&self) -> bool {
        self.0.visible.get()
    }

    pub fn set_visible(&self, visible: bool) {
        self.0.visible.set(visible);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.0.enabled.set(enabled);
    }

    /// Selection value of a check/radio item.
    pub fn data(&self) -> Option<bool> {
        self.0.data.get()
    }

    pub fn set_data(&self, value: Option<bool>) {
        self.0.data.set(value);
    }

    pub fn graphic(&self) -> Option<Graphic> {
        self.0.graphic.borrow().clone()
    }

    pub fn set_graphic(&self, graphic: Option<Graphic>) {
        *self.0.graphic.borrow_mut() = graphic;
    }

    pub fn items(&self) -> Vec<PluginMenuItem<T>> {
        self.0.children.borrow().clone()
    }

    pub fn add_child(&self, child: PluginMenuItem<T>) {
        self.0.children.borrow_mut().push(child);
    }

    pub fn remove_all_child_items(&self) {
        self.0.children.borrow_mut().clear();
    }

    pub fn add_fill_listener(&self, l: impl Fn(&PluginMenuItem<T>, &[T]) + 'static) {
        self.0.fill_listeners.borrow_mut().push(Rc::new(l));
    }

    pub fn add_multi_listener(&self, l: impl Fn(&PluginMenuItem<T>, &[T]) + 'static) {
        self.0.multi_listeners.borrow_mut().push(Rc::new(l));
    }

    pub fn set_submenu_builder(
        &self,
        b: impl Fn(&PluginMenuItem<T>, &[T]) -> anyhow::Result<()> + 'static,
    ) {
        *self.0.submenu_builder.borrow_mut() = Some(Rc::new(b));
    }

    pub fn submenu_builder(&self) -> Option<SubmenuBuilder<T>> {
        self.0.submenu_builder.borrow().clone()
    }

    /// Fill listeners, called just before the item is displayed.
    pub fn invoke_menu_will_be_shown_listeners(&self, targets: &[T]) {
        let listeners = self.0.fill_listeners.borrow().clone();
        for l in listeners {
            l(self, targets);
        }
    }

    /// Selection listeners, called once with every target.
    pub fn invoke_listeners_multi(&self, targets: &[T]) {
        let listeners = self.0.multi_listeners.borrow().clone();
        for l in listeners {
            l(self, targets);
        }
    }

    pub fn ptr_eq(&self, other: &PluginMenuItem<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Creates model items with localized text and keeps the top-level ones.
pub struct MenuManager<T> {
    lang: Lang,
    top_level: RefCell<Vec<PluginMenuItem<T>>>,
}

impl<T> MenuManager<T> {
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            top_level: RefCell::new(Vec::new()),
        }
    }

    /// New item under `parent`, or at top level. The parent becomes a `Menu` item.
    pub fn add_menu_item(&self, parent: Option<&PluginMenuItem<T>>, resource_key: &str) -> PluginMenuItem<T> {
        let item = PluginMenuItem::new(resource_key, item_text(self.lang, resource_key));
        match parent {
            Some(p) => {
                p.set_style(MenuItemStyle::Menu);
                p.add_child(item.clone());
            }
            None => self.top_level.borrow_mut().push(item.clone()),
        }
        item
    }

    pub fn add_separator(&self, parent: Option<&PluginMenuItem<T>>) -> PluginMenuItem<T> {
        let sep = self.add_menu_item(parent, "sep");
        sep.set_style(MenuItemStyle::Separator);
        sep
    }

    pub fn items(&self) -> Vec<PluginMenuItem<T>> {
        self.top_level.borrow().clone()
    }

    pub fn remove_item(&self, item: &PluginMenuItem<T>) {
        self.top_level.borrow_mut().retain(|i| !i.ptr_eq(item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_resolves_text_and_nests_items() {
        let mm: MenuManager<u32> = MenuManager::new(Lang::En);
        let tags = mm.add_menu_item(None, "label.tags");
        let literal = mm.add_menu_item(Some(&tags), "!linux-isos!");
        mm.add_separator(Some(&tags));

        assert_eq!(tags.text(), "Tags");
        assert_eq!(tags.style(), MenuItemStyle::Menu);
        assert_eq!(literal.text(), "linux-isos");
        assert_eq!(tags.items().len(), 2);
        assert_eq!(mm.items().len(), 1);

        mm.remove_item(&tags);
        assert!(mm.items().is_empty());
    }

    #[test]
    fn listeners_receive_targets() {
        let item: PluginMenuItem<u32> = PluginMenuItem::new("x", "X");
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        item.add_fill_listener(move |i, targets| {
            i.set_enabled(!targets.is_empty());
            s.borrow_mut().push(("fill", targets.len()));
        });
        let s = seen.clone();
        item.add_multi_listener(move |_, targets| s.borrow_mut().push(("select", targets.iter().sum::<u32>() as usize)));

        item.invoke_menu_will_be_shown_listeners(&[]);
        assert!(!item.is_enabled());
        item.invoke_menu_will_be_shown_listeners(&[1, 2]);
        assert!(item.is_enabled());
        item.invoke_listeners_multi(&[1, 2]);

        assert_eq!(*seen.borrow(), vec![("fill", 0), ("fill", 2), ("select", 3)]);
    }
}
