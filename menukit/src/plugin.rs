use std::cell::RefCell;
use std::rc::Rc;

use crate::error::MenuError;
use crate::lazy::add_maintenance_listener;
use crate::model::{Graphic, MenuItemStyle, PluginMenuItem};
use crate::session::UiSession;
use crate::widget::{add_separator, ItemStyle, Menu, MenuEvent, MenuItem, SelectionListener};

/// Glue between plugin model items and the widgets built for them.
pub trait PluginMenuController<T> {
    /// Listener run when the widget built for `item` is selected.
    fn make_selection_listener(&self, item: &PluginMenuItem<T>) -> SelectionListener;

    /// Called just before `item` is projected.
    fn notify_fill_listeners(&self, item: &PluginMenuItem<T>);

    /// Called before the children of a `Menu` item are projected.
    fn build_submenu(&self, parent: &PluginMenuItem<T>);

    fn build_complete(&self, _menu: &Menu) {}
}

/// Controller that hands the same target list to every fill and selection listener.
pub struct TargetMenuController<T> {
    targets: Rc<[T]>,
    built: RefCell<Option<Menu>>,
}

impl<T> TargetMenuController<T> {
    pub fn new(targets: impl Into<Rc<[T]>>) -> Self {
        Self {
            targets: targets.into(),
            built: RefCell::new(None),
        }
    }

    pub fn targets(&self) -> &[T] {
        &self.targets
    }

    /// The menu most recently completed by this controller.
    pub fn last_built(&self) -> Option<Menu> {
        self.built.borrow().clone()
    }
}

impl<T: 'static> PluginMenuController<T> for TargetMenuController<T> {
    fn make_selection_listener(&self, item: &PluginMenuItem<T>) -> SelectionListener {
        let item = item.clone();
        let targets = self.targets.clone();
        Rc::new(move |_: &MenuItem| item.invoke_listeners_multi(&targets))
    }

    fn notify_fill_listeners(&self, item: &PluginMenuItem<T>) {
        item.invoke_menu_will_be_shown_listeners(&self.targets);
    }

    fn build_submenu(&self, parent: &PluginMenuItem<T>) {
        if let Some(builder) = parent.submenu_builder() {
            parent.remove_all_child_items();
            if let Err(e) = builder(parent, &self.targets) {
                log::warn!("submenu builder for {} failed: {e:?}", parent.resource_key());
            }
        }
    }

    fn build_complete(&self, menu: &Menu) {
        *self.built.borrow_mut() = Some(menu.clone());
    }
}

fn widget_style(style: MenuItemStyle) -> ItemStyle {
    match style {
        MenuItemStyle::Push => ItemStyle::Push,
        MenuItemStyle::Check => ItemStyle::Check,
        MenuItemStyle::Radio => ItemStyle::Radio,
        MenuItemStyle::Separator => ItemStyle::Separator,
        MenuItemStyle::Menu => ItemStyle::Cascade,
    }
}

/// Project plugin `items` into `parent`.
///
/// Invisible items are skipped, runs of separators collapse and a trailing separator is
/// dropped. `Menu` items get a sub-menu that is rebuilt from the model on every show. With
/// `enable_items == false` every generated item is disabled.
///
/// All items are projected even when one is misconfigured; the first such problem is
/// returned afterwards.
pub fn add_plugin_menu_items<T: 'static>(
    session: &UiSession,
    items: &[PluginMenuItem<T>],
    parent: &Menu,
    mut prev_was_separator: bool,
    enable_items: bool,
    controller: Rc<dyn PluginMenuController<T>>,
) -> Result<(), MenuError> {
    let mut first_error = None;

    for (i, model) in items.iter().enumerate() {
        controller.notify_fill_listeners(model);
        if !model.is_visible() {
            continue;
        }

        let style = model.style();
        let is_separator = style == MenuItemStyle::Separator;

        if prev_was_separator && is_separator {
            continue;
        }
        if is_separator && i == items.len() - 1 {
            continue;
        }
        prev_was_separator = is_separator;

        if is_separator {
            add_separator(parent);
            continue;
        }

        let widget = parent.add_item(widget_style(style));
        let is_toggle = matches!(style, MenuItemStyle::Check | MenuItemStyle::Radio);

        if enable_items && is_toggle {
            match model.data() {
                Some(selected) => widget.set_selection(selected),
                None => {
                    first_error.get_or_insert_with(|| {
                        MenuError::MissingSelectionValue(model.resource_key().to_string())
                    });
                }
            }
        }

        let main_listener = controller.make_selection_listener(model);
        let write_back = model.clone();
        widget.add_selection_listener(Rc::new(move |w: &MenuItem| {
            if matches!(write_back.style(), MenuItemStyle::Check | MenuItemStyle::Radio)
                && !w.is_disposed()
            {
                write_back.set_data(Some(w.selection()));
            }
            main_listener(w);
        }));

        if style == MenuItemStyle::Menu {
            let submenu = Menu::new();
            widget.set_menu(submenu.clone());

            let sub_session = session.clone();
            let sub_model = model.clone();
            let sub_controller = controller.clone();
            add_maintenance_listener(session, &submenu, move |menu: &Menu, _: &MenuEvent| -> anyhow::Result<()> {
                sub_controller.build_submenu(&sub_model);
                add_plugin_menu_items(
                    &sub_session,
                    &sub_model.items(),
                    menu,
                    false,
                    enable_items,
                    sub_controller.clone(),
                )?;
                Ok(())
            });
        }

        widget.set_text(model.text());

        match model.graphic() {
            Some(Graphic::Icon(icon)) => widget.set_image(Some(icon)),
            Some(Graphic::Uri(id)) => widget.set_image(session.icon(&id)),
            None => {}
        }

        widget.set_enabled(enable_items && model.is_enabled());
    }

    controller.build_complete(parent);

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
