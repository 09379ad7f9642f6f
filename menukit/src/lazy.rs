//! Menus that are rebuilt every time they are shown.
//!
//! The builder runs on each "about to show" signal, after the previous items are disposed,
//! so the menu always reflects current state. When the menu is hidden its items are
//! disposed on the next executor iteration; doing it inline would destroy the item before
//! the toolkit delivers the selection that caused the hide.

use std::cell::Cell;
use std::rc::Rc;

use crate::session::UiSession;
use crate::widget::{ItemStyle, Menu, MenuEvent, MenuListener};

pub trait MenuBuilder {
    fn build_menu(&self, menu: &Menu, event: &MenuEvent) -> anyhow::Result<()>;
}

impl<F> MenuBuilder for F
where
    F: Fn(&Menu, &MenuEvent) -> anyhow::Result<()>,
{
    fn build_menu(&self, menu: &Menu, event: &MenuEvent) -> anyhow::Result<()> {
        self(menu, event)
    }
}

struct MaintenanceListener<B> {
    session: UiSession,
    builder: B,
    always_built: bool,
    shown: Rc<Cell<bool>>,
}

impl<B: MenuBuilder> MenuListener for MaintenanceListener<B> {
    fn menu_shown(&self, menu: &Menu, event: &MenuEvent) {
        menu.dispose_items();
        self.shown.set(true);

        if let Err(e) = self.builder.build_menu(menu, event) {
            log::warn!("menu builder failed, showing partial menu: {e:?}");
        }

        if self.session.platform().needs_show_placeholder() && menu.item_count() == 0 {
            menu.add_item(ItemStyle::Separator);
        }
    }

    fn menu_hidden(&self, menu: &Menu, _event: &MenuEvent) {
        self.shown.set(false);

        if self.session.platform().hide_is_unreliable() || self.always_built {
            return;
        }

        let menu = menu.clone();
        let shown = self.shown.clone();
        let placeholder = self.session.platform().needs_show_placeholder();
        self.session.executor().async_exec(move || {
            if shown.get() || menu.is_disposed() {
                return;
            }
            menu.dispose_items();
            if placeholder {
                menu.add_item(ItemStyle::Separator);
            }
        });
    }
}

pub fn add_maintenance_listener(session: &UiSession, menu: &Menu, builder: impl MenuBuilder + 'static) {
    add_maintenance_listener_with(session, menu, builder, false);
}

/// Attach `builder` to `menu`. With `always_built` the menu is filled right away and never
/// torn down on hide.
pub fn add_maintenance_listener_with(
    session: &UiSession,
    menu: &Menu,
    builder: impl MenuBuilder + 'static,
    always_built: bool,
) {
    let listener = Rc::new(MaintenanceListener {
        session: session.clone(),
        builder,
        always_built,
        shown: Rc::new(Cell::new(false)),
    });
    menu.add_menu_listener(listener.clone());

    if always_built {
        listener.menu_shown(menu, &MenuEvent::synthetic_shown());
    } else if session.platform().needs_show_placeholder() {
        menu.add_item(ItemStyle::Separator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Platform;
    use crate::testing::test_session;

    fn counting_builder(count: Rc<Cell<usize>>) -> impl MenuBuilder {
        move |menu: &Menu, _: &MenuEvent| -> anyhow::Result<()> {
            count.set(count.get() + 1);
            for i in 0..count.get() {
                menu.add_item(ItemStyle::Push).set_text(format!("item {i}"));
            }
            Ok(())
        }
    }

    #[test]
    fn rebuilds_on_every_show() {
        let session = test_session(Platform::Windows);
        let menu = Menu::new();
        let builds = Rc::new(Cell::new(0));
        add_maintenance_listener(&session, &menu, counting_builder(builds.clone()));
        assert_eq!(menu.item_count(), 0);

        menu.notify_shown();
        assert_eq!(menu.item_count(), 1);
        menu.notify_shown();
        assert_eq!(menu.item_count(), 2);
        assert_eq!(builds.get(), 2);
    }

    #[test]
    fn hide_disposes_on_next_iteration() {
        let session = test_session(Platform::Windows);
        let menu = Menu::new();
        add_maintenance_listener(&session, &menu, counting_builder(Rc::new(Cell::new(0))));

        menu.notify_shown();
        let item = menu.item(0).unwrap();
        menu.notify_hidden();
        assert_eq!(menu.item_count(), 1);
        assert!(!item.is_disposed());

        session.executor().run_pending();
        assert_eq!(menu.item_count(), 0);
        assert!(item.is_disposed());
    }

    #[test]
    fn reshow_before_dispose_runs_keeps_items() {
        let session = test_session(Platform::Windows);
        let menu = Menu::new();
        add_maintenance_listener(&session, &menu, counting_builder(Rc::new(Cell::new(0))));

        menu.notify_shown();
        menu.notify_hidden();
        menu.notify_shown();
        session.executor().run_pending();
        assert_eq!(menu.item_count(), 2);
    }

    #[test]
    fn disposed_menu_makes_pending_cleanup_a_no_op() {
        let session = test_session(Platform::Windows);
        let menu = Menu::new();
        add_maintenance_listener(&session, &menu, counting_builder(Rc::new(Cell::new(0))));

        menu.notify_shown();
        menu.notify_hidden();
        menu.dispose();
        assert_eq!(session.executor().run_pending(), 1);
        assert_eq!(menu.item_count(), 0);
    }

    #[test]
    fn macos_keeps_items_after_hide() {
        let session = test_session(Platform::MacOs);
        let menu = Menu::new();
        add_maintenance_listener(&session, &menu, counting_builder(Rc::new(Cell::new(0))));

        menu.notify_shown();
        menu.notify_hidden();
        assert!(!session.executor().has_pending());
        assert_eq!(menu.item_count(), 1);
    }

    #[test]
    fn linux_keeps_a_placeholder_so_show_fires() {
        let session = test_session(Platform::Linux);
        let menu = Menu::new();
        add_maintenance_listener(&session, &menu, |_: &Menu, _: &MenuEvent| -> anyhow::Result<()> { Ok(()) });

        assert_eq!(menu.item_count(), 1);
        assert_eq!(menu.item(0).unwrap().style(), ItemStyle::Separator);

        menu.notify_shown();
        assert_eq!(menu.item_count(), 1);

        menu.notify_hidden();
        session.executor().run_pending();
        assert_eq!(menu.item_count(), 1);
        assert_eq!(menu.item(0).unwrap().style(), ItemStyle::Separator);
    }

    #[test]
    fn always_built_fills_immediately_and_survives_hide() {
        let session = test_session(Platform::Windows);
        let menu = Menu::new();
        let builds = Rc::new(Cell::new(0));
        add_maintenance_listener_with(&session, &menu, counting_builder(builds.clone()), true);

        assert_eq!(builds.get(), 1);
        assert_eq!(menu.item_count(), 1);

        menu.notify_hidden();
        session.executor().run_pending();
        assert_eq!(menu.item_count(), 1);
    }

    #[test]
    fn builder_errors_leave_partial_menu() {
        let session = test_session(Platform::Windows);
        let menu = Menu::new();
        add_maintenance_listener(&session, &menu, |menu: &Menu, _: &MenuEvent| -> anyhow::Result<()> {
            menu.add_item(ItemStyle::Push).set_text("before failure");
            anyhow::bail!("plugin exploded")
        });

        menu.notify_shown();
        assert_eq!(menu.item_count(), 1);
        assert_eq!(menu.item(0).unwrap().text(), "before failure");
    }
}
