//! Lazily built, plugin-extensible context menus.
//!
//! Menus are regenerated every time they are about to be shown (see [`lazy`]), plugin
//! contributions are projected from a toolkit-independent model (see [`model`] and
//! [`plugin`]), and long flat lists are folded into a two-level hierarchy with range labels
//! (see [`hierarchy`]). Everything runs on one UI thread driven by [`executor::UiExecutor`].

pub mod cache;
pub mod capability;
pub mod colour;
pub mod downloads;
pub mod error;
pub mod executor;
pub mod hierarchy;
pub mod i18n;
pub mod lazy;
pub mod model;
pub mod natural;
pub mod plugin;
pub mod session;
pub mod watch;
pub mod widget;

pub use error::MenuError;
pub use hierarchy::{split_long_menu_list_into_hierarchy, HierarchyNode};
pub use lazy::{add_maintenance_listener, add_maintenance_listener_with, MenuBuilder};
pub use plugin::{add_plugin_menu_items, PluginMenuController, TargetMenuController};
pub use session::{SessionOptions, UiSession};
pub use widget::{add_separator, ItemStyle, Menu, MenuItem};

#[cfg(test)]
pub(crate) mod testing {
    use std::rc::Rc;

    use crate::capability::{NoCapabilities, Platform};
    use crate::i18n::Lang;
    use crate::session::{SessionOptions, UiSession};

    pub fn test_session(platform: Platform) -> UiSession {
        UiSession::new(SessionOptions {
            platform,
            lang: Lang::En,
            capabilities: Rc::new(NoCapabilities),
            ..SessionOptions::default()
        })
    }
}
