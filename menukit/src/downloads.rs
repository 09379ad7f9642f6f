//! Context menu for a selection of downloads.
//!
//! The menu only reads state through [`DownloadManager`] to decide what is enabled or
//! checked; every action is reported as a [`DownloadCommand`] for the caller to carry out.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::MenuError;
use crate::hierarchy::{split_long_menu_list_into_hierarchy, HierarchyNode};
use crate::i18n::{t, K};
use crate::lazy::add_maintenance_listener;
use crate::model::PluginMenuItem;
use crate::plugin::{add_plugin_menu_items, TargetMenuController};
use crate::session::UiSession;
use crate::widget::{add_separator, ItemStyle, Menu, MenuEvent, MenuItem};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(pub u64);

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only view of download state.
pub trait DownloadManager {
    fn is_stopped(&self, id: DownloadId) -> bool;
    fn can_start(&self, id: DownloadId) -> bool;
    fn is_complete(&self, id: DownloadId) -> bool;
    fn category(&self, id: DownloadId) -> Option<String>;
    fn tags(&self, id: DownloadId) -> Vec<String>;

    /// Every category a download can be put in.
    fn categories(&self) -> Vec<String>;
    fn known_tags(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DownloadCommand {
    Start(Vec<DownloadId>),
    Stop(Vec<DownloadId>),
    MoveData(Vec<DownloadId>),
    SetCategory {
        ids: Vec<DownloadId>,
        category: Option<String>,
    },
    AddTag {
        ids: Vec<DownloadId>,
        tag: String,
    },
    RemoveTag {
        ids: Vec<DownloadId>,
        tag: String,
    },
}

pub type CommandSink = Rc<dyn Fn(DownloadCommand)>;

/// Shared by the item listeners of one menu fill.
#[derive(Clone)]
struct FillContext {
    session: UiSession,
    manager: Rc<dyn DownloadManager>,
    selection: Rc<[DownloadId]>,
    commands: CommandSink,
}

impl FillContext {
    fn ids(&self) -> Vec<DownloadId> {
        self.selection.to_vec()
    }

    fn push_item(&self, menu: &Menu, key: K, enabled: bool, command: fn(Vec<DownloadId>) -> DownloadCommand) {
        let item = menu.add_item(ItemStyle::Push);
        item.set_text(t(self.session.lang(), key));
        item.set_enabled(enabled);
        let ctx = self.clone();
        item.add_selection_listener(Rc::new(move |_: &MenuItem| (ctx.commands)(command(ctx.ids()))));
    }

    fn cascade(&self, menu: &Menu, key: K, builder: fn(&FillContext, &Menu)) -> MenuItem {
        let item = menu.add_item(ItemStyle::Cascade);
        item.set_text(t(self.session.lang(), key));
        item.set_enabled(!self.selection.is_empty());

        let sub = Menu::new();
        item.set_menu(sub.clone());
        let ctx = self.clone();
        add_maintenance_listener(&self.session, &sub, move |menu: &Menu, _: &MenuEvent| -> anyhow::Result<()> {
            builder(&ctx, menu);
            Ok(())
        });
        item
    }
}

/// Fill `menu` with the actions for `selection`, followed by `plugin_items`.
///
/// A problem with a plugin item is returned after the whole menu is built.
pub fn fill_download_menu(
    session: &UiSession,
    menu: &Menu,
    manager: Rc<dyn DownloadManager>,
    selection: &[DownloadId],
    plugin_items: &[PluginMenuItem<DownloadId>],
    commands: CommandSink,
) -> Result<(), MenuError> {
    let ctx = FillContext {
        session: session.clone(),
        manager,
        selection: selection.into(),
        commands,
    };

    let any_startable = selection.iter().any(|&id| ctx.manager.can_start(id));
    let any_running = selection.iter().any(|&id| !ctx.manager.is_stopped(id));
    let all_complete = !selection.is_empty() && selection.iter().all(|&id| ctx.manager.is_complete(id));

    ctx.push_item(menu, K::Start, any_startable, DownloadCommand::Start);
    ctx.push_item(menu, K::Stop, any_running, DownloadCommand::Stop);
    add_separator(menu);
    ctx.push_item(menu, K::MoveData, all_complete, DownloadCommand::MoveData);
    add_separator(menu);
    ctx.cascade(menu, K::Category, fill_category_menu);
    ctx.cascade(menu, K::Tags, fill_tags_menu);

    if plugin_items.is_empty() {
        return Ok(());
    }

    add_separator(menu);
    add_plugin_menu_items(
        session,
        plugin_items,
        menu,
        true,
        !selection.is_empty(),
        Rc::new(TargetMenuController::new(ctx.selection.clone())),
    )
}

/// Add `labels` to `menu`, splitting them into sub-menus when there are too many.
fn add_split_items(session: &UiSession, menu: &Menu, mut labels: Vec<String>, add: &dyn Fn(&Menu, &str)) {
    for node in split_long_menu_list_into_hierarchy(&mut labels, session.split_after()) {
        match node {
            HierarchyNode::Entry(label) => add(menu, &label),
            HierarchyNode::Group { label, entries } => {
                let cascade = menu.add_item(ItemStyle::Cascade);
                cascade.set_text(label);
                let sub = Menu::new();
                cascade.set_menu(sub.clone());
                for entry in &entries {
                    add(&sub, entry);
                }
            }
        }
    }
}

fn fill_category_menu(ctx: &FillContext, menu: &Menu) {
    let lang = ctx.session.lang();
    let current: Vec<Option<String>> = ctx.selection.iter().map(|&id| ctx.manager.category(id)).collect();
    let all_in = |c: Option<&str>| !current.is_empty() && current.iter().all(|x| x.as_deref() == c);

    let add_radio = |menu: &Menu, text: &str, category: Option<&str>| {
        let item = menu.add_item(ItemStyle::Radio);
        item.set_text(text);
        item.set_selection(all_in(category));
        let ctx = ctx.clone();
        let category = category.map(str::to_string);
        item.add_selection_listener(Rc::new(move |_: &MenuItem| {
            (ctx.commands)(DownloadCommand::SetCategory {
                ids: ctx.ids(),
                category: category.clone(),
            })
        }));
    };

    add_radio(menu, t(lang, K::None), None);

    let categories = ctx.manager.categories();
    if categories.is_empty() {
        return;
    }
    add_separator(menu);
    add_split_items(&ctx.session, menu, categories, &|m: &Menu, c: &str| add_radio(m, c, Some(c)));
}

fn fill_tags_menu(ctx: &FillContext, menu: &Menu) {
    let tags = ctx.manager.known_tags();
    if tags.is_empty() {
        let none = menu.add_item(ItemStyle::Push);
        none.set_text(t(ctx.session.lang(), K::None));
        none.set_enabled(false);
        return;
    }

    let per_download: Vec<Vec<String>> = ctx.selection.iter().map(|&id| ctx.manager.tags(id)).collect();

    let add_check = |menu: &Menu, tag: &str| {
        let item = menu.add_item(ItemStyle::Check);
        item.set_text(tag);
        item.set_selection(!per_download.is_empty() && per_download.iter().all(|t| t.iter().any(|x| x == tag)));
        let ctx = ctx.clone();
        let tag = tag.to_string();
        item.add_selection_listener(Rc::new(move |w: &MenuItem| {
            let ids = ctx.ids();
            let tag = tag.clone();
            let command = if w.selection() {
                DownloadCommand::AddTag { ids, tag }
            } else {
                DownloadCommand::RemoveTag { ids, tag }
            };
            (ctx.commands)(command)
        }));
    };

    add_split_items(&ctx.session, menu, tags, &add_check);
}
