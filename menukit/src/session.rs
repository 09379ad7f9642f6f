use std::cell::RefCell;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::rc::Rc;

use crate::cache::{Icon, IconCache};
use crate::capability::{platform_capabilities, Capabilities, Platform};
use crate::colour::Rgb;
use crate::executor::UiExecutor;
use crate::i18n::{t, Lang, K};
use crate::widget::MenuItem;

pub const DEFAULT_SPLIT_AFTER: usize = 20;

pub struct SessionOptions {
    pub platform: Platform,
    pub lang: Lang,
    /// Lists longer than this are split into sub-menus.
    pub split_after: NonZeroUsize,
    pub icon_dir: Option<PathBuf>,
    pub capabilities: Rc<dyn Capabilities>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            lang: Lang::En,
            split_after: NonZeroUsize::new(DEFAULT_SPLIT_AFTER).unwrap_or(NonZeroUsize::MIN),
            icon_dir: None,
            capabilities: platform_capabilities(),
        }
    }
}

struct SessionInner {
    executor: UiExecutor,
    platform: Platform,
    lang: Lang,
    split_after: NonZeroUsize,
    capabilities: Rc<dyn Capabilities>,
    icons: RefCell<IconCache>,
    custom_colours: RefCell<Vec<Rgb>>,
    pending: RefCell<HashSet<String>>,
}

/// Everything the menu code shares for one UI thread: executor, platform quirks,
/// capabilities, and the caches that would otherwise be process globals.
#[derive(Clone)]
pub struct UiSession(Rc<SessionInner>);

impl UiSession {
    pub fn new(opts: SessionOptions) -> Self {
        Self(Rc::new(SessionInner {
            executor: UiExecutor::new(),
            platform: opts.platform,
            lang: opts.lang,
            split_after: opts.split_after,
            capabilities: opts.capabilities,
            icons: RefCell::new(IconCache::new(opts.icon_dir)),
            custom_colours: RefCell::new(Vec::new()),
            pending: RefCell::new(HashSet::new()),
        }))
    }

    pub fn executor(&self) -> &UiExecutor {
        &self.0.executor
    }

    pub fn platform(&self) -> Platform {
        self.0.platform
    }

    pub fn lang(&self) -> Lang {
        self.0.lang
    }

    pub fn split_after(&self) -> NonZeroUsize {
        self.0.split_after
    }

    pub fn capabilities(&self) -> &dyn Capabilities {
        self.0.capabilities.as_ref()
    }

    pub fn icon(&self, id: &str) -> Option<Rc<Icon>> {
        self.0.icons.borrow_mut().get(id)
    }

    pub fn file_icon(&self, file_name: &str) -> Option<Rc<Icon>> {
        self.0
            .icons
            .borrow_mut()
            .icon_for_file(file_name, self.0.capabilities.as_ref())
    }

    pub fn with_icons<R>(&self, f: impl FnOnce(&mut IconCache) -> R) -> R {
        f(&mut self.0.icons.borrow_mut())
    }

    pub fn custom_colours(&self) -> Vec<Rgb> {
        self.0.custom_colours.borrow().clone()
    }

    pub fn set_custom_colours(&self, colours: Vec<Rgb>) {
        *self.0.custom_colours.borrow_mut() = colours;
    }

    pub fn mark_pending(&self, key: &str) {
        self.0.pending.borrow_mut().insert(key.to_string());
    }

    pub fn clear_pending(&self, key: &str) {
        self.0.pending.borrow_mut().remove(key);
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.0.pending.borrow().contains(key)
    }

    /// Disable `item` and suffix " (Pending)" while `key` has a request in flight.
    pub fn apply_pending_state(&self, item: &MenuItem, key: &str) {
        if self.is_pending(key) {
            item.set_enabled(false);
            item.set_text(format!("{} ({})", item.text(), t(self.lang(), K::Pending)));
        }
    }
}
