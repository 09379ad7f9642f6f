use crate::config::{load_config, DownloadEntry, TrayConfig};
use crate::i18n::{resolve_lang, t, Lang, K};

use ksni::menu::{CheckmarkItem, StandardItem, SubMenu};
use ksni::{Status, ToolTip, Tray};

use menukit::downloads::{fill_download_menu, DownloadCommand, DownloadId, DownloadManager};
use menukit::model::PluginMenuItem;
use menukit::widget::item_at_path;
use menukit::{add_maintenance_listener, ItemStyle, Menu, MenuItem, SessionOptions, UiSession};

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

pub struct DownloadsTray {
    state: Arc<Mutex<TrayState>>,
    pixmap: Vec<ksni::Icon>,
}

pub struct TrayState {
    cfg: TrayConfig,
}

impl TrayState {
    fn lang(&self) -> Lang {
        resolve_lang(&self.cfg.language)
    }
}

/// Download state as seen by one menu build.
struct Snapshot {
    downloads: Vec<DownloadEntry>,
    categories: Vec<String>,
    tags: Vec<String>,
}

impl Snapshot {
    fn entry(&self, id: DownloadId) -> Option<&DownloadEntry> {
        self.downloads.iter().find(|d| d.id == id.0)
    }
}

impl DownloadManager for Snapshot {
    fn is_stopped(&self, id: DownloadId) -> bool {
        self.entry(id).map_or(true, |d| d.stopped)
    }

    fn can_start(&self, id: DownloadId) -> bool {
        self.entry(id).is_some_and(|d| d.stopped)
    }

    fn is_complete(&self, id: DownloadId) -> bool {
        self.entry(id).is_some_and(|d| d.complete)
    }

    fn category(&self, id: DownloadId) -> Option<String> {
        self.entry(id).and_then(|d| d.category.clone())
    }

    fn tags(&self, id: DownloadId) -> Vec<String> {
        self.entry(id).map(|d| d.tags.clone()).unwrap_or_default()
    }

    fn categories(&self) -> Vec<String> {
        self.categories.clone()
    }

    fn known_tags(&self) -> Vec<String> {
        self.tags.clone()
    }
}

/// A freshly built widget tree plus the commands its items emitted.
struct BuiltMenu {
    session: UiSession,
    root: Menu,
    commands: Rc<RefCell<Vec<DownloadCommand>>>,
}

fn build_menu(cfg: &TrayConfig) -> BuiltMenu {
    let session = UiSession::new(SessionOptions {
        platform: cfg.platform(),
        lang: resolve_lang(&cfg.language),
        split_after: cfg.split_after(),
        icon_dir: cfg.icon_dir.clone(),
        ..SessionOptions::default()
    });
    let lang = session.lang();

    let snapshot = Rc::new(Snapshot {
        downloads: cfg.downloads.clone(),
        categories: cfg.categories.clone(),
        tags: cfg.tags.clone(),
    });
    let commands = Rc::new(RefCell::new(Vec::new()));
    let root = Menu::new();

    if snapshot.downloads.is_empty() {
        let none = root.add_item(ItemStyle::Push);
        none.set_text(t(lang, K::NoDownloads));
        none.set_enabled(false);
    }

    let mut all_ids = Vec::with_capacity(snapshot.downloads.len());
    for d in &snapshot.downloads {
        let id = DownloadId(d.id);
        all_ids.push(id);
        let cascade = root.add_item(ItemStyle::Cascade);
        cascade.set_text(d.name.clone());
        cascade.set_image(session.file_icon(&d.name));
        add_download_submenu(&session, &cascade, snapshot.clone(), vec![id], commands.clone());
    }

    if all_ids.len() > 1 {
        menukit::add_separator(&root);
        let cascade = root.add_item(ItemStyle::Cascade);
        cascade.set_text(t(lang, K::AllDownloads));
        add_download_submenu(&session, &cascade, snapshot, all_ids, commands.clone());
    }

    BuiltMenu {
        session,
        root,
        commands,
    }
}

fn add_download_submenu(
    session: &UiSession,
    cascade: &MenuItem,
    snapshot: Rc<Snapshot>,
    selection: Vec<DownloadId>,
    commands: Rc<RefCell<Vec<DownloadCommand>>>,
) {
    let sub = Menu::new();
    cascade.set_menu(sub.clone());

    let fill_session = session.clone();
    add_maintenance_listener(session, &sub, move |menu: &Menu, _: &menukit::widget::MenuEvent| -> anyhow::Result<()> {
        let sink = commands.clone();
        let plugin_items: Vec<PluginMenuItem<DownloadId>> = Vec::new();
        fill_download_menu(
            &fill_session,
            menu,
            snapshot.clone(),
            &selection,
            &plugin_items,
            Rc::new(move |c: DownloadCommand| sink.borrow_mut().push(c)),
        )?;
        Ok(())
    });
}

/// PNG bytes for the host, empty when the item has no image.
fn icon_data(item: &MenuItem) -> Vec<u8> {
    let Some(icon) = item.image() else {
        return Vec::new();
    };
    icon.to_png().unwrap_or_else(|e| {
        log::warn!("menu icon for {:?}: {e:?}", item.text());
        Vec::new()
    })
}

/// Convert `menu` into tray items, showing every sub-menu so it gets built.
///
/// Activation closures carry the widget path of their item; separators the host would
/// render at the edges or twice in a row are dropped.
fn project(menu: &Menu, path: &mut Vec<usize>) -> Vec<ksni::menu::MenuItem<DownloadsTray>> {
    use ksni::menu::MenuItem as TrayItem;

    let mut out: Vec<TrayItem<DownloadsTray>> = Vec::new();
    for (idx, item) in menu.items().into_iter().enumerate() {
        path.push(idx);
        match item.style() {
            ItemStyle::Separator => {
                if !out.is_empty() && !matches!(out.last(), Some(TrayItem::Separator)) {
                    out.push(TrayItem::Separator);
                }
            }
            ItemStyle::Cascade => {
                let children = match item.menu() {
                    Some(sub) => {
                        sub.notify_shown();
                        project(&sub, path)
                    }
                    None => Vec::new(),
                };
                out.push(
                    SubMenu {
                        label: item.text(),
                        enabled: item.is_enabled(),
                        icon_data: icon_data(&item),
                        submenu: children,
                        ..Default::default()
                    }
                    .into(),
                );
            }
            ItemStyle::Check | ItemStyle::Radio => {
                let p = path.clone();
                out.push(
                    CheckmarkItem {
                        label: item.text(),
                        enabled: item.is_enabled(),
                        checked: item.selection(),
                        icon_data: icon_data(&item),
                        activate: Box::new(move |this: &mut DownloadsTray| this.activate_path(&p)),
                        ..Default::default()
                    }
                    .into(),
                );
            }
            ItemStyle::Push => {
                let p = path.clone();
                out.push(
                    StandardItem {
                        label: item.text(),
                        enabled: item.is_enabled(),
                        icon_data: icon_data(&item),
                        activate: Box::new(move |this: &mut DownloadsTray| this.activate_path(&p)),
                        ..Default::default()
                    }
                    .into(),
                );
            }
        }
        path.pop();
    }

    if matches!(out.last(), Some(TrayItem::Separator)) {
        out.pop();
    }
    out
}

pub fn apply_command(downloads: &mut [DownloadEntry], cmd: &DownloadCommand) {
    let targets = |ids: &[DownloadId], d: &DownloadEntry| ids.iter().any(|id| id.0 == d.id);

    match cmd {
        DownloadCommand::Start(ids) => {
            for d in downloads.iter_mut().filter(|d| targets(ids, d)) {
                d.stopped = false;
            }
        }
        DownloadCommand::Stop(ids) => {
            for d in downloads.iter_mut().filter(|d| targets(ids, d)) {
                d.stopped = true;
            }
        }
        DownloadCommand::MoveData(ids) => {
            log::info!("move data requested for {} download(s)", ids.len());
        }
        DownloadCommand::SetCategory { ids, category } => {
            for d in downloads.iter_mut().filter(|d| targets(ids, d)) {
                d.category = category.clone();
            }
        }
        DownloadCommand::AddTag { ids, tag } => {
            for d in downloads.iter_mut().filter(|d| targets(ids, d)) {
                if !d.tags.contains(tag) {
                    d.tags.push(tag.clone());
                }
            }
        }
        DownloadCommand::RemoveTag { ids, tag } => {
            for d in downloads.iter_mut().filter(|d| targets(ids, d)) {
                d.tags.retain(|x| x != tag);
            }
        }
    }
}

impl DownloadsTray {
    pub fn new(cfg: TrayConfig, pixmap: Vec<ksni::Icon>) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrayState { cfg })),
            pixmap,
        }
    }

    fn reload_config(&self) {
        match load_config() {
            Ok(cfg) => {
                if let Ok(mut st) = self.state.lock() {
                    st.cfg = cfg;
                }
            }
            Err(e) => log::warn!("failed to reload config: {e:?}"),
        }
    }

    /// Rebuild the menu the host is showing, replay the show path and select the item.
    fn activate_path(&mut self, path: &[usize]) {
        let Ok(mut st) = self.state.lock() else {
            return;
        };

        let built = build_menu(&st.cfg);
        match item_at_path(&built.root, path, true) {
            Ok(item) => item.select(),
            Err(e) => {
                log::warn!("menu changed under activation: {e}");
                return;
            }
        }
        built.session.executor().run_pending();

        let commands = std::mem::take(&mut *built.commands.borrow_mut());
        for cmd in &commands {
            log::debug!("applying {cmd:?}");
            apply_command(&mut st.cfg.downloads, cmd);
        }
    }
}

impl Tray for DownloadsTray {
    fn icon_name(&self) -> String {
        "folder-download".to_string()
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        self.pixmap.clone()
    }

    fn title(&self) -> String {
        "menukit".to_string()
    }

    fn id(&self) -> String {
        "menukit-tray".to_string()
    }

    fn status(&self) -> Status {
        Status::Active
    }

    fn tool_tip(&self) -> ToolTip {
        let Ok(st) = self.state.lock() else {
            return ToolTip::default();
        };
        let lang = st.lang();
        let total = st.cfg.downloads.len();
        let active = st.cfg.downloads.iter().filter(|d| !d.stopped).count();

        ToolTip {
            icon_name: self.icon_name(),
            title: t(lang, K::TooltipTitle).to_string(),
            description: format!("{active}/{total} {}", t(lang, K::TooltipActive)),
            ..Default::default()
        }
    }

    fn menu(&self) -> Vec<ksni::menu::MenuItem<Self>> {
        use ksni::menu::MenuItem as TrayItem;

        let (lang, mut items) = match self.state.lock() {
            Ok(st) => {
                let built = build_menu(&st.cfg);
                (st.lang(), project(&built.root, &mut Vec::new()))
            }
            Err(_) => (Lang::En, Vec::new()),
        };

        if !items.is_empty() {
            items.push(TrayItem::Separator);
        }
        items.push(
            StandardItem {
                label: t(lang, K::ReloadConfig).into(),
                activate: Box::new(|this: &mut Self| this.reload_config()),
                ..Default::default()
            }
            .into(),
        );
        items.push(
            StandardItem {
                label: t(lang, K::Quit).into(),
                activate: Box::new(|_: &mut Self| std::process::exit(0)),
                ..Default::default()
            }
            .into(),
        );
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ksni::menu::MenuItem as TrayItem;

    fn entry(id: u64, name: &str) -> DownloadEntry {
        DownloadEntry {
            id,
            name: name.to_string(),
            stopped: false,
            complete: false,
            category: None,
            tags: Vec::new(),
        }
    }

    fn config() -> TrayConfig {
        let mut a = entry(1, "debian.iso");
        a.complete = true;
        a.stopped = true;
        TrayConfig {
            language: "en".to_string(),
            platform: Some("windows".to_string()),
            categories: vec!["ISOs".into(), "TV".into()],
            tags: vec!["linux".into()],
            downloads: vec![a, entry(2, "show.mkv")],
            ..TrayConfig::default()
        }
    }

    fn labels(items: &[TrayItem<DownloadsTray>]) -> Vec<String> {
        items
            .iter()
            .map(|i| match i {
                TrayItem::Standard(s) => s.label.clone(),
                TrayItem::Checkmark(c) => c.label.clone(),
                TrayItem::SubMenu(s) => s.label.clone(),
                TrayItem::Separator => "-".to_string(),
                _ => "?".to_string(),
            })
            .collect()
    }

    fn submenu(items: &[TrayItem<DownloadsTray>], idx: usize) -> &[TrayItem<DownloadsTray>] {
        match &items[idx] {
            TrayItem::SubMenu(s) => &s.submenu,
            _ => panic!("item {idx} is not a sub-menu"),
        }
    }

    #[test]
    fn projects_one_cascade_per_download_plus_all() {
        let tray = DownloadsTray::new(config(), Vec::new());
        let items = tray.menu();
        assert_eq!(
            labels(&items),
            vec!["debian.iso", "show.mkv", "-", "All downloads", "-", "Reload config", "Quit"]
        );

        let debian = submenu(&items, 0);
        assert_eq!(labels(debian), vec!["Start", "Stop", "-", "Move data files…", "-", "Category", "Tags"]);
        assert_eq!(labels(submenu(debian, 5)), vec!["None", "-", "ISOs", "TV"]);
    }

    #[test]
    fn activation_replays_path_and_applies_commands() {
        let mut tray = DownloadsTray::new(config(), Vec::new());

        // debian.iso -> Start
        tray.activate_path(&[0, 0]);
        // show.mkv -> Category -> TV
        tray.activate_path(&[1, 5, 3]);
        // All downloads -> Tags -> linux
        tray.activate_path(&[3, 6, 0]);

        let st = tray.state.lock().unwrap();
        let d = &st.cfg.downloads;
        assert!(!d[0].stopped);
        assert_eq!(d[1].category.as_deref(), Some("TV"));
        assert_eq!(d[0].tags, vec!["linux".to_string()]);
        assert_eq!(d[1].tags, vec!["linux".to_string()]);
    }

    #[test]
    fn download_cascades_carry_file_icons() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::from_pixel(2, 2, image::Rgba([9, 8, 7, 255]))
            .save(dir.path().join("ext_iso.png"))
            .unwrap();
        let mut cfg = config();
        cfg.icon_dir = Some(dir.path().to_path_buf());

        let items = DownloadsTray::new(cfg, Vec::new()).menu();
        let icon = |idx: usize| match &items[idx] {
            TrayItem::SubMenu(s) => s.icon_data.clone(),
            _ => panic!("item {idx} is not a sub-menu"),
        };

        let png = icon(0);
        let decoded = menukit::cache::Icon::from_png_bytes(&png).unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 2));
        assert_eq!(&decoded.rgba[..4], &[9, 8, 7, 255]);
        assert!(icon(1).is_empty());
        assert!(icon(3).is_empty());
    }

    #[test]
    fn stale_path_is_ignored() {
        let mut tray = DownloadsTray::new(config(), Vec::new());
        tray.activate_path(&[9, 9]);
        tray.activate_path(&[]);
        let st = tray.state.lock().unwrap();
        assert_eq!(st.cfg.downloads, config().downloads);
    }

    #[test]
    fn empty_config_shows_placeholder() {
        let tray = DownloadsTray::new(TrayConfig::default(), Vec::new());
        let items = tray.menu();
        assert_eq!(labels(&items)[0], t(tray.state.lock().unwrap().lang(), K::NoDownloads));
    }

    #[test]
    fn tag_commands_do_not_duplicate() {
        let mut downloads = vec![entry(1, "a")];
        let add = DownloadCommand::AddTag {
            ids: vec![DownloadId(1)],
            tag: "x".into(),
        };
        apply_command(&mut downloads, &add);
        apply_command(&mut downloads, &add);
        assert_eq!(downloads[0].tags, vec!["x".to_string()]);

        apply_command(
            &mut downloads,
            &DownloadCommand::RemoveTag {
                ids: vec![DownloadId(1)],
                tag: "x".into(),
            },
        );
        assert!(downloads[0].tags.is_empty());
    }
}
