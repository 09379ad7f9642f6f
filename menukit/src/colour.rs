use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::i18n::item_text;
use crate::session::UiSession;
use crate::widget::{ItemStyle, Menu, MenuItem};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Colours offered by the picker and the one to preselect.
///
/// Existing colours missing from `custom` are put in front of it. A colour counts as a
/// duplicate each time it shows up while already offered; the one with most duplicates is
/// preselected, the earliest in `existing` on ties.
pub fn colour_dialog_seed(custom: &[Rgb], existing: &[Rgb]) -> (Vec<Rgb>, Option<Rgb>) {
    let mut offered = custom.to_vec();
    let mut dup_counts: Vec<(Rgb, u32)> = Vec::new();

    for &rgb in existing {
        if !offered.contains(&rgb) {
            offered.insert(0, rgb);
        } else if let Some(entry) = dup_counts.iter_mut().find(|(c, _)| *c == rgb) {
            entry.1 += 1;
        } else {
            dup_counts.push((rgb, 1));
        }
    }

    let mut best: Option<(Rgb, u32)> = None;
    for &(rgb, count) in &dup_counts {
        if best.map_or(true, |(_, max)| count > max) {
            best = Some((rgb, count));
        }
    }

    (offered, best.map(|(rgb, _)| rgb))
}

pub type ColourReceiver = Rc<dyn Fn(Option<Rgb>)>;

/// Add a `label` cascade with "Set…" and "Clear" entries to `menu`.
///
/// "Set…" opens the platform colour picker and passes the chosen colour to `receiver`;
/// cancelling does nothing. "Clear" passes `None` and is only enabled with `can_clear`.
pub fn add_colour_chooser(
    session: &UiSession,
    menu: &Menu,
    label: &str,
    can_clear: bool,
    existing: Vec<Rgb>,
    receiver: ColourReceiver,
) -> MenuItem {
    let lang = session.lang();
    let cascade = menu.add_item(ItemStyle::Cascade);
    cascade.set_text(item_text(lang, label));

    let sel_menu = Menu::new();
    cascade.set_menu(sel_menu.clone());

    let set_item = sel_menu.add_item(ItemStyle::Push);
    set_item.set_text(item_text(lang, "label.set"));
    {
        let session = session.clone();
        let receiver = receiver.clone();
        set_item.add_selection_listener(Rc::new(move |_: &MenuItem| {
            let (offered, preselect) = colour_dialog_seed(&session.custom_colours(), &existing);
            let chosen = session.capabilities().pick_colour(preselect, &offered);
            session.set_custom_colours(offered);
            match chosen {
                Some(rgb) => receiver(Some(rgb)),
                None => log::debug!("colour picker cancelled or unavailable"),
            }
        }));
    }

    let clear_item = sel_menu.add_item(ItemStyle::Push);
    clear_item.set_text(item_text(lang, "Button.clear"));
    clear_item.add_selection_listener(Rc::new(move |_: &MenuItem| receiver(None)));
    clear_item.set_enabled(can_clear);

    cascade
}
