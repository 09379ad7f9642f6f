use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;

use crate::capability::Capabilities;

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Icon {
    pub fn from_png_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .context("decode png")?
            .into_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            width,
            height,
            rgba: img.into_raw(),
        })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read icon {}", path.display()))?;
        Self::from_png_bytes(&bytes).with_context(|| format!("icon {}", path.display()))
    }

    /// PNG encoding, for hosts that take menu icons as image files.
    pub fn to_png(&self) -> anyhow::Result<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
            .context("icon size does not match its pixel data")?;
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .context("encode png")?;
        Ok(bytes)
    }

    /// ARGB32, network byte order (StatusNotifierItem pixmaps).
    pub fn to_argb32(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .flat_map(|px| [px[3], px[0], px[1], px[2]])
            .collect()
    }
}

/// Session-owned image cache keyed by image id.
///
/// Images are looked up as `<dir>/<id>.png`. Misses are remembered so a broken or absent
/// icon costs one filesystem probe per session.
pub struct IconCache {
    dir: Option<PathBuf>,
    images: HashMap<String, Option<Rc<Icon>>>,
    by_extension: HashMap<String, Option<Rc<Icon>>>,
}

pub const GENERIC_FILE_ICON: &str = "file";

impl IconCache {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            images: HashMap::new(),
            by_extension: HashMap::new(),
        }
    }

    pub fn get(&mut self, id: &str) -> Option<Rc<Icon>> {
        if let Some(hit) = self.images.get(id) {
            return hit.clone();
        }

        let loaded = self.dir.as_ref().and_then(|dir| {
            let path = dir.join(format!("{id}.png"));
            if !path.exists() {
                log::debug!("icon {id}: no file at {}", path.display());
                return None;
            }
            match Icon::load(&path) {
                Ok(icon) => Some(Rc::new(icon)),
                Err(e) => {
                    log::warn!("icon {id}: {e:?}");
                    None
                }
            }
        });

        self.images.insert(id.to_string(), loaded.clone());
        loaded
    }

    /// Put an already-decoded image under `id`.
    pub fn insert(&mut self, id: &str, icon: Icon) -> Rc<Icon> {
        let icon = Rc::new(icon);
        self.images.insert(id.to_string(), Some(icon.clone()));
        icon
    }

    /// Icon for a file name: native icon for its extension, then `ext_<ext>`, then the
    /// generic file icon.
    pub fn icon_for_file(&mut self, file_name: &str, caps: &dyn Capabilities) -> Option<Rc<Icon>> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if let Some(hit) = self.by_extension.get(&ext) {
            return hit.clone();
        }

        let native_or_ext = if ext.is_empty() {
            None
        } else {
            caps.file_icon(&ext)
                .map(Rc::new)
                .or_else(|| self.get(&format!("ext_{ext}")))
        };
        let icon = native_or_ext.or_else(|| self.get(GENERIC_FILE_ICON));

        self.by_extension.insert(ext, icon.clone());
        icon
    }

    /// Drop one image (and any extension mapping pointing at it).
    pub fn release(&mut self, id: &str) {
        if let Some(Some(icon)) = self.images.remove(id) {
            self.by_extension
                .retain(|_, v| !v.as_ref().map_or(false, |i| Rc::ptr_eq(i, &icon)));
        }
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.by_extension.clear();
    }

    pub fn len(&self) -> usize {
        self.images.values().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::NoCapabilities;

    fn write_png(dir: &Path, name: &str, rgba: [u8; 4]) {
        let img = image::RgbaImage::from_pixel(2, 1, image::Rgba(rgba));
        img.save(dir.join(format!("{name}.png"))).unwrap();
    }

    struct TxtIcons;

    impl Capabilities for TxtIcons {
        fn file_icon(&self, extension: &str) -> Option<Icon> {
            (extension == "txt").then(|| Icon {
                width: 1,
                height: 1,
                rgba: vec![1, 2, 3, 4],
            })
        }
    }

    #[test]
    fn loads_and_caches_png() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "tray", [10, 20, 30, 255]);

        let mut cache = IconCache::new(Some(dir.path().to_path_buf()));
        let a = cache.get("tray").unwrap();
        assert_eq!((a.width, a.height), (2, 1));
        assert_eq!(&a.rgba[..4], &[10, 20, 30, 255]);

        std::fs::remove_file(dir.path().join("tray.png")).unwrap();
        let b = cache.get("tray").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_and_broken_icons_are_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

        let mut cache = IconCache::new(Some(dir.path().to_path_buf()));
        assert!(cache.get("absent").is_none());
        assert!(cache.get("broken").is_none());
        assert!(IconCache::new(None).get("tray").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn file_icons_prefer_native_then_extension_then_generic() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "ext_mkv", [1, 1, 1, 255]);
        write_png(dir.path(), GENERIC_FILE_ICON, [2, 2, 2, 255]);

        let mut cache = IconCache::new(Some(dir.path().to_path_buf()));
        let caps = TxtIcons;

        assert_eq!(cache.icon_for_file("notes.TXT", &caps).unwrap().rgba, vec![1, 2, 3, 4]);
        assert_eq!(cache.icon_for_file("movie.mkv", &caps).unwrap().rgba[0], 1);
        assert_eq!(cache.icon_for_file("archive.zip", &caps).unwrap().rgba[0], 2);
        assert_eq!(cache.icon_for_file("README", &NoCapabilities).unwrap().rgba[0], 2);

        cache.release(GENERIC_FILE_ICON);
        std::fs::remove_file(dir.path().join("file.png")).unwrap();
        assert!(cache.icon_for_file("archive.zip", &caps).is_none());
    }

    #[test]
    fn argb_conversion_moves_alpha_first() {
        let icon = Icon {
            width: 1,
            height: 1,
            rgba: vec![1, 2, 3, 4],
        };
        assert_eq!(icon.to_argb32(), vec![4, 1, 2, 3]);
    }

    #[test]
    fn png_encoding_decodes_to_the_same_pixels() {
        let icon = Icon {
            width: 2,
            height: 1,
            rgba: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        let png = icon.to_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(Icon::from_png_bytes(&png).unwrap(), icon);

        let short = Icon {
            width: 4,
            height: 4,
            rgba: vec![0; 4],
        };
        assert!(short.to_png().is_err());
    }
}
