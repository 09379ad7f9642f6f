mod config;
mod i18n;
mod tray_app;

use std::fs::OpenOptions;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;

use menukit::cache::IconCache;
use menukit::capability::{platform_capabilities, Capabilities};

/// Tray pixmap from `<icon_dir>/tray.png`, or `tray-dark.png` under a dark theme when
/// present; empty means the themed icon name is used.
fn tray_pixmap(cfg: &config::TrayConfig, caps: &dyn Capabilities) -> Vec<ksni::Icon> {
    let mut icons = IconCache::new(cfg.icon_dir.clone());
    let dark = if caps.dark_mode() { icons.get("tray-dark") } else { None };
    match dark.or_else(|| icons.get("tray")) {
        Some(icon) => vec![ksni::Icon {
            width: icon.width as i32,
            height: icon.height as i32,
            data: icon.to_argb32(),
        }],
        None => Vec::new(),
    }
}

fn main() -> anyhow::Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init();

    // Single-instance guard: the tray has no window, a second copy only adds a second icon.
    let _instance_lock = {
        let dir = std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"));
        let lock_path = dir.join("menukit-ui-tray.lock");
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&lock_path)?;

        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc != 0 {
            log::info!("another tray instance holds {}", lock_path.display());
            return Ok(());
        }

        file
    };

    let cfg = match crate::config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("{e:#}, using defaults");
            crate::config::TrayConfig::default()
        }
    };

    let pixmap = tray_pixmap(&cfg, &*platform_capabilities());
    let tray = crate::tray_app::DownloadsTray::new(cfg, pixmap);
    let service = ksni::TrayService::new(tray);

    // Blocks until the tray is closed (or the process is killed).
    if let Err(e) = service.run() {
        log::error!("tray service exited with error: {e:?}");
    }

    Ok(())
}
