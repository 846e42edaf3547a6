use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Platform side effects that follow a sync action. Fire-and-forget: nothing
/// reported here changes the outcome of the action.
pub trait ExternalNotifier {
    /// Ask the shell to redraw icon overlays. Called once per mutating batch.
    fn refresh(&self);

    /// Reveal `path` in the native file manager.
    fn open_and_select(&self, path: &Path);
}

/// Spawns the platform's own tools.
pub struct ShellNotifier;

impl ExternalNotifier for ShellNotifier {
    #[cfg(target_os = "windows")]
    fn refresh(&self) {
        spawn_detached("ie4uinit.exe", [OsStr::new("-show")]);
    }

    #[cfg(not(target_os = "windows"))]
    fn refresh(&self) {
        debug!("No icon cache to refresh on this platform");
    }

    #[cfg(target_os = "windows")]
    fn open_and_select(&self, path: &Path) {
        let mut select = std::ffi::OsString::from("/select,");
        select.push(path.as_os_str());
        spawn_detached("explorer", [select.as_os_str()]);
    }

    #[cfg(target_os = "macos")]
    fn open_and_select(&self, path: &Path) {
        spawn_detached("open", [OsStr::new("-R"), path.as_os_str()]);
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    fn open_and_select(&self, path: &Path) {
        let folder = path.parent().unwrap_or(path);
        spawn_detached("xdg-open", [folder.as_os_str()]);
    }
}

fn spawn_detached<'a, I>(program: &str, args: I)
where
    I: IntoIterator<Item = &'a OsStr>,
{
    match Command::new(program).args(args).spawn() {
        Ok(child) => debug!("Spawned {} (pid {})", program, child.id()),
        Err(e) => warn!("Failed to run {}: {}", program, e),
    }
}

/// No-op notifier for headless use.
pub struct SilentNotifier;

impl ExternalNotifier for SilentNotifier {
    fn refresh(&self) {}

    fn open_and_select(&self, _path: &Path) {}
}
