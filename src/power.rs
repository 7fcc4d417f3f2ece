use std::process::{Child, Command, Stdio};

/// Keeps the display awake while held. Releases on drop.
///
/// On macOS this is a `caffeinate -d -w <pid>` child, which also exits on its
/// own if this process dies without dropping the guard.
pub struct SleepGuard {
    child: Child,
}

impl SleepGuard {
    /// `None` when the assertion could not be taken; callers carry on without
    /// it.
    pub fn acquire() -> Option<Self> {
        if !cfg!(target_os = "macos") {
            return None;
        }

        let spawned = Command::new("caffeinate")
            .arg("-d")
            .arg("-w")
            .arg(std::process::id().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                log::info!("display sleep prevention enabled");
                Some(Self { child })
            }
            Err(err) => {
                log::warn!("failed to start caffeinate: {err}");
                None
            }
        }
    }
}

impl Drop for SleepGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        log::info!("display sleep prevention released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_no_guard_off_macos() {
        assert!(SleepGuard::acquire().is_none());
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_guard_releases_on_drop() {
        let guard = SleepGuard::acquire().expect("caffeinate should be available");
        let pid = guard.child.id();
        drop(guard);

        let alive = Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);
        assert!(!alive);
    }
}
