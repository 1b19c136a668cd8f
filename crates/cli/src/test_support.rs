use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Variables `Config::load` reads besides `HOME`.
pub(crate) const COACH_ENV_KEYS: [&str; 3] = [
    "GEMINI_API_KEY",
    "GOOGLE_API_KEY",
    "CHANCE_CHAMPIONS_BASE_URL",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Exclusive access to the process environment and working directory.
///
/// Starts with every coach variable unset. Variables touched through the
/// sandbox and the working directory are restored on drop.
pub(crate) struct EnvSandbox {
    saved: Vec<(&'static str, Option<OsString>)>,
    cwd: Option<PathBuf>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvSandbox {
    pub(crate) fn acquire() -> Self {
        let guard = env_lock()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut sandbox = Self {
            saved: Vec::new(),
            cwd: None,
            _guard: guard,
        };
        for key in COACH_ENV_KEYS {
            sandbox.unset(key);
        }
        sandbox
    }

    fn remember(&mut self, key: &'static str) {
        if !self.saved.iter().any(|(saved, _)| *saved == key) {
            self.saved.push((key, std::env::var_os(key)));
        }
    }

    pub(crate) fn set(&mut self, key: &'static str, value: impl AsRef<std::ffi::OsStr>) {
        self.remember(key);
        // SAFETY: the sandbox holds the env lock.
        unsafe { std::env::set_var(key, value) };
    }

    pub(crate) fn unset(&mut self, key: &'static str) {
        self.remember(key);
        // SAFETY: the sandbox holds the env lock.
        unsafe { std::env::remove_var(key) };
    }

    pub(crate) fn chdir(&mut self, dir: &Path) {
        if self.cwd.is_none() {
            self.cwd = std::env::current_dir().ok();
        }
        std::env::set_current_dir(dir).expect("chdir");
    }
}

impl Drop for EnvSandbox {
    fn drop(&mut self) {
        if let Some(cwd) = self.cwd.take() {
            let _ = std::env::set_current_dir(cwd);
        }
        for (key, value) in self.saved.drain(..).rev() {
            // SAFETY: the lock guard is released only after this body.
            unsafe {
                match value {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_restores_home_and_cwd() {
        let (home, cwd) = {
            let _env = EnvSandbox::acquire();
            (std::env::var_os("HOME"), std::env::current_dir().ok())
        };
        let tmp = tempfile::tempdir().expect("tempdir");
        {
            let mut env = EnvSandbox::acquire();
            env.set("HOME", tmp.path());
            env.set("HOME", "/elsewhere");
            env.set("GEMINI_API_KEY", "AIza-test");
            env.chdir(tmp.path());
        }
        let _env = EnvSandbox::acquire();
        assert_eq!(std::env::var_os("HOME"), home);
        assert_eq!(std::env::current_dir().ok(), cwd);
        assert!(std::env::var_os("GEMINI_API_KEY").is_none());
    }
}
