//! Working root resolution.
//!
//! The working root anchors every local-tier path. It is resolved at most
//! once per [`WorkDirResolver`]; the hosting application builds one
//! resolver at startup and shares it.
//!
//! Resolution order:
//! 1. The configured directory, when set to something other than `""` or
//!    `"."`. Missing directories are created. A path that exists but is
//!    not a directory is logged and skipped.
//! 2. On macOS, `~/.stash` when the process was started outside the home
//!    directory (app bundles start in `/`).
//! 3. The current directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{error, info};

/// Hidden directory under the user's home used as the macOS default root.
pub const MACOS_HOME_SUBDIR: &str = ".stash";

/// Platform families that resolve the default root differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Other,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }
}

/// Process facts the resolver depends on.
#[derive(Debug, Clone)]
pub struct HostEnv {
    pub platform: Platform,
    pub home_dir: Option<PathBuf>,
    pub current_dir: PathBuf,
}

impl HostEnv {
    /// Capture the running process's platform, home and current directory.
    pub fn detect() -> Self {
        Self {
            platform: Platform::current(),
            home_dir: directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()),
            current_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// Resolves and caches the working root.
#[derive(Debug)]
pub struct WorkDirResolver {
    configured: Option<PathBuf>,
    host: HostEnv,
    root: OnceLock<PathBuf>,
}

impl WorkDirResolver {
    pub fn new(configured: Option<PathBuf>, host: HostEnv) -> Self {
        Self {
            configured,
            host,
            root: OnceLock::new(),
        }
    }

    /// Resolver for the running process.
    pub fn from_host(configured: Option<PathBuf>) -> Self {
        Self::new(configured, HostEnv::detect())
    }

    /// Resolver whose root is already known. Nothing is evaluated or created.
    pub fn fixed(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let resolver = Self::new(Some(root.clone()), HostEnv::detect());
        let _ = resolver.root.set(root);
        resolver
    }

    /// The working root. Computed on first call, cached afterwards.
    pub fn resolve(&self) -> &Path {
        self.root.get_or_init(|| {
            let root = self
                .configured_dir()
                .unwrap_or_else(|| self.platform_default());
            info!("Using workdir: {}", root.display());
            root
        })
    }

    /// `{root}/{sub}`.
    pub fn join(&self, sub: impl AsRef<Path>) -> PathBuf {
        self.resolve().join(sub)
    }

    /// Whether [`resolve`](Self::resolve) has run.
    pub fn is_resolved(&self) -> bool {
        self.root.get().is_some()
    }

    fn configured_dir(&self) -> Option<PathBuf> {
        let configured = self.configured.as_deref()?;
        if configured.as_os_str().is_empty() || configured == Path::new(".") {
            return None;
        }

        let dir = if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.host.current_dir.join(configured)
        };

        if dir.exists() && !dir.is_dir() {
            error!("work_dir={} is not a directory", dir.display());
            return None;
        }

        if !dir.exists() {
            info!("work_dir={} does not exist, creating", dir.display());
            if let Err(e) = fs::create_dir_all(&dir) {
                error!("failed to create work_dir={}: {}", dir.display(), e);
                return None;
            }
        }

        Some(dir)
    }

    fn platform_default(&self) -> PathBuf {
        let current = &self.host.current_dir;
        info!(
            "platform: {:?} current_dir: {}",
            self.host.platform,
            current.display()
        );

        match (self.host.platform, self.host.home_dir.as_deref()) {
            (Platform::MacOs, Some(home)) if !current.starts_with(home) => {
                home.join(MACOS_HOME_SUBDIR)
            }
            _ => current.clone(),
        }
    }
}
