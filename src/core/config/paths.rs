use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub log_dir: PathBuf,
    pub config_path: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        Self::from_root(project_root)
    }

    /// Resolves every path relative to `project_root`, honoring the
    /// `SEGES_CONFIG_PATH` / `SEGES_SECRETS_PATH` / `SEGES_LOG_DIR` overrides.
    pub fn from_root(project_root: PathBuf) -> Self {
        let log_dir = env::var("SEGES_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("logs"));
        let config_path = env::var("SEGES_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("config.yml"));
        let secrets_path = env::var("SEGES_SECRETS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("secrets.yaml"));

        let _ = fs::create_dir_all(&log_dir);

        AppPaths {
            project_root,
            log_dir,
            config_path,
            secrets_path,
        }
    }

    /// Resolves a path from the config file: absolute paths pass through,
    /// relative ones are taken from the project root.
    pub fn resolve(&self, raw: &Path) -> PathBuf {
        if raw.is_absolute() {
            return raw.to_path_buf();
        }
        self.project_root.join(raw)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("SEGES_ROOT") {
        return PathBuf::from(root);
    }

    let cwd = env::current_dir().ok();
    if let Some(dir) = cwd.as_ref() {
        if dir.join("config.yml").exists() {
            return dir.clone();
        }
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        return manifest_dir;
    }

    cwd.unwrap_or(manifest_dir)
}
