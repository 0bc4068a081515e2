use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::debug;

use crate::prefix::PREFIX_URI_TEMPLATE;

/// Overrides the base directory lookup.
pub const CACHE_DIR_ENV: &str = "RDF_VOCAB_CACHE";

/// Tried in order after [`CACHE_DIR_ENV`], `~` is the home directory.
pub const FALLBACK_DIRS: &[&str] = &[
    "~/rdf-vocab-cache",
    "~/Documents/rdf-vocab-cache",
    "/usr/local/share/rdf-vocab-cache/",
];

const PREFIX_FILE: &str = "prefixes.ttl";

#[derive(Debug, Clone)]
pub struct Config {
    /// Holds the prefix file and the vocabulary cache. Nothing is persisted
    /// without it.
    pub base_dir: Option<PathBuf>,
    pub prefix_template: String,
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: None,
            prefix_template: PREFIX_URI_TEMPLATE.to_string(),
            fetch_timeout: Duration::from_secs(10),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let env = std::env::var(CACHE_DIR_ENV).ok();
        Self {
            base_dir: find_base_dir(env.as_deref(), FALLBACK_DIRS),
            ..Self::default()
        }
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn prefix_file(&self) -> Option<PathBuf> {
        self.base_dir.as_ref().map(|dir| dir.join(PREFIX_FILE))
    }

    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.base_dir.clone()
    }
}

/// The first existing directory among `env` and `fallbacks`.
pub fn find_base_dir(env: Option<&str>, fallbacks: &[&str]) -> Option<PathBuf> {
    let found = env
        .into_iter()
        .chain(fallbacks.iter().copied())
        .filter(|x| !x.is_empty())
        .map(expand_home)
        .find(|x| x.is_dir());
    debug!(?found, "vocabulary cache directory");
    found
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches('/')),
        _ => Path::new(path).to_path_buf(),
    }
}
