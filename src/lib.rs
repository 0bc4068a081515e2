use std::path::PathBuf;

pub mod config;
pub mod format;
#[cfg(feature = "bin")]
pub mod logging;
pub mod ns;
pub mod prefix;
pub mod scan;
pub mod store;
pub mod terms;
pub mod tool;
pub mod uri;
pub mod utils;
pub mod vocab;

pub use config::Config;
pub use prefix::PrefixCache;
pub use tool::{Candidate, CompletionTool};
pub use vocab::VocabCache;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse <{origin}> as {format}: {message}")]
    Parse {
        origin: String,
        format: format::DocumentFormat,
        message: String,
    },

    #[error("could not fetch <{url}>: {reason}")]
    Fetch {
        url: String,
        reason: utils::FetchFailure,
    },

    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
