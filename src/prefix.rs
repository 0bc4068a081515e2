use std::{
    collections::BTreeMap,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use hashbrown::HashSet;
use tracing::{debug, info, warn};

use crate::{
    format::{parse_document, DocumentFormat},
    ns::CORE_PREFIXES,
    utils::{FetchOutcome, Fetcher},
};

pub const PREFIX_URI_TEMPLATE: &str = "http://prefix.cc/{pfx}.file.ttl";

/// Known `prefix -> namespace` bindings, backed by a Turtle file and the
/// prefix.cc registry.
pub struct PrefixCache {
    path: Option<PathBuf>,
    template: String,
    names: BTreeMap<String, String>,
    not_found: HashSet<String>,
    fetcher: Arc<dyn Fetcher>,
}

impl PrefixCache {
    /// Loads the bindings persisted at `path`, if any, on top of
    /// [`CORE_PREFIXES`]. An unreadable file only leaves the core bindings.
    pub fn open(path: Option<PathBuf>, template: &str, fetcher: Arc<dyn Fetcher>) -> Self {
        let mut names: BTreeMap<String, String> = CORE_PREFIXES
            .iter()
            .map(|(p, ns)| (p.to_string(), ns.to_string()))
            .collect();
        if let Some(file) = path.as_deref().filter(|p| p.is_file()) {
            names.extend(read_prefix_file(file));
        }
        debug!(prefixes = names.len(), ?path, "opened prefix cache");

        Self {
            path,
            template: template.to_string(),
            names,
            not_found: HashSet::new(),
            fetcher,
        }
    }

    pub fn get<'a>(&'a self, prefix: &str) -> Option<&'a str> {
        self.names.get(prefix).map(|x| x.as_str())
    }

    /// All bindings, ordered by prefix.
    pub fn all_bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The namespace of `prefix`, asking the prefix registry on a miss.
    pub fn resolve(&mut self, prefix: &str) -> Option<String> {
        if let Some(ns) = self.get(prefix) {
            return Some(ns.to_string());
        }
        if prefix.is_empty() || self.not_found.contains(prefix) {
            return None;
        }

        self.fetch_prefix(prefix);
        self.get(prefix).map(|x| x.to_string())
    }

    fn fetch_prefix(&mut self, prefix: &str) {
        let url = self.template.replace("{pfx}", prefix);
        let resp = match self.fetcher.fetch(&url, "text/turtle") {
            FetchOutcome::Found(resp) => resp,
            FetchOutcome::NotFound => {
                debug!("no prefix {} at <{}>", prefix, url);
                self.not_found.insert(prefix.to_string());
                return;
            }
            FetchOutcome::Failed(reason) => {
                warn!("could not read <{}>: {}", url, reason);
                return;
            }
        };

        let document = match parse_document(&resp.body, DocumentFormat::Turtle, &url) {
            Ok(x) => x,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };

        let before = self.names.len();
        for (pfx, ns) in document.prefixes() {
            self.names.insert(pfx.to_string(), ns.to_string());
        }
        info!(
            "learned {} prefixes from <{}>",
            self.names.len() - before,
            url
        );

        if !self.names.contains_key(prefix) {
            self.not_found.insert(prefix.to_string());
        }
        self.persist();
    }

    /// Writes the bindings back to the prefix file. Failures are logged, the
    /// cache keeps working from memory.
    pub fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };

        debug!("saving prefixes to '{}'", path.display());
        if let Err(e) = write_prefix_file(path, &self.names) {
            warn!("could not save prefixes to '{}': {}", path.display(), e);
        }
    }
}

fn read_prefix_file(path: &Path) -> BTreeMap<String, String> {
    let data = match fs::read(path) {
        Ok(x) => x,
        Err(e) => {
            warn!("could not read '{}': {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    match parse_document(&data, DocumentFormat::Turtle, "prefixes.ttl") {
        Ok(doc) => doc
            .prefixes()
            .map(|(p, ns)| (p.to_string(), ns.to_string()))
            .collect(),
        Err(e) => {
            warn!("ignoring prefix file: {}", e);
            BTreeMap::new()
        }
    }
}

fn write_prefix_file(path: &Path, names: &BTreeMap<String, String>) -> std::io::Result<()> {
    let mut out = String::new();
    for (pfx, ns) in names {
        let _ = writeln!(out, "@prefix {}: <{}> .", pfx, ns);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::StaticFetcher;

    const FOAF: &str = "http://xmlns.com/foaf/0.1/";

    fn fetcher() -> Arc<StaticFetcher> {
        Arc::new(StaticFetcher::default().with(
            "http://prefix.cc/foaf.file.ttl",
            Some("text/turtle"),
            "@prefix foaf: <http://xmlns.com/foaf/0.1/>.\n",
        ))
    }

    #[test]
    fn resolve_remote_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefixes.ttl");
        let remote = fetcher();

        let mut cache = PrefixCache::open(Some(path.clone()), PREFIX_URI_TEMPLATE, remote.clone());
        assert_eq!(cache.get("foaf"), None);
        assert_eq!(cache.resolve("foaf").as_deref(), Some(FOAF));
        assert_eq!(remote.request_count(), 1);
        assert!(path.is_file());

        // Hits stay local.
        assert_eq!(cache.resolve("foaf").as_deref(), Some(FOAF));
        assert_eq!(remote.request_count(), 1);

        let offline = Arc::new(StaticFetcher::default());
        let mut reopened = PrefixCache::open(Some(path), PREFIX_URI_TEMPLATE, offline.clone());
        assert_eq!(reopened.resolve("foaf").as_deref(), Some(FOAF));
        assert_eq!(offline.request_count(), 0);
    }

    #[test]
    fn not_found_is_a_silent_miss() {
        let remote = fetcher();
        let mut cache = PrefixCache::open(None, PREFIX_URI_TEMPLATE, remote.clone());

        assert_eq!(cache.resolve("nope"), None);
        assert_eq!(cache.resolve("nope"), None);
        assert_eq!(remote.request_count(), 1);
    }

    #[test]
    fn transient_failures_are_retried() {
        let remote = Arc::new(StaticFetcher::default().failing("http://prefix.cc/foaf.file.ttl"));
        let mut cache = PrefixCache::open(None, PREFIX_URI_TEMPLATE, remote.clone());

        assert_eq!(cache.resolve("foaf"), None);
        assert_eq!(cache.resolve("foaf"), None);
        assert_eq!(remote.request_count(), 2);
    }

    #[test]
    fn unparseable_registry_answer_is_a_miss() {
        let remote = Arc::new(StaticFetcher::default().with(
            "http://prefix.cc/foaf.file.ttl",
            Some("text/turtle"),
            "<html>not turtle",
        ));
        let mut cache = PrefixCache::open(None, PREFIX_URI_TEMPLATE, remote);
        assert_eq!(cache.resolve("foaf"), None);
    }

    #[test]
    fn bindings_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefixes.ttl");
        fs::write(
            &path,
            "@prefix foo: <http://example.org/foo#> .\n@prefix foaf: <http://xmlns.com/foaf/0.1/> .\n",
        )
        .unwrap();

        let cache = PrefixCache::open(Some(path), PREFIX_URI_TEMPLATE, Arc::new(StaticFetcher::default()));
        assert_eq!(
            cache.all_bindings().map(|(p, _)| p).collect::<Vec<_>>(),
            vec!["foaf", "foo", "rdf", "rdfs", "xml", "xsd"]
        );
        assert_eq!(cache.get("foo"), Some("http://example.org/foo#"));
    }

    #[test]
    fn corrupt_prefix_file_keeps_core_bindings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefixes.ttl");
        fs::write(&path, "@prefix broken").unwrap();

        let cache = PrefixCache::open(Some(path), PREFIX_URI_TEMPLATE, Arc::new(StaticFetcher::default()));
        assert_eq!(cache.len(), CORE_PREFIXES.len());
    }

    #[test]
    fn core_bindings_need_no_registry() {
        let remote = Arc::new(StaticFetcher::default());
        let mut cache = PrefixCache::open(None, PREFIX_URI_TEMPLATE, remote.clone());

        assert_eq!(
            cache.resolve("rdfs").as_deref(),
            Some("http://www.w3.org/2000/01/rdf-schema#")
        );
        assert_eq!(cache.resolve("xsd").as_deref(), Some("http://www.w3.org/2001/XMLSchema#"));
        assert_eq!(remote.request_count(), 0);
    }

    #[test]
    fn prefix_file_overrides_core_bindings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefixes.ttl");
        fs::write(&path, "@prefix rdf: <http://example.org/not-rdf#> .\n").unwrap();

        let cache = PrefixCache::open(Some(path), PREFIX_URI_TEMPLATE, Arc::new(StaticFetcher::default()));
        assert_eq!(cache.get("rdf"), Some("http://example.org/not-rdf#"));
        assert_eq!(cache.get("rdfs"), Some("http://www.w3.org/2000/01/rdf-schema#"));
    }

    #[test]
    fn unwritable_prefix_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be.
        let path = dir.path().join("prefixes.ttl");
        fs::create_dir(&path).unwrap();

        let mut cache = PrefixCache::open(Some(path), PREFIX_URI_TEMPLATE, fetcher());
        assert_eq!(cache.resolve("foaf").as_deref(), Some(FOAF));
    }
}
