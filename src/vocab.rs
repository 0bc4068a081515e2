use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use hashbrown::HashMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, info, warn};

use crate::{
    format::{DocumentFormat, DocumentParser, FormatMap, RdfDocumentParser, ACCEPT},
    ns::VocabSources,
    store::{AggregateStore, Document},
    utils::Fetcher,
    Error, Result,
};

/// Everything but `A-Za-z0-9-_.~` is encoded in cache file names.
const CACHE_NAME_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const CACHE_SUFFIX: &str = ".ttl";

/// Loads vocabulary documents, from memory when possible, then from the disk
/// cache, then from the network.
pub struct VocabCache {
    store: AggregateStore,
    mtimes: HashMap<PathBuf, SystemTime>,
    cache_dir: Option<PathBuf>,
    sources: VocabSources,
    formats: FormatMap,
    parser: Box<dyn DocumentParser>,
    fetcher: Arc<dyn Fetcher>,
}

impl VocabCache {
    pub fn new(cache_dir: Option<PathBuf>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store: AggregateStore::new(),
            mtimes: HashMap::new(),
            cache_dir,
            sources: VocabSources::default(),
            formats: FormatMap::default(),
            parser: Box::new(RdfDocumentParser),
            fetcher,
        }
    }

    pub fn with_sources(mut self, sources: VocabSources) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_formats(mut self, formats: FormatMap) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn store(&self) -> &AggregateStore {
        &self.store
    }

    /// The parsed vocabulary of `source`, a local path, a `file://` URL or a
    /// namespace IRI.
    #[tracing::instrument(skip(self))]
    pub fn load(&mut self, source: &str) -> Result<Arc<Document>> {
        if let Some(path) = local_file(source) {
            return self.load_file(source, &path);
        }

        if let Some(doc) = self.store.get(source) {
            debug!("using context <{}>", source);
            return Ok(doc);
        }

        match self.cache_path(source) {
            Some(cache_path) if cache_path.is_file() => {
                debug!("loading copy of <{}> from '{}'", source, cache_path.display());
                let data = fs::read(&cache_path).map_err(|e| Error::Io {
                    path: cache_path.clone(),
                    source: e,
                })?;
                let doc = self.parser.parse(&data, DocumentFormat::Turtle, source)?;
                Ok(self.store.replace(source, doc))
            }
            cache_path => {
                let doc = self.fetch(source)?;
                if let Some(cache_path) = cache_path {
                    self.write_cache(&cache_path, &doc);
                }
                Ok(self.store.replace(source, doc))
            }
        }
    }

    fn load_file(&mut self, source: &str, path: &Path) -> Result<Arc<Document>> {
        let io_err = |e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        };
        let path = path.canonicalize().map_err(io_err)?;
        let context = file_context(&path);
        let mtime = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(io_err)?;

        let stale = self.mtimes.get(&path).map_or(true, |last| *last < mtime);
        if !stale {
            if let Some(doc) = self.store.partition(&context) {
                debug!("using context <{}>", context);
                return Ok(doc);
            }
        }

        debug!("parsing file '{}'", path.display());
        let format = self
            .formats
            .for_path(source)
            .unwrap_or(DocumentFormat::Turtle);
        let data = fs::read(&path).map_err(io_err)?;
        let doc = self.parser.parse(&data, format, &context)?;

        self.mtimes.insert(path, mtime);
        Ok(self.store.replace(&context, doc))
    }

    fn fetch(&self, namespace: &str) -> Result<Document> {
        let source = self.sources.resolve(namespace);
        info!("fetching <{}> from <{}>", namespace, source.url);

        let resp = self
            .fetcher
            .fetch(&source.url, ACCEPT)
            .into_result()
            .map_err(|reason| Error::Fetch {
                url: source.url.clone(),
                reason,
            })?;

        let format = source
            .format
            .or_else(|| {
                resp.content_type
                    .as_ref()
                    .and_then(|x| self.formats.for_media_type(x))
            })
            .or_else(|| self.formats.for_path(&source.url))
            .unwrap_or(DocumentFormat::Turtle);

        debug!(status = resp.status, %format, bytes = resp.body.len(), "got <{}>", source.url);
        self.parser.parse(&resp.body, format, &source.url)
    }

    fn write_cache(&self, cache_path: &Path, doc: &Document) {
        let write = || -> std::io::Result<()> {
            if let Some(dir) = cache_path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = fs::File::create(cache_path)?;
            doc.write_turtle(BufWriter::new(file))?.flush()
        };

        match write() {
            Ok(()) => debug!("cached in '{}'", cache_path.display()),
            Err(e) => {
                warn!("could not write '{}': {}", cache_path.display(), e);
                // A partial file would shadow the source on the next run.
                let _ = fs::remove_file(cache_path);
            }
        }
    }

    /// Disk cache location of `source`, none when persistence is disabled.
    pub fn cache_path(&self, source: &str) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        let name = utf8_percent_encode(source, CACHE_NAME_SET).to_string();
        Some(dir.join(name + CACHE_SUFFIX))
    }
}

fn local_file(source: &str) -> Option<PathBuf> {
    let path = match source.strip_prefix("file://") {
        Some(_) => {
            let mut url = lsp_types::Url::parse(source).ok()?;
            url.set_fragment(None);
            url.to_file_path().ok()?
        }
        None => PathBuf::from(source),
    };
    path.is_file().then_some(path)
}

fn file_context(path: &Path) -> String {
    lsp_types::Url::from_file_path(path)
        .map(|x| x.to_string())
        .unwrap_or_else(|_| path.display().to_string())
}
