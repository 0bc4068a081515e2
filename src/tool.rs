use std::sync::Arc;

use hashbrown::HashMap;
use lsp_types::{CompletionItem, CompletionItemKind};
use serde::Serialize;
use tracing::debug;

use crate::{
    config::Config,
    ns::{PREFIX_KEYWORD, XMLNS},
    prefix::PrefixCache,
    scan::scan_prefixes,
    store::Document,
    terms::extract_terms,
    utils::{Fetcher, HttpFetcher},
    vocab::VocabCache,
    Result,
};

/// A completion candidate, shaped like a vim complete-item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub word: String,
    /// `0`: the candidate must be matched case-sensitively.
    pub icase: u8,
}

impl Candidate {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            icase: 0,
        }
    }
}

impl From<Candidate> for CompletionItem {
    fn from(candidate: Candidate) -> Self {
        let kind = if candidate.word.ends_with(':') || candidate.word.contains(' ') {
            CompletionItemKind::MODULE
        } else {
            CompletionItemKind::PROPERTY
        };

        CompletionItem {
            label: candidate.word,
            kind: Some(kind),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declaration {
    /// `foaf: <http://xmlns.com/foaf/0.1/>`
    Prefix,
    /// `foaf="http://xmlns.com/foaf/0.1/"`
    Xmlns,
}

impl Declaration {
    fn format(self, prefix: &str, namespace: &str) -> String {
        match self {
            Declaration::Prefix => format!("{}: <{}>", prefix, namespace),
            Declaration::Xmlns => format!("{}=\"{}\"", prefix, namespace),
        }
    }
}

/// Answers completion requests, owning every cache for its lifetime.
pub struct CompletionTool {
    prefixes: PrefixCache,
    vocabs: VocabCache,
    terms_by_ns: HashMap<String, (Arc<Document>, Vec<String>)>,
}

impl CompletionTool {
    pub fn new(config: &Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> =
            Arc::new(HttpFetcher::new(config.fetch_timeout, &config.user_agent)?);

        let prefixes = PrefixCache::open(
            config.prefix_file(),
            &config.prefix_template,
            fetcher.clone(),
        );
        let vocabs = VocabCache::new(config.cache_dir(), fetcher);

        Ok(Self::from_parts(prefixes, vocabs))
    }

    pub fn from_parts(prefixes: PrefixCache, vocabs: VocabCache) -> Self {
        Self {
            prefixes,
            vocabs,
            terms_by_ns: HashMap::new(),
        }
    }

    pub fn prefixes(&self) -> &PrefixCache {
        &self.prefixes
    }

    pub fn vocabs(&self) -> &VocabCache {
        &self.vocabs
    }

    pub fn lookup(&mut self, prefix: &str) -> Option<String> {
        self.prefixes.resolve(prefix)
    }

    /// Terms defined by the vocabulary of `namespace`. The vocabulary is
    /// loaded on every call, terms are extracted again only when it changed.
    pub fn vocab_terms(&mut self, namespace: &str) -> Result<&[String]> {
        let doc = self.vocabs.load(namespace)?;

        let known = self
            .terms_by_ns
            .get(namespace)
            .map_or(false, |(seen, _)| Arc::ptr_eq(seen, &doc));
        if !known {
            let terms = extract_terms(&doc, namespace);
            debug!("{} terms in <{}>", terms.len(), namespace);
            self.terms_by_ns
                .insert(namespace.to_string(), (doc, terms));
        }

        Ok(self
            .terms_by_ns
            .get(namespace)
            .map(|(_, terms)| terms.as_slice())
            .unwrap_or_default())
    }

    /// Candidates for `partial`, the word under the cursor, where `context`
    /// is the token it is part of (`foaf:Pe`, `@prefix fo`, `xmlns:fo`).
    #[tracing::instrument(skip(self, buffer))]
    pub fn complete<S: AsRef<str>>(
        &mut self,
        buffer: &[S],
        context: &str,
        partial: &str,
    ) -> Result<Vec<Candidate>> {
        let head = context.split(':').next().unwrap_or_default();
        let keyword = head
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_start_matches('@');

        let declaration = if keyword.eq_ignore_ascii_case(PREFIX_KEYWORD) {
            Some(Declaration::Prefix)
        } else if keyword == XMLNS {
            Some(Declaration::Xmlns)
        } else {
            None
        };

        let words = match declaration {
            Some(declaration) => self.declarations(declaration, partial),
            None => {
                let marker = head.split_whitespace().last().unwrap_or_default();
                self.curies(buffer, marker, !context.contains(':'), partial)?
            }
        };

        debug!(candidates = words.len());
        Ok(words.into_iter().map(Candidate::new).collect())
    }

    fn declarations(&mut self, declaration: Declaration, partial: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .prefixes
            .all_bindings()
            .filter(|(pfx, _)| pfx.starts_with(partial))
            .map(|(pfx, ns)| declaration.format(pfx, ns))
            .collect();

        if out.is_empty() {
            if let Some(ns) = self.prefixes.resolve(partial) {
                out.push(declaration.format(partial, &ns));
            }
        }

        out
    }

    fn curies<S: AsRef<str>>(
        &mut self,
        buffer: &[S],
        marker: &str,
        with_prefixes: bool,
        partial: &str,
    ) -> Result<Vec<String>> {
        let declared = scan_prefixes(buffer);

        let mut words = Vec::new();
        if with_prefixes {
            words.extend(
                declared
                    .keys()
                    .filter(|pfx| !pfx.is_empty())
                    .map(|pfx| format!("{}:", pfx)),
            );
        }
        if let Some(ns) = declared.get(marker) {
            words.extend(self.vocab_terms(ns)?.iter().cloned());
        }

        words.retain(|w| w.starts_with(partial));
        Ok(words)
    }
}
