use hashbrown::HashMap;

use crate::format::DocumentFormat;

pub use oxrdf::vocab::{rdf, rdfs};

/// Context marker of prefix declarations (`@prefix`, `PREFIX`).
pub const PREFIX_KEYWORD: &str = "prefix";

/// Context marker of XML namespace declarations.
pub const XMLNS: &str = "xmlns";

pub const SCHEMA_HTTP: &str = "http://schema.org/";
pub const SCHEMA_HTTPS: &str = "https://schema.org/";

/// Releases exist for both namespace spellings, terms are only found in the
/// one matching the declared namespace.
const SCHEMA_RELEASE_HTTP: &str = "https://schema.org/version/latest/schemaorg-current-http.ttl";
const SCHEMA_RELEASE_HTTPS: &str =
    "https://schema.org/version/latest/schemaorg-current-https.ttl";

/// Bindings every prefix cache starts with.
pub const CORE_PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xml", "http://www.w3.org/XML/1998/namespace"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// Where to retrieve a vocabulary whose namespace IRI does not itself
/// dereference to a machine readable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabSource {
    pub url: String,
    pub format: Option<DocumentFormat>,
}

#[derive(Debug, Clone)]
pub struct VocabSources {
    sources: HashMap<String, VocabSource>,
}

impl Default for VocabSources {
    fn default() -> Self {
        let mut out = Self::empty();
        out.insert(SCHEMA_HTTP, SCHEMA_RELEASE_HTTP, Some(DocumentFormat::Turtle));
        out.insert(SCHEMA_HTTPS, SCHEMA_RELEASE_HTTPS, Some(DocumentFormat::Turtle));
        out
    }
}

impl VocabSources {
    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    pub fn insert(&mut self, namespace: &str, url: &str, format: Option<DocumentFormat>) {
        self.sources.insert(
            namespace.to_string(),
            VocabSource {
                url: url.to_string(),
                format,
            },
        );
    }

    pub fn get(&self, namespace: &str) -> Option<&VocabSource> {
        self.sources.get(namespace)
    }

    /// The document to fetch for `namespace`, the namespace itself when no
    /// override exists.
    pub fn resolve(&self, namespace: &str) -> VocabSource {
        self.get(namespace).cloned().unwrap_or_else(|| VocabSource {
            url: namespace.to_string(),
            format: None,
        })
    }
}
