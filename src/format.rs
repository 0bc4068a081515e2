use std::{fmt, path::Path};

use hashbrown::HashMap;
use mime::Mime;
use oxrdf::{Graph, Triple};
use oxrdfio::{RdfFormat, RdfParser};
use tracing::debug;

use crate::{store::Document, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Turtle,
    NTriples,
    NQuads,
    TriG,
    N3,
    RdfXml,
    JsonLd,
    /// JSON-LD embedded in HTML `<script>` elements.
    Html,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DocumentFormat::Turtle => "turtle",
            DocumentFormat::NTriples => "n-triples",
            DocumentFormat::NQuads => "n-quads",
            DocumentFormat::TriG => "trig",
            DocumentFormat::N3 => "n3",
            DocumentFormat::RdfXml => "rdf/xml",
            DocumentFormat::JsonLd => "json-ld",
            DocumentFormat::Html => "html",
        };
        write!(f, "{}", name)
    }
}

impl DocumentFormat {
    fn rdf_format(self) -> Option<RdfFormat> {
        match self {
            DocumentFormat::Turtle => Some(RdfFormat::Turtle),
            DocumentFormat::NTriples => Some(RdfFormat::NTriples),
            DocumentFormat::NQuads => Some(RdfFormat::NQuads),
            DocumentFormat::TriG => Some(RdfFormat::TriG),
            DocumentFormat::N3 => Some(RdfFormat::N3),
            DocumentFormat::RdfXml => Some(RdfFormat::RdfXml),
            DocumentFormat::JsonLd => RdfFormat::from_extension("jsonld"),
            DocumentFormat::Html => None,
        }
    }
}

pub const ACCEPT: &str = "text/turtle, application/rdf+xml;q=0.9, application/ld+json;q=0.8, \
     application/n-triples;q=0.7, text/html;q=0.5";

/// Maps file extensions and media types to the format used to parse them.
#[derive(Debug, Clone)]
pub struct FormatMap {
    extensions: HashMap<String, DocumentFormat>,
    media_types: HashMap<String, DocumentFormat>,
}

impl Default for FormatMap {
    fn default() -> Self {
        use DocumentFormat::*;

        let extensions = [
            ("ttl", Turtle),
            ("turtle", Turtle),
            ("nt", NTriples),
            ("nq", NQuads),
            ("trig", TriG),
            ("n3", N3),
            ("rdf", RdfXml),
            ("rdfs", RdfXml),
            ("owl", RdfXml),
            ("xml", RdfXml),
            ("jsonld", JsonLd),
            ("html", Html),
            ("htm", Html),
            ("xhtml", Html),
        ];
        let media_types = [
            ("text/turtle", Turtle),
            ("application/x-turtle", Turtle),
            ("application/n-triples", NTriples),
            ("application/n-quads", NQuads),
            ("application/trig", TriG),
            ("text/n3", N3),
            ("text/rdf+n3", N3),
            ("application/rdf+xml", RdfXml),
            ("application/xml", RdfXml),
            ("text/xml", RdfXml),
            ("application/ld+json", JsonLd),
            ("text/html", Html),
            ("application/xhtml+xml", Html),
        ];

        Self {
            extensions: extensions
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            media_types: media_types
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

impl FormatMap {
    pub fn with_extension(mut self, extension: &str, format: DocumentFormat) -> Self {
        self.extensions
            .insert(extension.to_ascii_lowercase(), format);
        self
    }

    pub fn with_media_type(mut self, media_type: &str, format: DocumentFormat) -> Self {
        self.media_types
            .insert(media_type.to_ascii_lowercase(), format);
        self
    }

    /// Format of a local path or URL, judged by its extension.
    pub fn for_path(&self, path: &str) -> Option<DocumentFormat> {
        let path = path.split(['#', '?']).next().unwrap_or(path);
        let extension = Path::new(path).extension()?.to_str()?;
        self.extensions
            .get(&extension.to_ascii_lowercase())
            .copied()
    }

    pub fn for_media_type(&self, media_type: &Mime) -> Option<DocumentFormat> {
        self.media_types
            .get(&media_type.essence_str().to_ascii_lowercase())
            .copied()
    }
}

/// Turns serialized bytes into a [`Document`].
pub trait DocumentParser {
    /// `origin` names the source in errors and serves as base IRI when it is
    /// an absolute URL.
    fn parse(&self, data: &[u8], format: DocumentFormat, origin: &str) -> Result<Document>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RdfDocumentParser;

impl DocumentParser for RdfDocumentParser {
    fn parse(&self, data: &[u8], format: DocumentFormat, origin: &str) -> Result<Document> {
        parse_document(data, format, origin)
    }
}

pub fn parse_document(data: &[u8], format: DocumentFormat, origin: &str) -> Result<Document> {
    match format {
        DocumentFormat::Html => parse_html(data, origin),
        _ => parse_rdf(data, format, origin),
    }
}

fn parse_error(origin: &str, format: DocumentFormat, message: impl ToString) -> Error {
    Error::Parse {
        origin: origin.to_string(),
        format,
        message: message.to_string(),
    }
}

fn parse_rdf(data: &[u8], format: DocumentFormat, origin: &str) -> Result<Document> {
    let rdf_format = format
        .rdf_format()
        .ok_or_else(|| parse_error(origin, format, "no parser available"))?;

    let mut parser = RdfParser::from_format(rdf_format).rename_blank_nodes();
    if lsp_types::Url::parse(origin).is_ok() {
        parser = parser
            .with_base_iri(origin)
            .map_err(|e| parse_error(origin, format, e))?;
    }

    let mut reader = parser.for_reader(data);
    let mut graph = Graph::new();
    for quad in reader.by_ref() {
        let quad = quad.map_err(|e| parse_error(origin, format, e))?;
        graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
    }

    let prefixes: Vec<_> = reader
        .prefixes()
        .map(|(name, iri)| (name.to_string(), iri.to_string()))
        .collect();

    debug!(%origin, %format, triples = graph.len(), prefixes = prefixes.len());
    Ok(Document::new(graph, prefixes))
}

fn parse_html(data: &[u8], origin: &str) -> Result<Document> {
    let html = std::str::from_utf8(data).map_err(|e| parse_error(origin, DocumentFormat::Html, e))?;

    let mut document = Document::default();
    for script in embedded_json_ld(html) {
        document.merge(parse_rdf(script.as_bytes(), DocumentFormat::JsonLd, origin)?);
    }
    Ok(document)
}

/// Bodies of the `<script type="application/ld+json">` elements of `html`.
fn embedded_json_ld(html: &str) -> Vec<&str> {
    // ASCII lowercasing keeps byte offsets intact.
    let lower = html.to_ascii_lowercase();

    let mut out = Vec::new();
    let mut at = 0;
    while let Some(start) = lower[at..].find("<script").map(|x| x + at) {
        let Some(body) = lower[start..].find('>').map(|x| x + start + 1) else {
            break;
        };
        let Some(end) = lower[body..].find("</script").map(|x| x + body) else {
            break;
        };

        if lower[start..body].contains("application/ld+json") {
            out.push(&html[body..end]);
        }
        at = end;
    }

    out
}
