use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    ns::{rdf, rdfs},
    store::Document,
    uri::split_uri,
};

/// Local names of the terms `document` defines inside `namespace`.
///
/// A term is any subject with an `rdf:type` or `rdfs:isDefinedBy` statement
/// whose IRI splits into exactly `namespace` and a local name. The result is
/// sorted and free of duplicates.
#[tracing::instrument(skip(document), fields(triples = document.len()))]
pub fn extract_terms(document: &Document, namespace: &str) -> Vec<String> {
    let subjects: BTreeSet<&str> = document
        .named_subjects(rdf::TYPE)
        .chain(document.named_subjects(rdfs::IS_DEFINED_BY))
        .collect();

    let terms: BTreeSet<&str> = subjects
        .into_iter()
        .filter_map(split_uri)
        .filter(|(base, leaf)| *base == namespace && !leaf.is_empty())
        .map(|(_, leaf)| leaf)
        .collect();

    debug!(terms = terms.len());
    terms.into_iter().map(String::from).collect()
}
