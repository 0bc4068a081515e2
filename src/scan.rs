use std::collections::BTreeMap;

use chumsky::prelude::*;

/// Only the head of a buffer is scanned for declarations, prefixes declared
/// further down are not found.
pub const MAX_LINE_SCAN: usize = 80;

/// Collects the `prefix -> namespace` bindings declared in the first
/// [`MAX_LINE_SCAN`] lines of `buffer`.
///
/// Turtle/SPARQL (`@prefix`, `PREFIX`), XML (`xmlns:`), RDFa (`vocab=`) and
/// JSON-LD context entries are recognized. Default namespaces are bound to
/// the empty prefix. When a prefix is declared twice, the last one wins.
pub fn scan_prefixes<S: AsRef<str>>(buffer: &[S]) -> BTreeMap<String, String> {
    let parser = declarations();

    buffer
        .iter()
        .take(MAX_LINE_SCAN)
        .flat_map(|line| parser.parse(line.as_ref()).unwrap_or_default())
        .collect()
}

fn ws() -> impl Parser<char, (), Error = Simple<char>> + Clone {
    filter(|c: &char| c.is_whitespace()).repeated().at_least(1).ignored()
}

fn lead() -> impl Parser<char, (), Error = Simple<char>> {
    choice((
        just("@prefix").then(ws()).ignored(),
        just("xmlns").then(just(':').or_not()).ignored(),
        just("vocab").ignored(),
        just("prefix").then(ws()).ignored(),
        just("PREFIX").then(ws()).ignored(),
        just('"').ignored(),
    ))
}

fn name() -> impl Parser<char, String, Error = Simple<char>> {
    just("@vocab").to(String::new()).or(filter(|c: &char| {
        c.is_alphanumeric() || *c == '_'
    })
    .repeated()
    .collect::<String>())
}

fn declaration() -> impl Parser<char, (String, String), Error = Simple<char>> {
    let iri = one_of("<\"'")
        .ignore_then(none_of(">\"'").repeated().at_least(1).collect::<String>())
        .then_ignore(one_of(">\"'"));

    lead()
        .ignore_then(name())
        .then_ignore(just('"').or_not())
        .then_ignore(one_of(":="))
        .then_ignore(filter(|c: &char| c.is_whitespace()).repeated())
        .then(iri)
}

/// Every declaration on a line, left to right. Characters that do not start
/// a declaration are skipped one at a time.
fn declarations() -> impl Parser<char, Vec<(String, String)>, Error = Simple<char>> {
    declaration()
        .map(Some)
        .or(any().to(None))
        .repeated()
        .map(|found| found.into_iter().flatten().collect())
}
