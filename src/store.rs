use std::{collections::BTreeMap, io, sync::Arc};

use hashbrown::HashMap;
use oxrdf::{Graph, GraphNameRef, NamedNodeRef, TermRef};
use oxrdfio::{RdfFormat, RdfSerializer};

/// The triples of one parsed source, together with the prefixes it declared.
#[derive(Debug, Default, Clone)]
pub struct Document {
    graph: Graph,
    prefixes: BTreeMap<String, String>,
}

impl Document {
    pub fn new(graph: Graph, prefixes: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            graph,
            prefixes: prefixes.into_iter().collect(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// IRIs of the subjects of every `predicate` statement. Blank node
    /// subjects are skipped.
    pub fn named_subjects<'a>(
        &'a self,
        predicate: NamedNodeRef<'a>,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.graph
            .triples_for_predicate(predicate)
            .filter_map(|t| match TermRef::from(t.subject) {
                TermRef::NamedNode(n) => Some(n.as_str()),
                _ => None,
            })
    }

    pub fn merge(&mut self, other: Document) {
        for t in other.graph.iter() {
            self.graph.insert(t);
        }
        self.prefixes.extend(other.prefixes);
    }

    /// Serializes the document as Turtle, keeping the prefixes that are
    /// usable as Turtle prefix declarations.
    pub fn write_turtle<W: io::Write>(&self, writer: W) -> io::Result<W> {
        let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle);
        for (name, iri) in self.prefixes.iter().filter(|(n, i)| usable_prefix(n, i)) {
            serializer = serializer
                .with_prefix(name.as_str(), iri.as_str())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        }

        let mut serializer = serializer.for_writer(writer);
        for t in self.graph.iter() {
            serializer.serialize_quad(t.in_graph(GraphNameRef::DefaultGraph))?;
        }
        serializer.finish()
    }
}

fn usable_prefix(name: &str, iri: &str) -> bool {
    let name_ok = name.chars().enumerate().all(|(i, c)| {
        c.is_ascii_alphabetic() || (i > 0 && (c.is_ascii_digit() || c == '_' || c == '-'))
    });
    name_ok && lsp_types::Url::parse(iri).is_ok()
}

/// Triples of many sources, partitioned by context identifier.
#[derive(Debug, Default)]
pub struct AggregateStore {
    partitions: HashMap<String, Arc<Document>>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The partition of `context`, only when it holds triples.
    pub fn get(&self, context: &str) -> Option<Arc<Document>> {
        self.partition(context).filter(|doc| !doc.is_empty())
    }

    /// The partition of `context`, even an empty one.
    pub fn partition(&self, context: &str) -> Option<Arc<Document>> {
        self.partitions.get(context).cloned()
    }

    pub fn contains(&self, context: &str) -> bool {
        self.get(context).is_some()
    }

    /// Drops whatever `context` held before storing `document` under it.
    pub fn replace(&mut self, context: &str, document: Document) -> Arc<Document> {
        self.remove(context);
        let document = Arc::new(document);
        self.partitions
            .insert(context.to_string(), Arc::clone(&document));
        document
    }

    pub fn remove(&mut self, context: &str) -> Option<Arc<Document>> {
        self.partitions.remove(context)
    }

    /// Number of triples over all partitions.
    pub fn len(&self) -> usize {
        self.partitions.values().map(|doc| doc.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use oxrdf::{Literal, NamedNode, Triple};

    use super::*;
    use crate::{format::DocumentFormat, ns::rdf};

    fn doc(subjects: &[&str]) -> Document {
        let mut graph = Graph::new();
        for s in subjects {
            graph.insert(&Triple::new(
                NamedNode::new_unchecked(*s),
                rdf::TYPE,
                NamedNode::new_unchecked("http://www.w3.org/2000/01/rdf-schema#Class"),
            ));
        }
        Document::new(graph, [("ex".to_string(), "http://example.org/".to_string())])
    }

    #[test]
    fn replace_drops_previous_triples() {
        let mut store = AggregateStore::new();
        store.replace("ctx", doc(&["http://example.org/A", "http://example.org/B"]));
        store.replace("other", doc(&["http://example.org/C"]));
        assert_eq!(store.len(), 3);

        let replaced = store.replace("ctx", doc(&["http://example.org/D"]));
        assert_eq!(replaced.len(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get("ctx").unwrap().named_subjects(rdf::TYPE).collect::<Vec<_>>(),
            vec!["http://example.org/D"]
        );
    }

    #[test]
    fn empty_partitions_are_not_hits() {
        let mut store = AggregateStore::new();
        store.replace("ctx", Document::default());
        assert!(!store.contains("ctx"));
        assert!(store.get("ctx").is_none());
        assert!(store.partition("ctx").is_some());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn blank_and_literal_terms_are_not_named_subjects() {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(
            oxrdf::BlankNode::default(),
            rdf::TYPE,
            NamedNode::new_unchecked("http://example.org/Thing"),
        ));
        graph.insert(&Triple::new(
            NamedNode::new_unchecked("http://example.org/a"),
            NamedNode::new_unchecked("http://example.org/label"),
            Literal::new_simple_literal("a"),
        ));
        let document = Document::new(graph, BTreeMap::new());
        assert_eq!(document.named_subjects(rdf::TYPE).count(), 0);
    }

    #[test]
    fn merge_unions_triples_and_prefixes() {
        let mut a = doc(&["http://example.org/A"]);
        let b = Document::new(
            doc(&["http://example.org/B"]).graph().clone(),
            [("foaf".to_string(), "http://xmlns.com/foaf/0.1/".to_string())],
        );
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.prefixes().count(), 2);
    }

    #[test]
    fn write_turtle_declares_prefixes() {
        let document = doc(&["http://example.org/A"]);
        let out = document.write_turtle(Vec::new()).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.contains("@prefix ex:"));

        let parsed =
            crate::format::parse_document(&out, DocumentFormat::Turtle, "http://example.org/")
                .unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.prefixes().collect::<Vec<_>>(), vec![("ex", "http://example.org/")]);
    }
}
