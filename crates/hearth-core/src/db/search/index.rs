use crate::{
    db::{
        predicate::{Predicate, eval},
        search::{IndexSchema, SearchConditions},
        store::{Document, Entity},
    },
    key::Key,
};

///
/// SearchQuery
///
/// A query against one index: its schema plus the shared condition tree.
///

#[derive(Clone, Debug)]
pub struct SearchQuery {
    schema: IndexSchema,
    conditions: SearchConditions,
}

impl SearchQuery {
    #[must_use]
    pub fn new(schema: IndexSchema) -> Self {
        Self {
            schema,
            conditions: SearchConditions::new(),
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    #[must_use]
    pub const fn conditions(&self) -> &SearchConditions {
        &self.conditions
    }

    /// Split borrow: read the schema while mutating conditions.
    pub const fn parts_mut(&mut self) -> (&IndexSchema, &mut SearchConditions) {
        (&self.schema, &mut self.conditions)
    }

    #[must_use]
    pub fn predicate(&self) -> Predicate {
        self.conditions.to_predicate()
    }
}

///
/// MemoryIndex
///
/// In-process search index over documents, evaluated by predicate.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryIndex {
    schema: IndexSchema,
    documents: Vec<Document>,
}

impl MemoryIndex {
    #[must_use]
    pub const fn new(schema: IndexSchema) -> Self {
        Self {
            schema,
            documents: Vec::new(),
        }
    }

    pub fn index(&mut self, document: Document) {
        self.documents.push(document);
    }

    /// Start a query bound to this index's schema.
    #[must_use]
    pub fn query(&self) -> SearchQuery {
        SearchQuery::new(self.schema.clone())
    }

    /// Keys of matching documents, in indexing order.
    #[must_use]
    pub fn search(&self, query: &SearchQuery) -> Vec<Key> {
        let predicate = query.predicate();

        self.documents
            .iter()
            .filter(|doc| eval(*doc, &predicate))
            .map(Entity::key)
            .collect()
    }
}
