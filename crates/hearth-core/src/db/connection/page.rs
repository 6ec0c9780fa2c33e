use crate::{
    db::{
        buffer::{Deferred, EntityBuffer},
        connection::{ConnectionError, SortKey},
        cursor::Cursor,
        predicate::{FieldPresence, Row},
        store::{Entity, EntityStore},
    },
    obs::sink::{MetricsEvent, record},
    value::Value,
};
use std::rc::Rc;

///
/// Edge
///

#[derive(Clone, Debug)]
pub struct Edge<E> {
    pub node: Rc<E>,
    pub cursor: Cursor,
}

impl<E> Edge<E> {
    #[must_use]
    pub fn cursor_token(&self) -> String {
        self.cursor.encode()
    }
}

///
/// PageInfo
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

///
/// Connection
///

#[derive(Clone, Debug)]
pub struct Connection<E> {
    pub edges: Vec<Edge<E>>,
    pub page_info: PageInfo,
}

impl<E> Connection<E> {
    pub fn nodes(&self) -> impl Iterator<Item = &Rc<E>> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

///
/// PendingConnection
///
/// A prepared page whose entities are queued but not yet loaded.
///

#[derive(Clone, Debug)]
pub struct PendingConnection {
    entity_type: String,
    sort_key: SortKey,
    sort_field: String,
    deferred: Deferred,
    has_next_page: bool,
    has_previous_page: bool,
}

impl PendingConnection {
    pub(super) fn new(
        entity_type: &str,
        sort_key: SortKey,
        sort_field: &str,
        deferred: Deferred,
        has_next_page: bool,
        has_previous_page: bool,
    ) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            sort_key,
            sort_field: sort_field.to_string(),
            deferred,
            has_next_page,
            has_previous_page,
        }
    }

    #[must_use]
    pub const fn deferred(&self) -> &Deferred {
        &self.deferred
    }

    /// Second phase: read entities back and mint one cursor per edge.
    ///
    /// Ids whose entity vanished between query and load are dropped.
    pub fn finish<S: EntityStore>(
        self,
        buffer: &EntityBuffer<'_, S>,
    ) -> Result<Connection<S::Entity>, ConnectionError> {
        let entities = buffer.resolve(&self.deferred)?;

        let edges: Vec<Edge<S::Entity>> = entities
            .into_iter()
            .map(|node| {
                let sort_value = match node.field(&self.sort_field) {
                    FieldPresence::Present(value) => value,
                    FieldPresence::Missing => Value::Null,
                };
                let cursor = Cursor::new(
                    self.entity_type.as_str(),
                    node.key(),
                    self.sort_key.as_str(),
                    sort_value,
                );

                Edge { node, cursor }
            })
            .collect();

        record(MetricsEvent::ConnectionResolved {
            entity_type: &self.entity_type,
            edges: edges.len() as u64,
        });

        let page_info = PageInfo {
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
            start_cursor: edges.first().map(Edge::cursor_token),
            end_cursor: edges.last().map(Edge::cursor_token),
        };

        Ok(Connection { edges, page_info })
    }
}
