use crate::{
    db::{
        access::Account,
        buffer::{Deferred, EntityBuffer},
        connection::{
            ConnectionDefinition, ConnectionError, ConnectionTarget, PageDirection, PageWindow,
            Connection, PendingConnection, SortKey,
        },
        cursor::{Cursor, decode_for},
        direction::Direction,
        predicate::{CompareOp, Predicate},
        store::{EntityQuery, EntityStore},
    },
    key::Key,
    value::Value,
};

///
/// PageIds
///
/// One page of ids in presentation order, plus whether the store had more
/// rows beyond it in the direction of travel.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageIds {
    pub ids: Vec<Key>,
    pub has_more: bool,
}

///
/// ConnectionQueryHelper
///
/// Builds and runs the id query for one connection request. The sort key
/// is mapped to its field at construction so unsupported keys fail before
/// any I/O.
///
/// Ordering is `(sort_field, id)`: the primary direction follows
/// `reverse`, the id tie-break is always ascending in forward order.
/// Backward pages run the exact inverse order and are flipped afterwards.
///

#[derive(Clone, Debug)]
pub struct ConnectionQueryHelper<'d> {
    definition: &'d ConnectionDefinition,
    target: ConnectionTarget,
    sort_key: SortKey,
    sort_field: &'d str,
    account: Option<Account>,
}

impl<'d> ConnectionQueryHelper<'d> {
    pub fn new(
        definition: &'d ConnectionDefinition,
        target: ConnectionTarget,
        sort_key: &SortKey,
        account: Option<Account>,
    ) -> Result<Self, ConnectionError> {
        let sort_field = definition.sort_field(sort_key)?;

        match (&target, definition.parent_field_name()) {
            (ConnectionTarget::Root, Some(_)) => {
                return Err(ConnectionError::MissingParent(definition.name().to_string()));
            }
            (ConnectionTarget::Parent(_), None) => {
                return Err(ConnectionError::UnexpectedParent(
                    definition.name().to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            definition,
            target,
            sort_key: sort_key.clone(),
            sort_field,
            account,
        })
    }

    #[must_use]
    pub const fn definition(&self) -> &'d ConnectionDefinition {
        self.definition
    }

    #[must_use]
    pub const fn sort_field(&self) -> &'d str {
        self.sort_field
    }

    #[must_use]
    pub const fn sort_key(&self) -> &SortKey {
        &self.sort_key
    }

    /// Base id query: collection filter, parent scope, and entity access.
    #[must_use]
    pub fn build_query(&self) -> EntityQuery {
        let mut query = EntityQuery::new(self.definition.entity_type())
            .filter(self.definition.base_filter().clone());

        if let (ConnectionTarget::Parent(parent), Some(field)) =
            (&self.target, self.definition.parent_field_name())
        {
            query = query.filter(Predicate::eq(field, parent.to_value()));
        }

        if self.definition.checks_access()
            && let Some(account) = &self.account
        {
            query = query.access_check(account.clone());
        }

        query
    }

    /// Primary and tie-break directions for a window.
    #[must_use]
    pub const fn ordering(window: &PageWindow) -> (Direction, Direction) {
        let primary = if window.reverse {
            Direction::Desc
        } else {
            Direction::Asc
        };

        match window.direction {
            PageDirection::Forward => (primary, Direction::Asc),
            PageDirection::Backward => (primary.reversed(), Direction::Desc),
        }
    }

    /// Rows strictly past `cursor` in the given order:
    /// `sort op v OR (sort = v AND id op' id)`.
    ///
    /// Rows without the sort field order as `Null`, so they are matched
    /// as `Null` here too.
    #[must_use]
    pub fn resume_predicate(&self, cursor: &Cursor, primary: Direction, tie: Direction) -> Predicate {
        let field = self.sort_field;
        let value = cursor.sort_value().clone();
        let id_past = Predicate::compare(
            self.definition.id_field_name(),
            past(tie),
            cursor.entity_id().to_value(),
        );

        if matches!(value, Value::Null) {
            return Predicate::compare(field, past(primary), Value::Null)
                | (Predicate::is_null_or_missing(field) & id_past);
        }

        let nulls_past = match primary {
            Direction::Asc => Value::Null.canonical_cmp(&value).is_gt(),
            Direction::Desc => Value::Null.canonical_cmp(&value).is_lt(),
        };

        let mut resume = Predicate::compare(field, past(primary), value.clone())
            | (Predicate::eq(field, value) & id_past);
        if nulls_past {
            resume = resume | Predicate::is_null_or_missing(field);
        }

        resume
    }

    /// Run the ordered, resumed id query and cut one page from it.
    ///
    /// Fetches `limit + 1` rows to learn whether more exist; backward
    /// pages come back in presentation order.
    pub fn resolve_ids<S: EntityStore>(
        &self,
        store: &S,
        query: EntityQuery,
        cursor: Option<&Cursor>,
        window: &PageWindow,
    ) -> Result<PageIds, ConnectionError> {
        let (primary, tie) = Self::ordering(window);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);

        let mut query = query
            .order_by(self.sort_field, primary)
            .order_by(self.definition.id_field_name(), tie)
            .limit(limit.saturating_add(1));
        if let Some(cursor) = cursor {
            query = query.filter(self.resume_predicate(cursor, primary, tie));
        }

        let mut ids = store.query_ids(&query)?;
        let has_more = ids.len() > limit;
        ids.truncate(limit);

        if window.direction == PageDirection::Backward {
            ids.reverse();
        }

        Ok(PageIds { ids, has_more })
    }

    /// Queue a page's ids on the request buffer.
    pub fn load_edges<S: EntityStore>(&self, buffer: &EntityBuffer<'_, S>, ids: &[Key]) -> Deferred {
        buffer.add(self.definition.entity_type(), ids)
    }

    /// First phase: run the id query and defer hydration.
    ///
    /// A token that does not decode, or that was minted for another
    /// collection or sort key, is ignored and the first page is served.
    pub fn prepare<S: EntityStore>(
        &self,
        buffer: &EntityBuffer<'_, S>,
        window: &PageWindow,
    ) -> Result<PendingConnection, ConnectionError> {
        let entity_type = self.definition.entity_type();
        let cursor = decode_for(
            window.cursor.as_deref(),
            self.sort_key.as_str(),
            entity_type,
        );

        let page = self.resolve_ids(buffer.store(), self.build_query(), cursor.as_ref(), window)?;

        let resumed = cursor.is_some();
        let (has_next_page, has_previous_page) = match window.direction {
            PageDirection::Forward => (page.has_more, resumed),
            PageDirection::Backward => (resumed, page.has_more),
        };

        tracing::debug!(
            connection = self.definition.name(),
            sort_key = %self.sort_key,
            direction = ?window.direction,
            limit = window.limit,
            resumed,
            ids = page.ids.len(),
            "connection page prepared"
        );

        Ok(PendingConnection::new(
            entity_type,
            self.sort_key.clone(),
            self.sort_field,
            self.load_edges(buffer, &page.ids),
            has_next_page,
            has_previous_page,
        ))
    }

    /// Both phases in one call, for a connection resolved on its own.
    pub fn resolve<S: EntityStore>(
        &self,
        buffer: &EntityBuffer<'_, S>,
        window: &PageWindow,
    ) -> Result<Connection<S::Entity>, ConnectionError> {
        self.prepare(buffer, window)?.finish(buffer)
    }
}

const fn past(direction: Direction) -> CompareOp {
    match direction {
        Direction::Asc => CompareOp::Gt,
        Direction::Desc => CompareOp::Lt,
    }
}
