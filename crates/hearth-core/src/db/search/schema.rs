use std::collections::BTreeSet;

///
/// IndexSchema
///
/// Names of the fields a search index carries. Filters consult it before
/// referencing a field; an absent field means the feature is not
/// configured for this index.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexSchema {
    fields: BTreeSet<String>,
}

impl IndexSchema {
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}
