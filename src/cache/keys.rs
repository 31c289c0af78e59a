//! Cache key definitions.
//!
//! Typed composite keys with a derived total order replace the usual
//! stringified `typename(args)` concatenation, so iteration over recorded
//! invocations is deterministic and argument canonicalization is enforced at
//! construction.

use std::fmt;

/// Identity of one cacheable object.
///
/// `Session` is the fixed singleton key for the current-user entity; pages
/// deliberately have no variant here (a page is a value, never an entity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKey {
    /// The query root.
    Query,
    /// The singleton current-session entity.
    Session,
    /// A post identified by its database id.
    Post(i64),
    /// A user identified by its database id.
    User(i64),
}

impl EntityKey {
    pub fn tag(&self) -> EntityTag {
        match self {
            Self::Query => EntityTag::Query,
            Self::Session => EntityTag::Session,
            Self::Post(_) => EntityTag::Post,
            Self::User(_) => EntityTag::User,
        }
    }
}

/// Type tag of an [`EntityKey`], used to key the resolver table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityTag {
    Query,
    Session,
    Post,
    User,
}

/// One canonical argument value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
        }
    }
}

/// Canonicalized argument set of one field invocation.
///
/// Pairs are sorted by name at construction, so two argument sets that differ
/// only in spelling order produce the same field key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldArgs {
    pairs: Vec<(String, ArgValue)>,
}

impl FieldArgs {
    pub fn new<N: Into<String>>(pairs: impl IntoIterator<Item = (N, ArgValue)>) -> Self {
        let mut pairs: Vec<(String, ArgValue)> = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        pairs.sort();
        Self { pairs }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for FieldArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (name, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{name}:{value}")?;
        }
        write!(f, ")")
    }
}

/// Storage address of one field invocation: entity, field name, arguments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldKey {
    pub entity: EntityKey,
    pub field: String,
    pub args: FieldArgs,
}

impl FieldKey {
    pub fn new(entity: EntityKey, field: impl Into<String>, args: FieldArgs) -> Self {
        Self {
            entity,
            field: field.into(),
            args,
        }
    }

    /// Field with no arguments (entity attributes, singletons).
    pub fn plain(entity: EntityKey, field: impl Into<String>) -> Self {
        Self::new(entity, field, FieldArgs::empty())
    }
}

/// One recorded field invocation, as reported by `inspect_fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub field: String,
    pub key: FieldKey,
    pub args: FieldArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_canonicalize_name_order() {
        let a = FieldArgs::new([
            ("limit", ArgValue::Int(10)),
            ("cursor", ArgValue::Null),
        ]);
        let b = FieldArgs::new([
            ("cursor", ArgValue::Null),
            ("limit", ArgValue::Int(10)),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "(cursor:null,limit:10)");
    }

    #[test]
    fn distinct_args_give_distinct_field_keys() {
        let k1 = FieldKey::new(
            EntityKey::Query,
            "posts",
            FieldArgs::new([("limit", ArgValue::Int(10))]),
        );
        let k2 = FieldKey::new(
            EntityKey::Query,
            "posts",
            FieldArgs::new([("limit", ArgValue::Int(20))]),
        );
        assert_ne!(k1, k2);
        assert_eq!(k1.entity, k2.entity);
        assert_eq!(k1.field, k2.field);
    }

    #[test]
    fn field_keys_order_deterministically() {
        let mut keys = vec![
            FieldKey::plain(EntityKey::Post(2), "title"),
            FieldKey::plain(EntityKey::Post(1), "title"),
            FieldKey::plain(EntityKey::Query, "posts"),
        ];
        keys.sort();
        assert_eq!(keys[0].entity, EntityKey::Query);
        assert_eq!(keys[1].entity, EntityKey::Post(1));
        assert_eq!(keys[2].entity, EntityKey::Post(2));
    }

    #[test]
    fn entity_tags_collapse_identity() {
        assert_eq!(EntityKey::Post(1).tag(), EntityKey::Post(9).tag());
        assert_ne!(EntityKey::Post(1).tag(), EntityKey::User(1).tag());
    }
}
