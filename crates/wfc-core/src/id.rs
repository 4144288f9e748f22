use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner shared by node, edge, and handle ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Declares an interned identifier type.
///
/// Each id is a `Spur` index: 4 bytes, `Copy`, with O(1) `Eq` and `Hash`.
/// The host hands us strings; everything inside the canvas compares spurs.
macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $sigil:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string, or return the existing id for it.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Resolve back to the host's string.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($sigil, "{}"), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::intern(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a node on the canvas.
    NodeId,
    "#"
);

interned_id!(
    /// Identifier of an edge between two nodes.
    EdgeId,
    "~"
);

interned_id!(
    /// Identifier of a connection handle, unique within its node.
    HandleId,
    "."
);

impl EdgeId {
    /// Generate the id for a freshly committed connection.
    ///
    /// Follows the `xy-edge__{source}{sourceHandle}-{target}{targetHandle}`
    /// shape hosts already expect.
    pub fn for_connection(
        source: NodeId,
        source_handle: Option<HandleId>,
        target: NodeId,
        target_handle: Option<HandleId>,
    ) -> Self {
        let sh = source_handle.map(|h| h.as_str().to_string()).unwrap_or_default();
        let th = target_handle.map(|h| h.as_str().to_string()).unwrap_or_default();
        Self::intern(&format!(
            "xy-edge__{}{sh}-{}{th}",
            source.as_str(),
            target.as_str()
        ))
    }

    /// Generate a unique id with a prefix (e.g. `edge_3`).
    pub fn with_prefix(prefix: &str) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{prefix}_{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("fetch_step");
        let b = NodeId::intern("fetch_step");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "fetch_step");
    }

    #[test]
    fn id_kinds_share_strings_but_not_types() {
        let n = NodeId::intern("shared");
        let h = HandleId::intern("shared");
        assert_eq!(n.as_str(), h.as_str());
        assert_eq!(format!("{n:?}"), "#shared");
        assert_eq!(format!("{h:?}"), ".shared");
    }

    #[test]
    fn connection_ids_include_handles() {
        let id = EdgeId::for_connection(
            NodeId::intern("a"),
            Some(HandleId::intern("out")),
            NodeId::intern("b"),
            None,
        );
        assert_eq!(id.as_str(), "xy-edge__aout-b");
    }

    #[test]
    fn prefixed_ids_are_unique() {
        assert_ne!(EdgeId::with_prefix("edge"), EdgeId::with_prefix("edge"));
    }
}
