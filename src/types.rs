// src/types.rs

use std::fmt;

/// Which content directory a source file lives in.
///
/// Every kind gets its own watch subscription and debouncer; only the first
/// three are cached as entities; assets are mirrored byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Posts,
    Layouts,
    Fragments,
    Assets,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Posts,
        SourceKind::Layouts,
        SourceKind::Fragments,
        SourceKind::Assets,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Posts => "posts",
            SourceKind::Layouts => "layouts",
            SourceKind::Fragments => "fragments",
            SourceKind::Assets => "assets",
        }
    }

    /// Whether files of this kind become entities in the site store.
    pub fn is_entity(self) -> bool {
        !matches!(self, SourceKind::Assets)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of an output write.
///
/// `Unchanged` means the file already held identical bytes and was left
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}
