// src/site/entity.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::template::context::TemplateValue;
use crate::template::deps::fragment_dependencies;

/// Scalar frontmatter values keyed by their metadata name.
pub type Metadata = BTreeMap<String, TemplateValue>;

/// Something the entity cache can store.
///
/// The key is computed from the value but is a separate, immutable type, so
/// stores never rely on equality of the mutable value itself.
pub trait Entity: Clone + Send + Sync + 'static {
    type Key: Clone + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

/// Reusable snippet embedded into layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    name: String,
    content: String,
}

impl Fragment {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Entity for Fragment {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// Named template wrapping post content.
///
/// `fragment_dependencies` is derived from `content` in the constructor and
/// cannot be set any other way.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    name: String,
    content: String,
    fragment_dependencies: BTreeSet<String>,
}

impl Layout {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let fragment_dependencies = fragment_dependencies(&content);
        Self {
            name: name.into(),
            content,
            fragment_dependencies,
        }
    }

    /// Layout used when neither the requested nor the default layout exists.
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new(name, "{{ content }}")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn fragment_dependencies(&self) -> &BTreeSet<String> {
        &self.fragment_dependencies
    }

    pub fn depends_on(&self, fragment: &str) -> bool {
        self.fragment_dependencies.contains(fragment)
    }
}

impl Entity for Layout {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// Identity of a post: its logical title and creation date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostKey {
    pub title: String,
    pub created_at: NaiveDate,
}

impl PostKey {
    pub fn new(title: impl Into<String>, created_at: NaiveDate) -> Self {
        Self {
            title: title.into(),
            created_at,
        }
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.created_at.format("%Y-%m-%d"))
    }
}

/// A single content item with a computed output location.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub key: PostKey,
    pub layout_name: String,
    pub body: String,
    pub markdown: bool,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub updated_at: Option<NaiveDate>,
    /// Frontmatter scalars not consumed by the fields above.
    pub metadata: Metadata,
}

impl Post {
    pub fn title(&self) -> &str {
        &self.key.title
    }

    pub fn created_at(&self) -> NaiveDate {
        self.key.created_at
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

impl Entity for Post {
    type Key = PostKey;

    fn key(&self) -> PostKey {
        self.key.clone()
    }
}
