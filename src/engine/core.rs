// src/engine/core.rs

//! Pure change planning.
//!
//! [`apply_change`] mutates the entity cache for one [`ChangeEvent`] and
//! returns the resulting [`BuildCommand`]s. It performs no IO and spawns
//! nothing, so propagation rules are testable against a bare `SiteStore`.

use std::collections::BTreeSet;

use tracing::debug;

use crate::engine::{BuildCommand, ChangeEvent};
use crate::site::entity::PostKey;
use crate::site::store::SiteStore;

/// Commands produced by one change, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeStep {
    pub commands: Vec<BuildCommand>,
}

impl ChangeStep {
    fn push_removal(&mut self, path: std::path::PathBuf) {
        self.commands.push(BuildCommand::RemoveOutput(path));
    }

    fn push_renders(&mut self, keys: Vec<PostKey>) {
        if !keys.is_empty() {
            self.commands.push(BuildCommand::RenderPosts(keys));
        }
    }

    /// Every post this step re-renders.
    pub fn rendered_keys(&self) -> Vec<&PostKey> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                BuildCommand::RenderPosts(keys) => Some(keys.iter()),
                BuildCommand::RemoveOutput(_) => None,
            })
            .flatten()
            .collect()
    }
}

/// Apply `change` to `store` and plan the follow-up work.
pub fn apply_change(store: &SiteStore, default_layout: &str, change: ChangeEvent) -> ChangeStep {
    let mut step = ChangeStep::default();

    match change {
        ChangeEvent::FragmentChanged(fragment) => {
            let name = fragment.name().to_string();
            store.fragments.upsert(fragment);
            step.push_renders(fragment_dependents(store, default_layout, &name));
        }
        ChangeEvent::FragmentRemoved(name) => {
            if store.fragments.remove(&name).is_none() {
                debug!(fragment = %name, "removed fragment was not cached");
            }
            step.push_renders(fragment_dependents(store, default_layout, &name));
        }
        ChangeEvent::LayoutChanged(layout) => {
            let name = layout.name().to_string();
            store.layouts.upsert(layout);
            step.push_renders(store.posts_rendered_with(&name, default_layout));
        }
        ChangeEvent::LayoutRemoved(name) => {
            // Collect before removal: afterwards posts naming it no longer
            // fall under the default layout's fallback set.
            let dependents = store.posts_rendered_with(&name, default_layout);
            if store.layouts.remove(&name).is_none() {
                debug!(layout = %name, "removed layout was not cached");
            }
            step.push_renders(dependents);
        }
        ChangeEvent::PostChanged(post) => {
            let key = post.key.clone();
            let input = post.input_path.clone();
            let output = post.output_path.clone();

            // The same source file may previously have produced a different
            // identity (edited title or date); that entity is gone now.
            for old in store.posts.find_where(|p| p.input_path == input && p.key != key) {
                store.posts.remove(&old.key);
                if old.output_path != output {
                    step.push_removal(old.output_path);
                }
            }

            if let Some(previous) = store.posts.upsert(post) {
                if previous.output_path != output {
                    step.push_removal(previous.output_path);
                }
            }
            step.push_renders(vec![key]);
        }
        ChangeEvent::PostRemoved { key, input_path } => {
            match store.posts.remove_if(&key, |p| p.input_path == input_path) {
                Some(post) => step.push_removal(post.output_path),
                None => debug!(
                    post = %key,
                    path = %input_path.display(),
                    "removed post was not cached from this file"
                ),
            }
        }
    }

    step
}

/// Keys of every cached post, for the initial render pass.
pub fn full_render(store: &SiteStore) -> ChangeStep {
    let mut keys: Vec<PostKey> = store.posts.all().into_iter().map(|p| p.key).collect();
    keys.sort();
    let mut step = ChangeStep::default();
    step.push_renders(keys);
    step
}

/// Posts reachable from fragment `name` through the layouts embedding it.
fn fragment_dependents(store: &SiteStore, default_layout: &str, name: &str) -> Vec<PostKey> {
    let keys: BTreeSet<PostKey> = store
        .layouts_depending_on(name)
        .iter()
        .flat_map(|layout| store.posts_rendered_with(layout, default_layout))
        .collect();
    keys.into_iter().collect()
}
