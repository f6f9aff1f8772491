use std::collections::BTreeSet;
use std::path::PathBuf;

use proptest::prelude::*;

use blogwatch::engine::{ChangeEvent, apply_change};
use blogwatch::site::{Fragment, Layout, Metadata, Post, PostKey, SiteStore};

const FRAGMENTS: usize = 4;
const LAYOUTS: usize = 4;
const DEFAULT: &str = "layout_0";

#[derive(Debug, Clone)]
struct Site {
    /// For each layout, the fragment indices it embeds.
    layouts: Vec<BTreeSet<usize>>,
    /// For each post, the layout index it names (may be past `LAYOUTS`,
    /// i.e. a missing layout).
    posts: Vec<usize>,
}

fn site_strategy() -> impl Strategy<Value = Site> {
    (
        proptest::collection::vec(proptest::collection::btree_set(0..FRAGMENTS, 0..=FRAGMENTS), LAYOUTS),
        proptest::collection::vec(0..LAYOUTS + 2, 0..12),
    )
        .prop_map(|(layouts, posts)| Site { layouts, posts })
}

fn build_store(site: &Site) -> SiteStore {
    let store = SiteStore::new();
    for (i, deps) in site.layouts.iter().enumerate() {
        let content: String = deps.iter().map(|f| format!("{{% frag_{f} %}}")).collect();
        store.layouts.upsert(Layout::new(format!("layout_{i}"), content + "{{ content }}"));
    }
    for f in 0..FRAGMENTS {
        store.fragments.upsert(Fragment::new(format!("frag_{f}"), "x"));
    }
    for (i, layout) in site.posts.iter().enumerate() {
        store.posts.upsert(Post {
            key: PostKey::new(format!("post_{i:02}"), "2024-01-01".parse().unwrap()),
            layout_name: format!("layout_{layout}"),
            body: String::new(),
            markdown: false,
            input_path: PathBuf::from(format!("posts/{i}.html")),
            output_path: PathBuf::from(format!("out/{i}.html")),
            updated_at: None,
            metadata: Metadata::new(),
        });
    }
    store
}

/// Brute force: a post is affected when the layout it is rendered with
/// embeds the fragment.
fn expected(site: &Site, fragment: usize) -> Vec<String> {
    site.posts
        .iter()
        .enumerate()
        .filter(|(_, layout)| {
            let effective = if **layout < LAYOUTS { **layout } else { 0 };
            site.layouts[effective].contains(&fragment)
        })
        .map(|(i, _)| format!("post_{i:02}"))
        .collect()
}

proptest! {
    #[test]
    fn fragment_change_reaches_exactly_the_dependent_posts(
        site in site_strategy(),
        fragment in 0..FRAGMENTS,
    ) {
        let store = build_store(&site);
        let step = apply_change(
            &store,
            DEFAULT,
            ChangeEvent::FragmentChanged(Fragment::new(format!("frag_{fragment}"), "y")),
        );

        let titles: Vec<String> = step.rendered_keys().into_iter().map(|k| k.title.clone()).collect();
        prop_assert_eq!(titles, expected(&site, fragment));
    }

    #[test]
    fn layout_removal_reaches_exactly_its_posts(
        site in site_strategy(),
        layout in 0..LAYOUTS,
    ) {
        let store = build_store(&site);
        let step = apply_change(&store, DEFAULT, ChangeEvent::LayoutRemoved(format!("layout_{layout}")));

        let titles: BTreeSet<String> = step.rendered_keys().into_iter().map(|k| k.title.clone()).collect();
        let want: BTreeSet<String> = site
            .posts
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == layout || (layout == 0 && **l >= LAYOUTS))
            .map(|(i, _)| format!("post_{i:02}"))
            .collect();
        prop_assert_eq!(titles, want);
    }
}
