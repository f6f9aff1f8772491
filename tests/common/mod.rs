#![allow(dead_code, unused_imports)]

pub use blogwatch_test_utils::builders::{SiteConfigBuilder, SiteFixture};
pub use blogwatch_test_utils::recording::RecordingHandler;
pub use blogwatch_test_utils::{eventually, init_tracing, with_timeout};

/// Layout wrapping content in a page with a header fragment.
pub const PAGE_LAYOUT: &str =
    "<html><title>{{ post.title }}</title>{% header %}<main>{{ content }}</main></html>";

/// Layout with no fragments.
pub const PLAIN_LAYOUT: &str = "<article>{{ content }}</article>";
