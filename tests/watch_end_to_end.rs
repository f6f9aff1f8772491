mod common;
use crate::common::{SiteConfigBuilder, SiteFixture, eventually, init_tracing};

use std::error::Error;
use std::fs;

use tokio::time::{Duration, sleep};

use blogwatch::types::SourceKind;
use blogwatch::watch::spawn_site_watchers;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watched_site_follows_source_edits() -> TestResult {
    init_tracing();
    let site = SiteFixture::new().with_config(SiteConfigBuilder::new().debounce_ms(50));
    site.layout("default", "{% nav %}{{ content }}");
    let nav = site.fragment("nav", "<nav>v1</nav>");
    site.post("2024-01-02-hello.html", "hello");

    let session = site.session();
    session.generate().await?;
    assert_eq!(site.read_out("2024/01/02/hello.html").as_deref(), Some("<nav>v1</nav>hello"));

    let watchers = spawn_site_watchers(&session)?;
    assert_eq!(watchers.len(), 4);
    assert!(watchers.iter().all(|w| w.dir().starts_with(site.root())));
    assert!(watchers.iter().any(|w| w.kind() == SourceKind::Assets));
    // Give the backends a moment to register.
    sleep(Duration::from_millis(200)).await;

    fs::write(&nav, "<nav>v2</nav>")?;
    assert!(
        eventually(|| site.read_out("2024/01/02/hello.html").as_deref() == Some("<nav>v2</nav>hello")).await,
        "fragment edit was not propagated"
    );

    site.post("2024-01-03-second.html", "second");
    assert!(
        eventually(|| site.read_out("2024/01/03/second.html").is_some()).await,
        "new post was not rendered"
    );

    site.remove("posts/2024-01-02-hello.html");
    assert!(
        eventually(|| !site.out("2024/01/02/hello.html").exists()).await,
        "deleted post output was not removed"
    );

    site.asset("img/a.txt", "asset");
    assert!(
        eventually(|| site.read_out("img/a.txt").as_deref() == Some("asset")).await,
        "asset was not copied"
    );

    drop(watchers);
    Ok(())
}
