mod common;
use crate::common::{PLAIN_LAYOUT, SiteFixture, init_tracing};

use std::error::Error;

use blogwatch::types::SourceKind;
use blogwatch::watch::{ChangeKind, FsChange, SourceHandler};

type TestResult = Result<(), Box<dyn Error>>;

fn plain_site() -> SiteFixture {
    let site = SiteFixture::new();
    site.layout("default", PLAIN_LAYOUT);
    site.post("2024-01-02-hello.md", "hello");
    site
}

#[tokio::test]
async fn renaming_a_post_moves_its_output() -> TestResult {
    init_tracing();
    let site = plain_site();
    let session = site.session();
    session.generate().await?;
    assert!(site.out("2024/01/02/hello.html").exists());

    let (from, to) = site.rename("posts/2024-01-02-hello.md", "posts/2024-02-03-hello.md");
    SourceHandler::new(SourceKind::Posts, session.clone())
        .handle_change(FsChange::renamed(from, to))
        .await;

    assert!(!site.out("2024/01/02/hello.html").exists());
    // The old day directory was left empty and is pruned; its parent is kept.
    assert!(!site.out("2024/01/02").exists());
    assert!(site.out("2024/01").exists());
    assert_eq!(
        site.read_out("2024/02/03/hello.html").as_deref(),
        Some("<article><p>hello</p>\n</article>")
    );
    assert_eq!(session.store().posts.len(), 1);
    Ok(())
}

#[tokio::test]
async fn rename_keeps_directory_with_other_outputs() -> TestResult {
    init_tracing();
    let site = plain_site();
    site.post("2024-01-02-other.md", "other");
    let session = site.session();
    session.generate().await?;

    let (from, to) = site.rename("posts/2024-01-02-hello.md", "posts/2024-01-05-hello.md");
    SourceHandler::new(SourceKind::Posts, session.clone())
        .handle_change(FsChange::renamed(from, to))
        .await;

    assert!(!site.out("2024/01/02/hello.html").exists());
    assert!(site.out("2024/01/02/other.html").exists());
    assert!(site.out("2024/01/05/hello.html").exists());
    Ok(())
}

#[tokio::test]
async fn post_creation_alone_is_ignored() -> TestResult {
    init_tracing();
    let site = plain_site();
    let session = site.session();
    session.generate().await?;

    let path = site.post("2024-03-01-new.md", "new");
    let handler = SourceHandler::new(SourceKind::Posts, session.clone());
    handler
        .handle_change(FsChange::new(&path, ChangeKind::Created))
        .await;
    assert!(!site.out("2024/03/01/new.html").exists());

    handler
        .handle_change(FsChange::new(&path, ChangeKind::Modified))
        .await;
    assert!(site.out("2024/03/01/new.html").exists());
    Ok(())
}

#[tokio::test]
async fn deleted_post_is_resolved_through_the_cache() -> TestResult {
    init_tracing();
    let site = plain_site();
    site.post("2024-01-02-titled.md", "---\ntitle: Something Else\n---\nx");
    let session = site.session();
    session.generate().await?;
    assert_eq!(session.store().posts.len(), 2);

    site.remove("posts/2024-01-02-titled.md");
    SourceHandler::new(SourceKind::Posts, session.clone())
        .handle_change(FsChange::new(site.root().join("posts/2024-01-02-titled.md"), ChangeKind::Removed))
        .await;

    assert_eq!(session.store().posts.len(), 1);
    assert!(!site.out("2024/01/02/titled.html").exists());
    assert!(site.out("2024/01/02/hello.html").exists());
    Ok(())
}

#[tokio::test]
async fn vanished_file_is_treated_as_removed() -> TestResult {
    init_tracing();
    let site = plain_site();
    let session = site.session();
    session.generate().await?;

    site.remove("posts/2024-01-02-hello.md");
    // A modify notification that arrives after the file is gone.
    SourceHandler::new(SourceKind::Posts, session.clone())
        .handle_change(FsChange::new(site.root().join("posts/2024-01-02-hello.md"), ChangeKind::Modified))
        .await;

    assert!(session.store().posts.is_empty());
    assert!(!site.out("2024/01/02/hello.html").exists());
    Ok(())
}

#[tokio::test]
async fn fragment_edit_reaches_posts_through_layouts() -> TestResult {
    init_tracing();
    let site = SiteFixture::new();
    site.layout("default", "{% nav %}{{ content }}");
    let nav = site.fragment("nav", "<nav>v1</nav>");
    site.post("2024-01-02-hello.html", "hello");
    let session = site.session();
    session.generate().await?;
    assert_eq!(site.read_out("2024/01/02/hello.html").as_deref(), Some("<nav>v1</nav>hello"));

    std::fs::write(&nav, "<nav>v2</nav>")?;
    SourceHandler::new(SourceKind::Fragments, session.clone())
        .handle_change(FsChange::new(&nav, ChangeKind::Modified))
        .await;
    assert_eq!(site.read_out("2024/01/02/hello.html").as_deref(), Some("<nav>v2</nav>hello"));

    std::fs::remove_file(&nav)?;
    SourceHandler::new(SourceKind::Fragments, session.clone())
        .handle_change(FsChange::new(&nav, ChangeKind::Removed))
        .await;
    assert_eq!(site.read_out("2024/01/02/hello.html").as_deref(), Some("hello"));
    Ok(())
}

#[tokio::test]
async fn deleting_the_post_layout_falls_back_to_default() -> TestResult {
    init_tracing();
    let site = plain_site();
    let fancy = site.layout("fancy", "<div class=\"fancy\">{{ content }}</div>");
    site.post("2024-01-03-styled.html", "---\nlayout: fancy\n---\nstyled");
    let session = site.session();
    session.generate().await?;
    assert_eq!(
        site.read_out("2024/01/03/styled.html").as_deref(),
        Some("<div class=\"fancy\">styled</div>")
    );

    std::fs::remove_file(&fancy)?;
    SourceHandler::new(SourceKind::Layouts, session.clone())
        .handle_change(FsChange::new(&fancy, ChangeKind::Removed))
        .await;

    assert_eq!(
        site.read_out("2024/01/03/styled.html").as_deref(),
        Some("<article>styled</article>")
    );
    Ok(())
}

#[tokio::test]
async fn asset_changes_are_mirrored() -> TestResult {
    init_tracing();
    let site = plain_site();
    let css = site.asset("css/site.css", "a{}");
    let session = site.session();
    session.generate().await?;
    let handler = SourceHandler::new(SourceKind::Assets, session.clone());

    std::fs::write(&css, "b{}")?;
    handler.handle_change(FsChange::new(&css, ChangeKind::Modified)).await;
    assert_eq!(site.read_out("css/site.css").as_deref(), Some("b{}"));

    let (from, to) = site.rename("wwwroot/css/site.css", "wwwroot/style/main.css");
    handler.handle_change(FsChange::renamed(from, to)).await;
    assert!(!site.out("css/site.css").exists());
    assert!(!site.out("css").exists());
    assert_eq!(site.read_out("style/main.css").as_deref(), Some("b{}"));

    site.remove("wwwroot/style/main.css");
    handler
        .handle_change(FsChange::new(site.root().join("wwwroot/style/main.css"), ChangeKind::Removed))
        .await;
    assert!(!site.out("style/main.css").exists());
    Ok(())
}
