use std::path::{Path, PathBuf};

use blogwatch::render::{CommonMarkRenderer, FrontmatterParser, MarkdownRenderer, RenderPipeline, RenderWarning, YamlFrontmatter, post_context};
use blogwatch::site::{Fragment, Layout, Metadata, Post, PostKey};
use blogwatch::template::tokens::{embed_tokens, is_valid_name};
use blogwatch::template::{EvalError, SimpleEvaluator, TemplateContext, TemplateEvaluator, TemplateValue, fragment_dependencies};

fn ctx() -> TemplateContext {
    let mut ctx = TemplateContext::new();
    ctx.insert("post.title", "Hello");
    ctx.insert("post.draft", false);
    ctx.insert("props.level", 3.0);
    ctx
}

#[test]
fn dependency_extraction_is_single_level_and_distinct() {
    let deps = fragment_dependencies("{% a %}{% b x=1 %}{% a y=\"z\" %}{{ a }}{%bad token%}");
    let deps: Vec<String> = deps.into_iter().collect();
    assert_eq!(deps, vec!["a".to_string(), "b".to_string()]);
    assert!(fragment_dependencies("no tokens").is_empty());
}

#[test]
fn embed_tokens_parse_typed_props() {
    let tokens: Vec<_> = embed_tokens(r#"{% card title="Hi there" n=2 on=true raw=abc %}"#).collect();
    assert_eq!(tokens.len(), 1);
    let props = &tokens[0].props;
    assert_eq!(tokens[0].name, "card");
    assert_eq!(props["title"], TemplateValue::Str("Hi there".into()));
    assert_eq!(props["n"], TemplateValue::Num(2.0));
    assert_eq!(props["on"], TemplateValue::Bool(true));
    assert_eq!(props["raw"], TemplateValue::Str("abc".into()));
}

#[test]
fn evaluator_resolves_paths_literals_and_fallbacks() {
    let eval = SimpleEvaluator;
    let ctx = ctx();

    assert_eq!(eval.evaluate("post.title", &ctx), Ok(TemplateValue::Str("Hello".into())));
    assert_eq!(eval.evaluate("post.draft", &ctx), Ok(TemplateValue::Bool(false)));
    assert_eq!(eval.evaluate("props.level", &ctx).unwrap().to_string(), "3");
    assert_eq!(eval.evaluate("'single'", &ctx), Ok(TemplateValue::Str("single".into())));
    assert_eq!(eval.evaluate("1.5", &ctx).unwrap().to_string(), "1.5");
    assert_eq!(
        eval.evaluate("post.subtitle ?? post.title", &ctx),
        Ok(TemplateValue::Str("Hello".into()))
    );
    assert_eq!(
        eval.evaluate(r#"post.a ?? post.b ?? "x ?? y""#, &ctx),
        Ok(TemplateValue::Str("x ?? y".into()))
    );
}

#[test]
fn evaluator_reports_failures() {
    let eval = SimpleEvaluator;
    let ctx = ctx();

    assert_eq!(eval.evaluate("   ", &ctx), Err(EvalError::Empty));
    assert_eq!(
        eval.evaluate("post.missing", &ctx),
        Err(EvalError::Undefined("post.missing".into()))
    );
    assert!(matches!(eval.evaluate("1 + 1", &ctx), Err(EvalError::Unsupported(_))));
    // Syntax errors do not fall through to the fallback.
    assert!(matches!(eval.evaluate("a b ?? 'x'", &ctx), Err(EvalError::Unsupported(_))));
}

#[test]
fn names_use_the_embed_alphabet() {
    assert!(is_valid_name("site-header_2"));
    assert!(!is_valid_name(""));
    assert!(!is_valid_name("with space"));
    assert!(!is_valid_name("dot.html"));
}

#[test]
fn frontmatter_yaml_and_json_blocks() {
    let parser = YamlFrontmatter;

    let yaml = parser
        .extract("---\nlayout: post\ncount: 3\ntags: [a, b]\n---\n\nBody text\n")
        .unwrap();
    assert_eq!(yaml.metadata["layout"], TemplateValue::Str("post".into()));
    assert_eq!(yaml.metadata["count"], TemplateValue::Num(3.0));
    assert!(!yaml.metadata.contains_key("tags"));
    assert_eq!(yaml.body, "Body text");

    let json = parser.extract("---\n{\"title\": \"J\", \"draft\": true}\n---\nB").unwrap();
    assert_eq!(json.metadata["title"], TemplateValue::Str("J".into()));
    assert_eq!(json.metadata["draft"], TemplateValue::Bool(true));
}

#[test]
fn frontmatter_absent_or_unclosed_is_all_body() {
    let parser = YamlFrontmatter;

    let none = parser.extract("just text\n---\nmore").unwrap();
    assert!(none.metadata.is_empty());
    assert_eq!(none.body, "just text\n---\nmore");

    let unclosed = parser.extract("---\ntitle: x\nno end").unwrap();
    assert!(unclosed.metadata.is_empty());
    assert_eq!(unclosed.body, "---\ntitle: x\nno end");

    assert!(parser.extract("---\n- a list\n---\nbody").is_err());
}

#[test]
fn markdown_renders_tables_and_strikethrough() {
    let html = CommonMarkRenderer.render("|a|b|\n|-|-|\n|1|2|\n\n~~gone~~");
    assert!(html.contains("<table>"));
    assert!(html.contains("<del>gone</del>"));
}

fn sample_post(markdown: bool, body: &str) -> Post {
    let mut metadata = Metadata::new();
    metadata.insert("author".into(), TemplateValue::Str("Ada".into()));
    // Fixed keys win over custom metadata with the same name.
    metadata.insert("title".into(), TemplateValue::Str("ignored".into()));
    Post {
        key: PostKey::new("Hello", "2024-01-02".parse().unwrap()),
        layout_name: "default".into(),
        body: body.into(),
        markdown,
        input_path: PathBuf::from("posts/2024-01-02-hello.md"),
        output_path: PathBuf::from("publish/2024/01/02/hello.html"),
        updated_at: None,
        metadata,
    }
}

#[test]
fn post_context_exposes_post_and_layout_keys() {
    let ctx = post_context(&sample_post(false, "b"), "default", "<p>b</p>", Path::new("publish"));

    assert_eq!(ctx.get("post.title"), Some(&TemplateValue::Str("Hello".into())));
    assert_eq!(ctx.get("post.author"), Some(&TemplateValue::Str("Ada".into())));
    assert_eq!(ctx.get("post.createdAt"), Some(&TemplateValue::Str("2024-01-02".into())));
    assert_eq!(ctx.get("post.url"), Some(&TemplateValue::Str("/2024/01/02/hello.html".into())));
    assert_eq!(ctx.get("layout.name"), Some(&TemplateValue::Str("default".into())));
    assert_eq!(ctx.get("content"), Some(&TemplateValue::Str("<p>b</p>".into())));
    assert!(ctx.get("post.updatedAt").is_none());
}

#[test]
fn pipeline_never_fails_and_collects_warnings() {
    let pipeline = RenderPipeline::default();
    let layout = Layout::new(
        "default",
        "{% head %}{% missing %}<h1>{{ post.title }}</h1>{{ nope }}{{ content }}",
    );
    let head = Fragment::new("head", "<meta name=\"a\" content=\"{{ post.author }}\">");

    let rendered = pipeline.render_post(
        &sample_post(true, "*hi*"),
        &layout,
        |name| (name == "head").then(|| head.clone()),
        Path::new("publish"),
    );

    assert_eq!(
        rendered.html,
        "<meta name=\"a\" content=\"Ada\"><h1>Hello</h1><p><em>hi</em></p>\n"
    );
    assert_eq!(
        rendered.warnings,
        vec![
            RenderWarning::MissingFragment { name: "missing".into() },
            RenderWarning::ExpressionFailed {
                expr: "nope".into(),
                error: EvalError::Undefined("nope".into()),
            },
        ]
    );
}

#[test]
fn fragment_props_are_scoped_to_their_embed() {
    let pipeline = RenderPipeline::default();
    let layout = Layout::new("l", r#"{% h level=1 %}{% h level=2 %}{{ props.level ?? "none" }}"#);
    let h = Fragment::new("h", "[{{ props.level }}]");

    let rendered = pipeline.render_post(
        &sample_post(false, ""),
        &layout,
        |_| Some(h.clone()),
        Path::new("publish"),
    );
    assert_eq!(rendered.html, "[1][2]none");
    assert!(rendered.warnings.is_empty());
}
