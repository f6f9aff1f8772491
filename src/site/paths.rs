// src/site/paths.rs

//! Post file-name conventions and output path derivation.
//!
//! `2024-01-02-hello-world.md` → date 2024-01-02, slug `hello-world`,
//! output `{out}/2024/01/02/hello-world.html`.

use std::path::{Component, Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::errors::{BlogwatchError, Result};

/// Date and slug encoded in a post's file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFileName {
    pub date: Option<NaiveDate>,
    pub slug: String,
}

/// Split a post file name into its optional date prefix and slug.
///
/// A prefix only counts when it is a real calendar date followed by a
/// non-empty slug; otherwise the whole stem is the slug.
pub fn parse_post_file_name(path: &Path) -> PostFileName {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut parts = stem.splitn(4, '-');
    if let (Some(y), Some(m), Some(d), Some(slug)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    {
        let digits = |s: &str, max: usize| {
            !s.is_empty() && s.len() <= max && s.bytes().all(|b| b.is_ascii_digit())
        };
        let date = match (y.parse::<i32>(), m.parse::<u32>(), d.parse::<u32>()) {
            (Ok(yy), Ok(mm), Ok(dd)) if y.len() == 4 && digits(y, 4) && digits(m, 2) && digits(d, 2) => {
                NaiveDate::from_ymd_opt(yy, mm, dd)
            }
            _ => None,
        };
        if let Some(date) = date.filter(|_| !slug.is_empty()) {
            return PostFileName {
                date: Some(date),
                slug: slug.to_string(),
            };
        }
    }

    PostFileName {
        date: None,
        slug: stem,
    }
}

/// `{out}/{YYYY}/{MM}/{DD}/{slug}.html`
pub fn dated_output_path(out_dir: &Path, date: NaiveDate, slug: &str) -> PathBuf {
    out_dir
        .join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
        .join(format!("{:02}", date.day()))
        .join(format!("{slug}.html"))
}

/// `{out}/{staticPath}`, rejecting anything that would escape `out_dir`.
pub fn static_output_path(out_dir: &Path, input: &Path, static_path: &str) -> Result<PathBuf> {
    let rel = Path::new(static_path.trim().trim_start_matches(['/', '\\']));
    let escapes = rel.as_os_str().is_empty()
        || rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(BlogwatchError::InvalidStaticPath {
            path: input.to_path_buf(),
            static_path: static_path.to_string(),
        });
    }
    Ok(out_dir.join(rel))
}

/// Output location of a post.
///
/// An explicit `staticPath` wins; otherwise the file-name date is used.
/// Neither is fatal for this one file.
pub fn resolve_output_path(
    out_dir: &Path,
    input: &Path,
    file_name: &PostFileName,
    static_path: Option<&str>,
) -> Result<PathBuf> {
    match (static_path, file_name.date) {
        (Some(sp), _) => static_output_path(out_dir, input, sp),
        (None, Some(date)) => Ok(dated_output_path(out_dir, date, &file_name.slug)),
        (None, None) => Err(BlogwatchError::UnresolvableOutputPath {
            path: input.to_path_buf(),
        }),
    }
}

/// Whether `path` is rendered through markdown.
pub fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("md" | "markdown")
    )
}

/// Entity name of a layout or fragment file (its stem).
pub fn entity_name(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}
