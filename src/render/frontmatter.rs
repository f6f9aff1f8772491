// src/render/frontmatter.rs

use std::fmt::Debug;

use anyhow::{Result, anyhow};
use serde_yaml_ng::Value;
use tracing::debug;

use crate::site::entity::Metadata;
use crate::template::context::TemplateValue;

/// Delimiter for frontmatter sections
const FRONTMATTER_DELIMITER: &str = "---";

/// Metadata block and body of a source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFrontmatter {
    pub metadata: Metadata,
    pub body: String,
}

pub trait FrontmatterParser: Send + Sync + Debug {
    /// Split `raw` into metadata and body.
    ///
    /// Text without a frontmatter block is all body. Only a block that is
    /// present but unparsable is an error.
    fn extract(&self, raw: &str) -> Result<ExtractedFrontmatter>;
}

/// `---` delimited YAML frontmatter. JSON objects are valid YAML, so
/// `{"layout": "post"}` blocks work too.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFrontmatter;

impl FrontmatterParser for YamlFrontmatter {
    fn extract(&self, raw: &str) -> Result<ExtractedFrontmatter> {
        let Some((yaml, body)) = split_block(raw) else {
            return Ok(ExtractedFrontmatter {
                metadata: Metadata::new(),
                body: raw.to_string(),
            });
        };

        let metadata = if yaml.trim().is_empty() {
            Metadata::new()
        } else {
            let value: Value = serde_yaml_ng::from_str(yaml)?;
            to_metadata(value)?
        };

        Ok(ExtractedFrontmatter {
            metadata,
            body: body.trim().to_string(),
        })
    }
}

/// Locate a frontmatter block at the very start of `raw`.
///
/// Returns `(block, body)`; `None` when the file does not start with a
/// delimiter line or the block is never closed.
fn split_block(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let first_end = raw.find('\n')?;
    if raw[..first_end].trim() != FRONTMATTER_DELIMITER {
        return None;
    }

    let block_start = first_end + 1;
    let mut offset = block_start;
    for line in raw[block_start..].split_inclusive('\n') {
        if line.trim() == FRONTMATTER_DELIMITER {
            let body_start = offset + line.len();
            return Some((&raw[block_start..offset], &raw[body_start..]));
        }
        offset += line.len();
    }
    None
}

fn to_metadata(value: Value) -> Result<Metadata> {
    let Value::Mapping(map) = value else {
        return Err(anyhow!("frontmatter must be a key/value mapping"));
    };

    let mut metadata = Metadata::new();
    for (key, value) in map {
        let Some(key) = key.as_str().map(str::to_string) else {
            debug!(?key, "skipping non-string frontmatter key");
            continue;
        };
        match scalar(value) {
            Some(v) => {
                metadata.insert(key, v);
            }
            None => debug!(key = %key, "skipping non-scalar frontmatter value"),
        }
    }
    Ok(metadata)
}

fn scalar(value: Value) -> Option<TemplateValue> {
    match value {
        Value::String(s) => Some(TemplateValue::Str(s)),
        Value::Bool(b) => Some(TemplateValue::Bool(b)),
        Value::Number(n) => n.as_f64().map(TemplateValue::Num),
        Value::Tagged(tagged) => scalar(tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
