//! Reference Resolver
//!
//! Rewrites `${ModelName}` placeholders to the stable identifiers of models
//! compiled earlier in the build, then prepends the accumulated embed text so
//! every compile call is self-contained.

use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use regex::Regex;
use tracing::debug;

use crate::collect::EmbedSet;
use crate::error::{ComposeError, Result};
use crate::registry::ArtifactRegistry;
use crate::schema::{EmbedFragment, SchemaFile};

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}\s]*)\}").expect("placeholder pattern is valid"))
}

/// One `${Name}` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    /// Byte range of the whole `${Name}` token
    pub range: Range<usize>,
}

/// Find every placeholder in a text, in order of appearance
pub fn placeholders(text: &str) -> Vec<Placeholder> {
    placeholder_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let token = caps.get(0)?;
            let name = caps.get(1)?;
            Some(Placeholder {
                name: name.as_str().to_string(),
                range: token.range(),
            })
        })
        .collect()
}

/// Distinct placeholder names in order of first appearance
pub fn referenced_models(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    placeholders(text)
        .into_iter()
        .filter(|p| seen.insert(p.name.clone()))
        .map(|p| p.name)
        .collect()
}

/// Closest candidate to a misspelled model name
pub fn suggest<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let matcher = SkimMatcherV2::default();
    candidates
        .into_iter()
        .filter(|c| *c != name)
        .filter_map(|c| matcher.fuzzy_match(c, name).map(|score| (score, c)))
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(a.1)))
        .map(|(_, c)| c.to_string())
}

/// Substitute every placeholder in `file` with the registry identifier.
///
/// Any placeholder naming a model that is not in the registry is a
/// forward-reference error; nothing is substituted in that case.
pub fn resolve(file: &SchemaFile, registry: &ArtifactRegistry) -> Result<String> {
    substitute(&file.content, &file.path, registry)
}

/// Resolve the text of embeds before they are shared with later files
pub fn resolve_embeds(embeds: &[EmbedFragment], registry: &ArtifactRegistry) -> Result<Vec<EmbedFragment>> {
    embeds
        .iter()
        .map(|embed| {
            Ok(EmbedFragment {
                text: substitute(&embed.text, &embed.origin, registry)?,
                ..embed.clone()
            })
        })
        .collect()
}

fn substitute(text: &str, path: &Path, registry: &ArtifactRegistry) -> Result<String> {
    let mut resolved = String::with_capacity(text.len());
    let mut cursor = 0;

    for placeholder in placeholders(text) {
        let id = registry.id_of(&placeholder.name).ok_or_else(|| {
            ComposeError::ForwardReference {
                file: path.to_path_buf(),
                model: placeholder.name.clone(),
                suggestion: suggest(&placeholder.name, registry.names()),
            }
        })?;
        debug!(
            file = %path.display(),
            model = %placeholder.name,
            "filling model reference"
        );
        resolved.push_str(&text[cursor..placeholder.range.start]);
        resolved.push_str(id);
        cursor = placeholder.range.end;
    }
    resolved.push_str(&text[cursor..]);

    Ok(resolved)
}

/// Resolve a file and prepend the embeds it does not declare itself
pub fn prepare(
    file: &SchemaFile,
    declared: &HashSet<&str>,
    registry: &ArtifactRegistry,
    embeds: &EmbedSet,
) -> Result<String> {
    let resolved = resolve(file, registry)?;
    let prelude = embeds.prelude(declared);
    if prelude.is_empty() {
        Ok(resolved)
    } else {
        Ok(format!("{}\n{}", prelude, resolved))
    }
}
