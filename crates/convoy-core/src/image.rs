use crate::error::{ConvoyError, Result};

/// Default tag for republish targets declared without one. Never applied to
/// the primary deploy image.
pub const DEFAULT_TARGET_TAG: &str = "latest";

/// Inputs to image resolution for a single service.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRequest<'a> {
    /// Run-level `--container-image`.
    pub override_image: Option<&'a str>,
    /// Run-level `--tag`.
    pub tag: Option<&'a str>,
    pub force: bool,
}

/// Resolve the image literal to deploy for one service.
///
/// Precedence: explicit override, then (when forcing without a tag) the
/// active container's image as-is, then the service's declared registry.
/// A tag is appended with exactly one `:` and is rejected when the base
/// already carries one.
pub fn resolve_target_image(
    service: &str,
    declared: &str,
    active: &str,
    request: ImageRequest<'_>,
) -> Result<String> {
    let tag = request.tag.map(normalize_tag).filter(|t| !t.is_empty());

    let base = match request.override_image.filter(|i| !i.is_empty()) {
        Some(image) => image,
        None if request.force && tag.is_none() && !active.is_empty() => active,
        None if !declared.is_empty() => declared,
        None => return Err(ConvoyError::NoImageSource(service.to_string())),
    };

    match tag {
        Some(tag) => with_tag(base, tag),
        None => Ok(base.to_string()),
    }
}

/// Append `tag` to `base`, failing if `base` is already tagged.
pub fn with_tag(base: &str, tag: &str) -> Result<String> {
    if has_tag(base) {
        return Err(ConvoyError::AmbiguousImageReference(base.to_string()));
    }
    Ok(format!("{base}:{}", normalize_tag(tag)))
}

/// `true` when the reference names a tag. A `:` inside the registry host
/// (`registry:5000/app`) is a port, not a tag.
pub fn has_tag(reference: &str) -> bool {
    let last = reference.rsplit('/').next().unwrap_or(reference);
    last.contains(':')
}

fn normalize_tag(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix(':').unwrap_or(tag)
}

/// Split a republish target `repo[:tag]` into its repository name and tag,
/// defaulting the tag to `latest`.
pub fn split_repository(name: &str) -> (&str, &str) {
    match name.split_once(':') {
        Some((repo, tag)) if !tag.is_empty() => (repo, tag),
        Some((repo, _)) => (repo, DEFAULT_TARGET_TAG),
        None => (name, DEFAULT_TARGET_TAG),
    }
}

/// Full reference of a republished image: `repositoryUri:tag`.
pub fn target_reference(repository_uri: &str, declared_name: &str) -> String {
    let (_, tag) = split_repository(declared_name);
    format!("{repository_uri}:{tag}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
