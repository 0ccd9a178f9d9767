use std::path::Path;

use crate::error::SyncError;

/// Canonical slug form: lowercase ASCII alphanumerics separated by single
/// dashes, with no leading or trailing dash.
pub fn normalize_slug(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Accept `slug` only if it is already in canonical form.
///
/// The slug is never corrected: the error carries the suggested form.
pub fn validate_slug(slug: &str) -> Result<&str, SyncError> {
    let normalized = normalize_slug(slug);
    if normalized.is_empty() || normalized != slug {
        return Err(SyncError::InvalidSlug {
            slug: slug.to_string(),
            suggestion: normalized,
        });
    }
    Ok(slug)
}

/// Outcome of reconciling a notebook title with its slug.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TitleDecision {
    /// The title already normalizes to the slug.
    Kept(String),
    /// The title did not match and was replaced by one derived from the slug.
    Replaced { original: String, title: String },
}

impl TitleDecision {
    pub fn title(&self) -> &str {
        match self {
            TitleDecision::Kept(title) | TitleDecision::Replaced { title, .. } => title,
        }
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self, TitleDecision::Replaced { .. })
    }
}

/// Keep `title` if it normalizes to `slug`, else derive one from the slug.
pub fn reconcile_title(title: &str, slug: &str) -> TitleDecision {
    if normalize_slug(title) == slug {
        return TitleDecision::Kept(title.to_string());
    }
    TitleDecision::Replaced {
        original: title.to_string(),
        title: title_case(&slug.replace('-', " ")),
    }
}

/// Title derived from a notebook file name, e.g. `titanic_eda.ipynb` becomes
/// `Titanic Eda`.
pub fn default_title(notebook: &Path) -> String {
    let stem = notebook
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    title_case(&stem.replace(['_', '-'], " "))
}

/// Word capitalisation where every letter that follows a non-letter starts a
/// new word, so `v2x` becomes `V2X`.
fn title_case(value: &str) -> String {
    let mut title = String::with_capacity(value.len());

    for word in value.split_whitespace() {
        if !title.is_empty() {
            title.push(' ');
        }
        let mut after_letter = false;
        for ch in word.chars() {
            if ch.is_alphabetic() {
                if after_letter {
                    title.extend(ch.to_lowercase());
                } else {
                    title.extend(ch.to_uppercase());
                }
                after_letter = true;
            } else {
                title.push(ch);
                after_letter = false;
            }
        }
    }

    title
}

/// Entry point for fuzzing slug validation.
#[cfg(feature = "fuzzing")]
pub fn fuzz_validate_slug(value: &str) -> Result<(), SyncError> {
    validate_slug(value).map(|_| ())
}
