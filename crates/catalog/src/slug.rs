//! URL-safe slugs for service names.
//!
//! Computing a slug is split in two pure halves: [`slugify`] turns a name
//! into a base slug, and [`next_available_slug`] picks the first free variant
//! of that base given a snapshot of slugs already taken in the salon.

use std::collections::HashSet;

/// Longest base slug, before any numeric suffix is appended.
pub const MAX_SLUG_LENGTH: usize = 60;

/// Slug used when a name has no usable characters.
pub const FALLBACK_SLUG: &str = "service";

/// Converts a display name into a base slug.
///
/// Lower-cases the name, replaces each run of non-alphanumeric characters
/// with one hyphen, strips leading and trailing hyphens and truncates to
/// [`MAX_SLUG_LENGTH`] characters.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);
    // A cut that lands on a separator must not leave it dangling.
    let kept = slug.trim_end_matches('-').len();
    slug.truncate(kept);

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Returns `base` if it is not taken, else `base-2`, `base-3`, ... whichever
/// is free first. Comparison ignores case.
pub fn next_available_slug<I, S>(base: &str, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let taken: HashSet<String> = existing
        .into_iter()
        .map(|slug| slug.as_ref().to_lowercase())
        .collect();

    if !taken.contains(base) {
        return base.to_string();
    }

    (2u64..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
