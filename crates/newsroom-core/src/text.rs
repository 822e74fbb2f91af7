//! Pure text helpers shared by the normalizer and the promotion step.

/// Titles longer than this many characters are truncated for the excerpt.
pub const EXCERPT_MAX_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

/// Maximum length of a generated article slug.
pub const SLUG_MAX_LEN: usize = 100;

/// Collapse every run of whitespace (including newlines and non-breaking
/// spaces) into a single space and trim both ends.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replace Latin accented letters with their unaccented ASCII base letter.
///
/// Characters without a mapping are returned unchanged.
#[must_use]
pub fn fold_accents(input: &str) -> String {
    input.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Derive the excerpt for a candidate from its title.
///
/// Titles within [`EXCERPT_MAX_CHARS`] are used verbatim. Longer titles are cut
/// so that the excerpt plus a trailing `...` is exactly the threshold.
#[must_use]
pub fn make_excerpt(title: &str) -> String {
    if title.chars().count() <= EXCERPT_MAX_CHARS {
        return title.to_string();
    }

    let keep = EXCERPT_MAX_CHARS - ELLIPSIS.len();
    let mut excerpt: String = title.chars().take(keep).collect();
    excerpt.push_str(ELLIPSIS);
    excerpt
}

/// Generate a URL-safe slug from an article title.
///
/// Lower-cases, folds accents, drops anything that is not an ASCII letter or
/// digit, and joins the remaining words with single hyphens. The result never
/// starts or ends with a hyphen and is at most [`SLUG_MAX_LEN`] bytes.
#[must_use]
pub fn slugify(title: &str) -> String {
    let folded = fold_accents(&title.to_lowercase());

    let spaced: String = folded
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some(' ')
            } else {
                None
            }
        })
        .collect();

    let mut slug = spaced.split_whitespace().collect::<Vec<_>>().join("-");
    if slug.len() > SLUG_MAX_LEN {
        // Only ASCII survives the filter above, so byte truncation is safe.
        slug.truncate(SLUG_MAX_LEN);
        let trimmed = slug.trim_end_matches('-').len();
        slug.truncate(trimmed);
    }
    slug
}

/// The `attempt`-th slug to try when publishing staged row `staged_id`.
///
/// Attempt 0 is the base slug, attempt 1 appends the staged id, and later
/// attempts append a counter after it: `nota`, `nota-3`, `nota-3-2`, ...
#[must_use]
pub fn slug_candidate(base: &str, staged_id: i64, attempt: u32) -> String {
    match attempt {
        0 => base.to_owned(),
        1 => format!("{base}-{staged_id}"),
        n => format!("{base}-{staged_id}-{n}"),
    }
}
