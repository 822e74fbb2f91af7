//! Canonical category taxonomy and free-text label mapping.
//!
//! Source sites label their sections however they like ("Política Nacional",
//! "ECONOMÍA Y NEGOCIOS", "Fútbol peruano"). Every label is folded into one of
//! the canonical names below before it is stored.
//!
//! Matching algorithm: the label is lower-cased and accent-folded, then the
//! rules in [`CATEGORY_RULES`] are tried in order and the first rule whose
//! `needle` is a substring of the label wins. Labels matching no rule map to
//! [`DEFAULT_CATEGORY`]. New rules must use needles that do not occur inside
//! each other's target words (e.g. no `"nacional"`, which is a substring of
//! `"internacional"`); when that cannot be avoided, order decides.

use crate::text::fold_accents;

/// Category assigned to labels that match no rule, and to missing labels.
pub const DEFAULT_CATEGORY: &str = "General";

/// One ordered mapping step: a folded lower-case substring and the canonical
/// category it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub needle: &'static str,
    pub category: &'static str,
}

const fn rule(needle: &'static str, category: &'static str) -> CategoryRule {
    CategoryRule { needle, category }
}

pub const CATEGORY_RULES: &[CategoryRule] = &[
    rule("polit", "Política"),
    rule("econom", "Economía"),
    rule("negocio", "Economía"),
    rule("financ", "Economía"),
    rule("socied", "Sociedad"),
    rule("ciudad", "Sociedad"),
    rule("internac", "Internacional"),
    rule("mundo", "Internacional"),
    rule("deport", "Deportes"),
    rule("futbol", "Deportes"),
    rule("tecnolog", "Tecnología"),
    rule("ciencia", "Ciencia"),
    rule("cultur", "Cultura"),
    rule("espectac", "Espectáculos"),
    rule("entreten", "Espectáculos"),
    rule("farandul", "Espectáculos"),
    rule("salud", "Salud"),
    rule("educa", "Educación"),
];

/// Map a free-text category label onto the canonical taxonomy.
#[must_use]
pub fn map_category(label: &str) -> &'static str {
    let folded = fold_accents(&label.to_lowercase());
    CATEGORY_RULES
        .iter()
        .find(|r| folded.contains(r.needle))
        .map_or(DEFAULT_CATEGORY, |r| r.category)
}

/// Every canonical category name, in first-appearance rule order, followed by
/// [`DEFAULT_CATEGORY`].
#[must_use]
pub fn canonical_categories() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for r in CATEGORY_RULES {
        if !names.contains(&r.category) {
            names.push(r.category);
        }
    }
    names.push(DEFAULT_CATEGORY);
    names
}
