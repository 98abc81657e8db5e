//! Slug canonicalization shared by every dataset source.
//!
//! Suburb and cluster names arrive in several spellings ("Springfield Lakes",
//! "springfield_lakes", "Ipswich-Region"). Everything is reduced to a
//! lower-case, hyphenated slug before any cross-reference is made.

use crate::domain::model::Slug;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern compiles"));

const DATASET_SUFFIXES: [&str; 2] = ["-city", "-region"];
const DIRECTIONAL_SUFFIXES: [&str; 4] = ["-north", "-south", "-east", "-west"];

/// Lower-case, replace every run of non-alphanumerics with one hyphen, trim hyphens.
pub fn normalize(raw: &str) -> Slug {
    let lowered = raw.trim().to_lowercase().replace('&', " and ");
    NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

fn strip_any<'a>(slug: &'a str, suffixes: &[&str]) -> Option<&'a str> {
    suffixes
        .iter()
        .find_map(|suffix| slug.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
}

/// "ipswich-region" -> "ipswich", "logan-city" -> "logan".
pub fn strip_dataset_suffix(slug: &str) -> Option<&str> {
    strip_any(slug, &DATASET_SUFFIXES)
}

/// "redbank-north" -> "redbank".
pub fn strip_directional_suffix(slug: &str) -> Option<&str> {
    strip_any(slug, &DIRECTIONAL_SUFFIXES)
}

/// Resolves raw names against a fixed set of known slugs and cluster aliases.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    cluster_aliases: BTreeMap<Slug, Slug>,
}

impl Canonicalizer {
    pub fn new(aliases: &BTreeMap<String, String>) -> Self {
        let cluster_aliases = aliases
            .iter()
            .map(|(from, to)| (normalize(from), normalize(to)))
            .collect();
        Self { cluster_aliases }
    }

    /// Canonical cluster slug: normalize, apply aliases, strip dataset suffixes.
    pub fn cluster(&self, raw: &str) -> Slug {
        let slug = normalize(raw);
        if let Some(alias) = self.cluster_aliases.get(&slug) {
            return alias.clone();
        }
        match strip_dataset_suffix(&slug) {
            Some(stem) => self
                .cluster_aliases
                .get(stem)
                .cloned()
                .unwrap_or_else(|| stem.to_string()),
            None => slug,
        }
    }

    /// Finds the registry slug a raw suburb reference points at. Tries the
    /// exact normalized slug, then without a dataset suffix, then without a
    /// directional suffix.
    pub fn suburb<F>(&self, raw: &str, known: F) -> Option<Slug>
    where
        F: Fn(&str) -> bool,
    {
        let slug = normalize(raw);
        if known(&slug) {
            return Some(slug);
        }
        let stem = [strip_dataset_suffix(&slug), strip_directional_suffix(&slug)]
            .into_iter()
            .flatten()
            .find(|stem| known(stem))
            .map(str::to_string);
        stem
    }
}
