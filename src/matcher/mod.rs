//! Maps a free-text detector label onto at most one knowledge entry.

pub mod normalize;

pub use normalize::{normalize, singularize, token_set, tokens};

use crate::config::BoostConfig;
use crate::knowledge::KnowledgeSnapshot;
use crate::schema::{KnowledgeEntry, MatchResult, MatchType};
use std::collections::BTreeSet;

/// Resolve `label` against the snapshot.
///
/// Exact matches go through the snapshot's normalized-name index. Partial
/// matches require the label's tokens to be a subset or superset of one of an
/// entry's names; the best Jaccard overlap wins and ties go to the entry that
/// comes first in the snapshot.
pub fn match_label(label: &str, snapshot: &KnowledgeSnapshot, boosts: &BoostConfig) -> MatchResult {
    let normalized = normalize(label);
    if normalized.is_empty() || snapshot.is_empty() {
        return MatchResult::none();
    }

    if let Some(entry) = snapshot.exact(&normalized) {
        return MatchResult {
            entry: Some(entry.clone()),
            match_type: MatchType::Exact,
            boost: boosts.exact,
        };
    }

    let label_tokens = token_set(&normalized);
    match best_partial(&label_tokens, snapshot) {
        Some(entry) => MatchResult {
            entry: Some(entry.clone()),
            match_type: MatchType::Partial,
            boost: boosts.partial,
        },
        None => MatchResult::none(),
    }
}

fn best_partial<'a>(
    label_tokens: &BTreeSet<String>,
    snapshot: &'a KnowledgeSnapshot,
) -> Option<&'a KnowledgeEntry> {
    let mut best: Option<(&KnowledgeEntry, f32)> = None;

    for (entry, names) in snapshot.indexed_names() {
        let score = names
            .iter()
            .filter_map(|name_tokens| partial_score(label_tokens, name_tokens))
            .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))));

        if let Some(score) = score
            && best.is_none_or(|(_, best_score)| score > best_score)
        {
            best = Some((entry, score));
        }
    }

    best.map(|(entry, _)| entry)
}

/// Jaccard overlap when one token set contains the other, else `None`.
fn partial_score(label: &BTreeSet<String>, name: &BTreeSet<String>) -> Option<f32> {
    let overlap = label.intersection(name).count();
    if overlap == 0 || !(label.is_subset(name) || name.is_subset(label)) {
        return None;
    }
    let union = label.union(name).count();
    Some(overlap as f32 / union as f32)
}
