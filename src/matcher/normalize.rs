use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static pattern compiles"));

/// Plurals that do not follow the suffix rules
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("wolves", "wolf"),
    ("calves", "calf"),
    ("halves", "half"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("geese", "goose"),
    ("teeth", "tooth"),
    ("feet", "foot"),
    ("oxen", "ox"),
    ("children", "child"),
    ("people", "person"),
    ("cacti", "cactus"),
    ("octopi", "octopus"),
];

/// Words whose plural and singular forms coincide, or that merely end in `s`
const INVARIANT: &[&str] = &[
    "deer", "sheep", "fish", "moose", "bison", "species", "series", "salmon", "trout", "swiss",
    "gas", "bus", "walrus", "octopus", "platypus", "asparagus", "rhinoceros", "hippopotamus",
];

/// Case-fold, strip punctuation and singularize each token.
///
/// Total and pure: every input maps to a (possibly empty) normalized string.
pub fn normalize(label: &str) -> String {
    tokens(label).join(" ")
}

/// Normalized tokens of `label` in their original order.
pub fn tokens(label: &str) -> Vec<String> {
    let lowered = label.to_lowercase();
    NON_ALNUM
        .split(&lowered)
        .filter(|t| !t.is_empty())
        .map(singularize)
        .collect()
}

/// Normalized tokens of `label` as a set.
pub fn token_set(label: &str) -> BTreeSet<String> {
    tokens(label).into_iter().collect()
}

/// Reduce a lowercase token to its singular form.
pub fn singularize(token: &str) -> String {
    if let Some((_, singular)) = IRREGULAR_PLURALS.iter().find(|(plural, _)| *plural == token) {
        return (*singular).to_string();
    }
    if INVARIANT.contains(&token) || token.len() <= 3 {
        return token.to_string();
    }

    if let Some(stem) = token.strip_suffix("ies")
        && stem.len() >= 2
    {
        return format!("{}y", stem);
    }
    for suffix in ["ches", "shes", "sses", "xes", "zes"] {
        if token.ends_with(suffix) {
            return token[..token.len() - 2].to_string();
        }
    }
    if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
        return token.to_string();
    }
    if let Some(stem) = token.strip_suffix('s') {
        return stem.to_string();
    }

    token.to_string()
}
