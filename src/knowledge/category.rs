use crate::matcher::token_set;

/// Fallback category when nothing else applies
pub const OTHER: &str = "Other";

const SCIENTIFIC_NAMES: &[(&str, &str)] = &[
    ("actinopterygii", "Fish"),
    ("chondrichthyes", "Fish"),
    ("amphibia", "Amphibian"),
    ("aves", "Bird"),
    ("insecta", "Insect"),
    ("mammalia", "Mammal"),
    ("reptilia", "Reptile"),
    ("arachnida", "Arachnid"),
    ("crustacea", "Crustacean"),
    ("mollusca", "Mollusk"),
    ("animalia", "Animal"),
];

const KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Bird",
        &[
            "bird", "eagle", "hawk", "owl", "parrot", "penguin", "flamingo", "peacock", "duck",
            "goose", "swan", "chicken", "turkey", "pigeon", "crow", "raven", "sparrow", "robin",
            "cardinal", "blue jay", "woodpecker", "hummingbird",
        ],
    ),
    (
        "Mammal",
        &[
            "mammal", "dog", "cat", "lion", "tiger", "leopard", "cheetah", "elephant", "bear",
            "wolf", "fox", "deer", "horse", "cow", "sheep", "goat", "pig", "rabbit", "squirrel",
            "mouse", "rat", "monkey", "gorilla", "zebra", "giraffe", "whale", "dolphin",
        ],
    ),
    (
        "Reptile",
        &[
            "reptile", "snake", "lizard", "turtle", "tortoise", "crocodile", "alligator",
            "iguana", "gecko", "chameleon",
        ],
    ),
    (
        "Fish",
        &[
            "fish", "shark", "salmon", "tuna", "goldfish", "bass", "trout", "cod", "swordfish",
            "angelfish",
        ],
    ),
    ("Amphibian", &["amphibian", "frog", "toad", "salamander", "newt"]),
    (
        "Insect",
        &[
            "insect", "bug", "butterfly", "bee", "ant", "beetle", "fly", "dragonfly", "moth",
            "mosquito", "spider", "wasp",
        ],
    ),
];

/// Normalize a stored category, deriving one from `name` when it is blank.
///
/// Scientific class names and plural forms map to a singular English name;
/// anything else unrecognized is kept as written.
pub fn normalize_category(raw: &str, name: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return categorize(name).to_string();
    }

    let lowered = raw.to_lowercase();
    if let Some((_, english)) = SCIENTIFIC_NAMES.iter().find(|(sci, _)| *sci == lowered) {
        return (*english).to_string();
    }

    let singular = token_set(raw);
    for (category, _) in KEYWORDS {
        if singular.len() == 1 && singular.contains(&category.to_lowercase()) {
            return (*category).to_string();
        }
    }

    raw.to_string()
}

/// Categorize an animal name by keyword, first matching group wins.
pub fn categorize(name: &str) -> &'static str {
    let tokens = token_set(name);
    if tokens.is_empty() {
        return OTHER;
    }

    for (category, keywords) in KEYWORDS {
        let hit = keywords.iter().any(|keyword| {
            let keyword_tokens = token_set(keyword);
            keyword_tokens.is_subset(&tokens)
        });
        if hit {
            return *category;
        }
    }

    OTHER
}
