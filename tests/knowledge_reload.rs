mod common;

use common::{KNOWLEDGE_TOML, forest_scene};
use faunasense::ClassificationEngine;
use faunasense::knowledge::{
    FileKnowledgeSource, KnowledgeError, KnowledgeRepository, KnowledgeSource, SharedKnowledge,
};
use faunasense::schema::{DetectionCandidate, KnowledgeEntry, MatchType};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Alternates between two complete generations of the store.
struct Flipping {
    loads: AtomicUsize,
}

impl KnowledgeSource for Flipping {
    fn load(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let generation = self.loads.fetch_add(1, Ordering::SeqCst) % 2;
        let name = if generation == 0 { "GRAY WOLF" } else { "TIMBER WOLF" };
        // Every generation holds the same number of entries
        Ok(vec![
            KnowledgeEntry::new(name).with_aliases(["wolf"]),
            KnowledgeEntry::new(format!("{} PUP", name)),
            KnowledgeEntry::new(format!("{} PACK", name)),
        ])
    }

    fn describe(&self) -> String {
        "flipping".into()
    }
}

#[test]
fn readers_never_see_a_partial_snapshot() {
    let repo = Arc::new(
        SharedKnowledge::new(Flipping {
            loads: AtomicUsize::new(0),
        })
        .unwrap(),
    );
    let engine = ClassificationEngine::new(repo.clone());
    let image = forest_scene();
    let detections = [DetectionCandidate::new("wolf", 0.5)];

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..200 {
                engine.reload_knowledge().unwrap();
            }
        });
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let snapshot = repo.snapshot();
                    assert_eq!(snapshot.len(), 3);
                    let stem = &snapshot.entries()[0].canonical_name;
                    assert!(snapshot.entries()[1].canonical_name.starts_with(stem.as_str()));

                    let results = engine.classify(&image, &detections).unwrap();
                    let label = &results[0].final_label;
                    assert!(label == "GRAY WOLF" || label == "TIMBER WOLF", "{}", label);
                }
            });
        }
    });
}

#[test]
fn file_reload_picks_up_edits_and_survives_bad_ones() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.toml");
    std::fs::write(&path, KNOWLEDGE_TOML).unwrap();

    let repo = Arc::new(SharedKnowledge::new(FileKnowledgeSource::new(&path)).unwrap());
    let engine = ClassificationEngine::new(repo);
    assert_eq!(engine.knowledge().len(), 3);
    assert_eq!(engine.match_label("fox").match_type, MatchType::None);

    std::fs::write(
        &path,
        format!(
            "{}\n[[entries]]\ncanonical_name = \"RED FOX\"\naliases = [\"fox\"]\n",
            KNOWLEDGE_TOML
        ),
    )
    .unwrap();
    let snapshot = engine.reload_knowledge().unwrap();
    assert_eq!(snapshot.len(), 4);
    assert_eq!(engine.match_label("fox").match_type, MatchType::Exact);

    std::fs::write(&path, "this is not [[toml").unwrap();
    assert!(matches!(
        engine.reload_knowledge(),
        Err(KnowledgeError::Parse { .. })
    ));
    assert_eq!(engine.knowledge().len(), 4);
}

#[test]
fn in_flight_snapshot_outlives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.json");
    std::fs::write(&path, r#"[{"canonical_name": "GRAY WOLF", "aliases": ["wolf"]}]"#).unwrap();

    let repo = SharedKnowledge::new(FileKnowledgeSource::new(&path)).unwrap();
    let held = repo.snapshot();

    std::fs::write(&path, r#"{"entries": []}"#).unwrap();
    repo.reload().unwrap();

    assert_eq!(held.len(), 1);
    assert!(repo.snapshot().is_empty());
    assert!(held.loaded_at() <= repo.snapshot().loaded_at());
}

#[test]
fn missing_file_starts_empty_when_tolerated() {
    let repo = SharedKnowledge::new_or_empty(FileKnowledgeSource::new("/nonexistent/kb.toml"));
    let engine = ClassificationEngine::new(Arc::new(repo));
    let results = engine
        .classify(&forest_scene(), &[DetectionCandidate::new("dog", 0.65)])
        .unwrap();

    // Corrections still run without knowledge
    assert_eq!(results[0].final_label, "wolf");
    assert_eq!(results[0].match_type, MatchType::None);
    assert!((results[0].final_confidence - 0.75).abs() < 1e-5);
}
