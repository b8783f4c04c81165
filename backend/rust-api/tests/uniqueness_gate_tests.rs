mod common;

use std::collections::HashSet;

use common::MemoryStore;
use quiz_ia_api::services::uniqueness_gate::UniquenessGate;

fn exclusions(texts: &[&str]) -> HashSet<String> {
    texts.iter().map(|text| text.to_string()).collect()
}

#[tokio::test]
async fn test_session_exclusion_wins_regardless_of_store() {
    let empty = MemoryStore::default();
    assert!(
        !UniquenessGate::new(&empty)
            .is_unique("Who discovered penicillin?", &exclusions(&["Who discovered penicillin?"]))
            .await
    );
    assert_eq!(empty.lookups(), 0);

    let broken = MemoryStore::default().failing_lookups();
    assert!(
        !UniquenessGate::new(&broken)
            .is_unique("Who discovered penicillin?", &exclusions(&["Who discovered penicillin?"]))
            .await
    );
}

#[tokio::test]
async fn test_stored_text_is_not_unique() {
    let store = MemoryStore::with_texts(&["Who discovered penicillin?"]);
    let gate = UniquenessGate::new(&store);

    assert!(!gate.is_unique("Who discovered penicillin?", &HashSet::new()).await);
    assert_eq!(store.lookups(), 1);
}

#[tokio::test]
async fn test_new_text_is_unique() {
    let store = MemoryStore::with_texts(&["Who discovered penicillin?"]);
    let gate = UniquenessGate::new(&store);

    assert!(
        gate.is_unique("Who painted Guernica?", &exclusions(&["Who wrote Ulysses?"]))
            .await
    );
}

#[tokio::test]
async fn test_match_is_exact() {
    let store = MemoryStore::with_texts(&["Who discovered penicillin?"]);
    let gate = UniquenessGate::new(&store);

    assert!(gate.is_unique("who discovered penicillin?", &HashSet::new()).await);
    assert!(
        gate.is_unique("Who discovered penicillin", &exclusions(&["Who discovered penicillin?"]))
            .await
    );
}

#[tokio::test]
async fn test_lookup_failure_is_treated_as_unique() {
    let store = MemoryStore::default().failing_lookups();
    let gate = UniquenessGate::new(&store);

    assert!(gate.is_unique("Who painted Guernica?", &HashSet::new()).await);
}
