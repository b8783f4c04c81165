use std::collections::HashSet;

use super::question_store::QuestionStore;

/// Cheap pre-check that a question text is new.
///
/// Advisory only: two requests can both pass it for the same text. The
/// unique index checked at insert time is what actually decides.
pub struct UniquenessGate<'a, S: QuestionStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: QuestionStore + ?Sized> UniquenessGate<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn is_unique(&self, text: &str, session_exclusions: &HashSet<String>) -> bool {
        if session_exclusions.contains(text) {
            tracing::debug!("Question already shown in this session");
            return false;
        }

        match self.store.contains(text).await {
            Ok(found) => !found,
            Err(e) => {
                // The insert will still be rejected by the unique index if this is a repeat.
                tracing::warn!("Uniqueness lookup failed, deferring to insert: {:#}", e);
                true
            }
        }
    }
}
