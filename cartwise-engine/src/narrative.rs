//! Optional narrative annotation
//!
//! Narrative/LLM-based explanation generation is a pluggable post-processor,
//! never a dependency of scoring or assignment. Annotators receive a
//! finalized, read-only [`DecisionItem`] and return an optional annotation;
//! the attach pass runs every annotation concurrently under a timeout and
//! discards failures. Nothing here can alter a decision — only the
//! supplementary `narrative` field is ever written.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::DecisionItem;

/// Per-item annotation timeout
const ANNOTATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Narrative annotation error
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// The annotator failed; the decision is unaffected
    #[error("annotation failed: {0}")]
    Failed(String),
}

/// Pluggable narrative generator.
///
/// Implementations may call external services (an LLM, a template engine);
/// the engine guarantees their result is supplementary and their failure
/// invisible to the decision.
#[async_trait]
pub trait NarrativeAnnotator: Send + Sync {
    /// Annotator name for logging
    fn name(&self) -> &'static str;

    /// Produce an optional narrative for a finalized decision
    async fn annotate(&self, item: &DecisionItem) -> Result<Option<String>, NarrativeError>;
}

/// Attach narratives to finalized decision items.
///
/// Runs all annotations concurrently. A failed or timed-out annotation
/// leaves the item's narrative `None` and logs at warn level; it never
/// propagates.
pub async fn attach_narratives(annotator: &dyn NarrativeAnnotator, items: &mut [DecisionItem]) {
    let annotations = futures::future::join_all(items.iter().map(|item| async {
        match tokio::time::timeout(ANNOTATION_TIMEOUT, annotator.annotate(item)).await {
            Ok(Ok(narrative)) => narrative,
            Ok(Err(error)) => {
                warn!(
                    annotator = annotator.name(),
                    ingredient = %item.ingredient_key,
                    %error,
                    "narrative annotation failed, leaving decision unannotated"
                );
                None
            }
            Err(_) => {
                warn!(
                    annotator = annotator.name(),
                    ingredient = %item.ingredient_key,
                    "narrative annotation timed out, leaving decision unannotated"
                );
                None
            }
        }
    }))
    .await;

    for (item, narrative) in items.iter_mut().zip(annotations) {
        if narrative.is_some() {
            debug!(ingredient = %item.ingredient_key, "attached narrative annotation");
        }
        item.narrative = narrative;
    }
}
