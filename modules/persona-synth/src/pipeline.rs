use persona_common::{NormalizedItem, Persona, PersonaError};
use tracing::{info, warn};

use crate::assembler::assemble;
use crate::citations::link_citations;
use crate::corpus::build_corpus;
use crate::extractor::AttributeExtractor;
use crate::recovery::{recover, RecoveryOutcome};

/// Result of one generation pass.
#[derive(Debug, Clone)]
pub struct GeneratedPersona {
    pub persona: Persona,
    pub recovery: RecoveryOutcome,
    /// Items rendered into the model prompt.
    pub corpus_items: usize,
}

/// Corpus → model → recovery → citations → persona.
pub struct PersonaGenerator {
    extractor: AttributeExtractor,
}

impl PersonaGenerator {
    pub fn new(extractor: AttributeExtractor) -> Self {
        Self { extractor }
    }

    pub fn model_name(&self) -> &str {
        self.extractor.model_name()
    }

    /// Citations are drawn from all `items`, not only the ones that fit in the corpus.
    pub async fn generate(
        &self,
        username: &str,
        items: &[NormalizedItem],
    ) -> Result<GeneratedPersona, PersonaError> {
        if items.is_empty() {
            return Err(PersonaError::EmptyCorpus(username.to_string()));
        }

        info!(username, items = items.len(), "Generating persona");
        let corpus = build_corpus(items);
        let raw = self.extractor.extract(username, &corpus).await?;

        let recovered = recover(&raw);
        if let RecoveryOutcome::Fallback(reason) = &recovered.outcome {
            warn!(username, reason = %reason, "Model output unusable, using default attributes");
        }

        let citations = link_citations(items, &recovered.attributes);
        let cited = citations.values().filter(|urls| !urls.is_empty()).count();
        let persona = assemble(username, &recovered.attributes, citations);
        info!(username, cited_fields = cited, "Persona generated");

        Ok(GeneratedPersona {
            persona,
            recovery: recovered.outcome,
            corpus_items: corpus.item_count,
        })
    }
}
