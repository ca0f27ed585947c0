pub mod counter;
pub mod registry;
pub mod synthetic;
pub mod vocabulary;

use crate::config::StrategyKind;
use crate::core::model::CanonicalEntity;
use crate::error::Result;

pub use counter::CounterStrategy;
pub use registry::ReplacementRegistry;
pub use synthetic::SyntheticStrategy;

/// Produces replacement values for committed entities.
///
/// A returned value is already registered; it never equals the entity's own
/// text nor any value issued earlier in the session.
pub trait ReplacementStrategy {
    fn kind(&self) -> StrategyKind;

    fn replacement_for(
        &mut self,
        entity: &CanonicalEntity,
        registry: &mut ReplacementRegistry,
    ) -> Result<String>;
}

/// Owns the session's replacement strategy.
pub struct ReplacementAssigner {
    strategy: Box<dyn ReplacementStrategy>,
}

impl ReplacementAssigner {
    pub fn new(kind: StrategyKind, seed: Option<u64>) -> Self {
        let strategy: Box<dyn ReplacementStrategy> = match kind {
            StrategyKind::Synthetic => Box::new(SyntheticStrategy::new(seed)),
            StrategyKind::Counter => Box::new(CounterStrategy::new()),
        };
        Self { strategy }
    }

    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn assign(
        &mut self,
        entity: &CanonicalEntity,
        registry: &mut ReplacementRegistry,
    ) -> Result<String> {
        let value = self.strategy.replacement_for(entity, registry)?;
        debug_assert_ne!(value, entity.text);
        Ok(value)
    }
}

impl std::fmt::Debug for ReplacementAssigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplacementAssigner")
            .field("kind", &self.kind())
            .finish()
    }
}
