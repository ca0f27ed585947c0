use crate::assign::registry::ReplacementRegistry;
use crate::assign::ReplacementStrategy;
use crate::config::StrategyKind;
use crate::core::label::EntityLabel;
use crate::core::model::CanonicalEntity;
use crate::error::Result;

/// `<tag>_<n>` values, e.g. `henkilö_3`, numbered per label.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterStrategy;

impl CounterStrategy {
    pub fn new() -> Self {
        Self
    }

    pub fn format(label: EntityLabel, n: usize) -> String {
        format!("{}_{n}", label.local_tag().to_lowercase())
    }
}

impl ReplacementStrategy for CounterStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Counter
    }

    fn replacement_for(
        &mut self,
        entity: &CanonicalEntity,
        registry: &mut ReplacementRegistry,
    ) -> Result<String> {
        loop {
            let n = registry.bump_counter(entity.label);
            let candidate = Self::format(entity.label, n);
            if candidate != entity.text && !registry.is_taken(&candidate) {
                registry.register(&candidate);
                return Ok(candidate);
            }
        }
    }
}
