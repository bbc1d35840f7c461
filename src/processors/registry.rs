use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::fallback::FallbackProcessor;
use super::local::LocalProcessor;
use super::remote::RangeProcessor;
use super::state::TransferState;
use super::traits::{Processor, ProcessorError, SetupContext};
use crate::http::{HttpClient, HttpConfig, HttpError};
use crate::humanize::ByteSize;
use crate::naming::{DestinationNaming, SanitizedUrlName};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("processor name already registered: {0}")]
    Duplicate(String),
    #[error("processor name must not be empty")]
    EmptyName,
}

/// Known processors: registered custom ones plus the three built-ins
///
/// Custom processors are registered by value; a job's configuration then
/// names the ones it wants, in priority order. Built-ins always follow in the
/// fixed order local, range, fallback.
#[derive(Clone)]
pub struct ProcessorRegistry {
    custom: Vec<Arc<dyn Processor>>,
    local: Arc<dyn Processor>,
    range: Arc<dyn Processor>,
    fallback: Arc<dyn Processor>,
    naming: Arc<dyn DestinationNaming>,
}

impl ProcessorRegistry {
    pub fn new(client: HttpClient, chunk_size: ByteSize) -> Self {
        let client = Arc::new(client);
        Self {
            custom: Vec::new(),
            local: Arc::new(LocalProcessor::new(chunk_size)),
            range: Arc::new(RangeProcessor::new(client.clone())),
            fallback: Arc::new(FallbackProcessor::new(client)),
            naming: Arc::new(SanitizedUrlName),
        }
    }

    /// Registry with default HTTP settings and 1 MiB local chunks
    pub fn with_defaults() -> Result<Self, HttpError> {
        Ok(Self::new(HttpClient::new(HttpConfig::default())?, ByteSize::mib(1)))
    }

    /// Replace the naming strategy used for remote destinations
    pub fn with_naming(mut self, naming: Arc<dyn DestinationNaming>) -> Self {
        self.naming = naming;
        self
    }

    /// Make a custom processor available to jobs that list its name
    pub fn register(&mut self, processor: Arc<dyn Processor>) -> Result<(), RegistryError> {
        let name = processor.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.get(name).is_some() {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        debug!(processor = name, "Registered custom processor");
        self.custom.push(processor);
        Ok(())
    }

    pub fn naming(&self) -> &dyn DestinationNaming {
        self.naming.as_ref()
    }

    fn builtins(&self) -> [&Arc<dyn Processor>; 3] {
        [&self.local, &self.range, &self.fallback]
    }

    /// Look up any known processor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Processor>> {
        self.custom
            .iter()
            .chain(self.builtins())
            .find(|p| p.name() == name)
            .cloned()
    }

    /// Ordered candidate list: requested ids first, then the built-ins
    ///
    /// Ids that name no known processor are dropped. Listing a built-in moves
    /// it ahead of the others; nothing appears twice.
    pub fn candidates(&self, ids: &[String]) -> Vec<Arc<dyn Processor>> {
        let mut candidates: Vec<Arc<dyn Processor>> = Vec::with_capacity(ids.len() + 3);

        for id in ids {
            match self.get(id) {
                Some(p) if candidates.iter().any(|c| c.name() == p.name()) => {}
                Some(p) => candidates.push(p),
                None => warn!(processor = %id, "Ignoring unknown processor"),
            }
        }
        for builtin in self.builtins() {
            if !candidates.iter().any(|c| c.name() == builtin.name()) {
                candidates.push(builtin.clone());
            }
        }

        candidates
    }

    /// Bind the first candidate that accepts `state`
    ///
    /// The fallback accepts everything, so a match always exists.
    pub async fn select(&self, state: &TransferState, ids: &[String]) -> Arc<dyn Processor> {
        for candidate in self.candidates(ids) {
            if candidate.is_compatible(state).await {
                info!(processor = candidate.name(), source = %state.source, "Selected processor");
                return candidate;
            }
            debug!(processor = candidate.name(), source = %state.source, "Processor not compatible");
        }
        self.fallback.clone()
    }

    /// Select a processor and lay out the fresh `state` with it
    ///
    /// A compatible candidate whose setup answers
    /// [`ProcessorError::Unsupported`] counts as a miss, which covers a server
    /// that stops honouring ranges between the capability check and setup.
    pub async fn bind(
        &self,
        state: TransferState,
        ids: &[String],
        ctx: &SetupContext<'_>,
    ) -> Result<(Arc<dyn Processor>, TransferState), ProcessorError> {
        for candidate in self.candidates(ids) {
            if !candidate.is_compatible(&state).await {
                debug!(processor = candidate.name(), source = %state.source, "Processor not compatible");
                continue;
            }

            let mut attempt = state.clone();
            attempt.processor = candidate.name().to_string();
            match candidate.setup_state(attempt, ctx).await {
                Ok(ready) => {
                    info!(processor = candidate.name(), source = %state.source, "Selected processor");
                    return Ok((candidate, ready));
                }
                Err(e @ ProcessorError::Unsupported { .. }) => {
                    warn!(processor = candidate.name(), error = %e, "Setup rejected source, trying next processor");
                }
                Err(e) => return Err(e),
            }
        }

        let mut state = state;
        state.processor = self.fallback.name().to_string();
        let ready = self.fallback.setup_state(state, ctx).await?;
        Ok((self.fallback.clone(), ready))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::SanitizedUrlName;
    use crate::processors::{CopyStatus, FALLBACK, LOCAL, RANGE, TimeBudget};
    use async_trait::async_trait;

    struct Named(&'static str, bool);

    #[async_trait]
    impl Processor for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn is_compatible(&self, _state: &TransferState) -> bool {
            self.1
        }

        async fn setup_state(
            &self,
            state: TransferState,
            _ctx: &SetupContext<'_>,
        ) -> Result<TransferState, ProcessorError> {
            Ok(state)
        }

        async fn copy(
            &self,
            _state: &mut TransferState,
            _budget: TimeBudget,
        ) -> Result<CopyStatus, ProcessorError> {
            Ok(CopyStatus::Done)
        }
    }

    /// Compatible, but its setup finds the source unusable
    struct Refuses(&'static str);

    #[async_trait]
    impl Processor for Refuses {
        fn name(&self) -> &str {
            self.0
        }

        async fn is_compatible(&self, _state: &TransferState) -> bool {
            true
        }

        async fn setup_state(
            &self,
            state: TransferState,
            _ctx: &SetupContext<'_>,
        ) -> Result<TransferState, ProcessorError> {
            Err(ProcessorError::Unsupported {
                processor: self.0.to_string(),
                source_id: state.source,
            })
        }

        async fn copy(
            &self,
            _state: &mut TransferState,
            _budget: TimeBudget,
        ) -> Result<CopyStatus, ProcessorError> {
            Ok(CopyStatus::Done)
        }
    }

    fn ctx() -> SetupContext<'static> {
        SetupContext {
            destination: None,
            keep_original_filename: false,
            naming: &SanitizedUrlName,
        }
    }

    fn names(candidates: &[Arc<dyn Processor>]) -> Vec<&str> {
        candidates.iter().map(|p| p.name()).collect()
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builtins_in_fixed_order() {
        let registry = ProcessorRegistry::with_defaults().unwrap();
        assert_eq!(names(&registry.candidates(&[])), vec![LOCAL, RANGE, FALLBACK]);
    }

    #[test]
    fn test_custom_first_and_unknown_dropped() {
        let mut registry = ProcessorRegistry::with_defaults().unwrap();
        registry.register(Arc::new(Named("alpha", false))).unwrap();
        registry.register(Arc::new(Named("beta", false))).unwrap();

        let candidates = registry.candidates(&ids(&["beta", "Bad", "alpha", "beta"]));
        assert_eq!(names(&candidates), vec!["beta", "alpha", LOCAL, RANGE, FALLBACK]);
    }

    #[test]
    fn test_unlisted_custom_is_not_a_candidate() {
        let mut registry = ProcessorRegistry::with_defaults().unwrap();
        registry.register(Arc::new(Named("alpha", true))).unwrap();
        assert_eq!(names(&registry.candidates(&[])), vec![LOCAL, RANGE, FALLBACK]);
    }

    #[test]
    fn test_listed_builtin_moves_forward() {
        let registry = ProcessorRegistry::with_defaults().unwrap();
        let candidates = registry.candidates(&ids(&[FALLBACK]));
        assert_eq!(names(&candidates), vec![FALLBACK, LOCAL, RANGE]);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = ProcessorRegistry::with_defaults().unwrap();
        registry.register(Arc::new(Named("alpha", true))).unwrap();

        assert!(matches!(
            registry.register(Arc::new(Named("alpha", true))),
            Err(RegistryError::Duplicate(_))
        ));
        assert!(matches!(
            registry.register(Arc::new(Named(LOCAL, true))),
            Err(RegistryError::Duplicate(_))
        ));
        assert!(matches!(
            registry.register(Arc::new(Named("", true))),
            Err(RegistryError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn test_compatible_custom_wins() {
        let mut registry = ProcessorRegistry::with_defaults().unwrap();
        registry.register(Arc::new(Named("never", false))).unwrap();
        registry.register(Arc::new(Named("always", true))).unwrap();

        let state = TransferState::new("/definitely/missing", "/tmp");
        let chosen = registry.select(&state, &ids(&["never", "always"])).await;
        assert_eq!(chosen.name(), "always");
    }

    #[tokio::test]
    async fn test_fallback_catches_everything_else() {
        let registry = ProcessorRegistry::with_defaults().unwrap();
        let state = TransferState::new("/definitely/missing", "/tmp");
        assert_eq!(registry.select(&state, &[]).await.name(), FALLBACK);
    }

    #[tokio::test]
    async fn test_bind_records_processor_name() {
        let mut registry = ProcessorRegistry::with_defaults().unwrap();
        registry.register(Arc::new(Named("always", true))).unwrap();

        let state = TransferState::new("/definitely/missing", "/tmp");
        let (chosen, state) = registry.bind(state, &ids(&["always"]), &ctx()).await.unwrap();
        assert_eq!(chosen.name(), "always");
        assert_eq!(state.processor, "always");
    }

    #[tokio::test]
    async fn test_bind_skips_processor_whose_setup_refuses() {
        let mut registry = ProcessorRegistry::with_defaults().unwrap();
        registry.register(Arc::new(Refuses("picky"))).unwrap();
        registry.register(Arc::new(Named("steady", true))).unwrap();

        let state = TransferState::new("/definitely/missing", "/tmp");
        let (chosen, state) = registry
            .bind(state, &ids(&["picky", "steady"]), &ctx())
            .await
            .unwrap();
        assert_eq!(chosen.name(), "steady");
        assert_eq!(state.processor, "steady");

        // with nothing else listed the search ends at the fallback
        let state = TransferState::new("/definitely/missing", "/tmp");
        let (chosen, state) = registry.bind(state, &ids(&["picky"]), &ctx()).await.unwrap();
        assert_eq!(chosen.name(), FALLBACK);
        assert_eq!(state.processor, FALLBACK);
        assert!(!state.temporary);
    }
}
