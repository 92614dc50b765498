//! Migration driver.
//!
//! Dispatches a stored version to the single step registered for it.
//!
//! ## Contract
//!
//! 1. Unknown version: `UnknownVersionError`, nothing else happens
//! 2. Empty state: returned unchanged, no step runs, no lookup is made
//! 3. Otherwise: the step's result or error, verbatim
//!
//! The input state is borrowed and never modified, so on any error the
//! caller still holds the exact pre-migration state.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::MigratorConfig;
use crate::error::{EmptyIdentifierError, LookupError, MigrationError};
use crate::lookup::{CachingLookup, ResourceLookup};
use crate::report::StepReport;
use crate::step::{IdentifierAdoption, MigrationStep, MigrationTable};
use crate::types::InstanceState;

/// Migrates persisted states of one resource type, one version per call.
pub struct StateMigrator<L: ResourceLookup> {
    lookup: Arc<L>,
    table: MigrationTable,
    config: MigratorConfig,
}

impl<L: ResourceLookup> StateMigrator<L> {
    /// Create a migrator with default configuration.
    pub fn new(lookup: Arc<L>, table: MigrationTable) -> Self {
        Self::with_config(lookup, table, MigratorConfig::default())
    }

    /// Create a migrator with explicit configuration.
    ///
    /// `lookup` is used as given; `config.lookup_cache` only applies
    /// through [`cached`](Self::cached).
    pub fn with_config(lookup: Arc<L>, table: MigrationTable, config: MigratorConfig) -> Self {
        Self { lookup, table, config }
    }

    /// Create a migrator whose lookups go through a cache sized by
    /// `config.lookup_cache`.
    pub fn cached(lookup: L, table: MigrationTable, config: MigratorConfig) -> StateMigrator<CachingLookup<L>> {
        let lookup = CachingLookup::new(lookup, config.lookup_cache);
        StateMigrator::with_config(Arc::new(lookup), table, config)
    }

    /// The lookup collaborator.
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// The transition table.
    pub fn table(&self) -> &MigrationTable {
        &self.table
    }

    /// Latest schema version.
    pub fn latest(&self) -> u32 {
        self.table.latest()
    }

    /// Migrate `state` from `version` to `version + 1`.
    pub async fn migrate(&self, version: u32, state: &InstanceState) -> Result<InstanceState, MigrationError> {
        self.migrate_with_report(version, state).await.map(|(state, _)| state)
    }

    /// Like [`migrate`](Self::migrate), also returning what the call did.
    pub async fn migrate_with_report(
        &self,
        version: u32,
        state: &InstanceState,
    ) -> Result<(InstanceState, StepReport), MigrationError> {
        let step = self.table.step(version).map_err(|e| {
            warn!(resource = self.table.resource(), version, "no migration registered for stored version");
            e
        })?;

        let run_id = Uuid::new_v4();
        let span = info_span!(
            "migrate_state",
            resource = self.table.resource(),
            run_id = %run_id,
            from = version,
            to = version + 1,
        );

        async move {
            if state.is_empty() {
                debug!("empty state; nothing to migrate");
                let report = StepReport::new(run_id, version, version, None, state, state);
                return Ok((state.clone(), report));
            }

            info!(
                step = step.kind(),
                "found {} state v{}; migrating to v{}",
                self.table.resource(),
                version,
                version + 1
            );
            if self.config.log_attributes {
                debug!(attributes = ?state.attributes, "attributes before migration");
            }

            let next = self.apply(step, state).await?;

            if self.config.log_attributes {
                debug!(attributes = ?next.attributes, "attributes after migration");
            }
            let report = StepReport::new(run_id, version, version + 1, Some(step.kind()), state, &next);
            info!(
                before = %report.before_fingerprint,
                after = %report.after_fingerprint,
                keys_before = report.keys_before,
                keys_after = report.keys_after,
                "state migrated"
            );
            Ok((next, report))
        }
        .instrument(span)
        .await
    }

    async fn apply(&self, step: &MigrationStep, state: &InstanceState) -> Result<InstanceState, MigrationError> {
        let mut next = match step {
            MigrationStep::AdoptIdentifier(adopt) => self.adopt_identifier(adopt, state).await?,
            MigrationStep::Reshape(rewriter) => {
                InstanceState::new(state.id.clone(), rewriter.apply(&state.attributes)?)
            }
            MigrationStep::Reencode(codec) => {
                debug!(codec = codec.name(), "re-encoding through schema codec");
                InstanceState::new(state.id.clone(), codec.round_trip(&state.attributes)?)
            }
        };
        next.sync_id_attribute();
        Ok(next)
    }

    async fn adopt_identifier(
        &self,
        adopt: &IdentifierAdoption,
        state: &InstanceState,
    ) -> Result<InstanceState, MigrationError> {
        let resource_group = state.attributes.get_or_default(&adopt.resource_group_key);
        let name = state.attributes.get_or_default(&adopt.name_key);

        let failed = |source: Box<dyn std::error::Error + Send + Sync>| -> MigrationError {
            warn!(resource_group, name, error = %source, "canonical identifier lookup failed");
            LookupError {
                resource_group: resource_group.to_string(),
                name: name.to_string(),
                source,
            }
            .into()
        };

        let record = self.lookup.get(resource_group, name).await.map_err(|e| failed(Box::new(e)))?;
        if record.id.is_empty() {
            return Err(failed(Box::new(EmptyIdentifierError)));
        }

        debug!(previous = %state.id, adopted = %record.id, "adopting canonical identifier");
        let mut next = state.clone();
        next.set_id(record.id);
        Ok(next)
    }
}
