//! # Engine Facade
//!
//! `Engine` composes the Sosa service, the consanguinity calculator and the
//! path finder over one live `Snapshot`.
//!
//! A snapshot pairs an immutable `KinshipGraph` with the Sosa and kinship
//! caches of that version. Reloading builds the next snapshot off to the side and swaps the
//! `Arc` in one step; queries that already hold the previous snapshot finish
//! against it undisturbed.

use crate::config::EngineConfig;
use crate::consanguinity::{
    self, AncestorDistances, ClassifyOptions, CommonAncestor, RelationshipResult,
};
use crate::graph::KinshipGraph;
use crate::kinship::{self, Coefficient, KinshipCache, RelationshipSummary};
use crate::path::{self, PathOutcome};
use crate::sosa::{self, SosaCache, SosaLookup, SosaNumber, SosaTable};
use crate::{Branch, GraphVersion, LineageError, PersonKey, RecordSet, describe};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// One graph version with its caches. Every query on a snapshot sees the
/// same records.
#[derive(Debug)]
pub struct Snapshot {
    graph: Arc<KinshipGraph>,
    sosa: SosaCache,
    kinship: KinshipCache,
    config: EngineConfig,
}

impl Snapshot {
    fn build(
        records: RecordSet,
        version: GraphVersion,
        config: EngineConfig,
    ) -> Result<Self, LineageError> {
        let graph = Arc::new(KinshipGraph::build(records, version)?);
        Ok(Self {
            sosa: SosaCache::new(Arc::clone(&graph)),
            kinship: KinshipCache::new(Arc::clone(&graph)),
            graph,
            config,
        })
    }

    /// The version of this snapshot.
    #[must_use]
    pub fn version(&self) -> GraphVersion {
        self.graph.version()
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &KinshipGraph {
        &self.graph
    }

    /// The Sosa cache of this version.
    #[must_use]
    pub fn sosa_cache(&self) -> &SosaCache {
        &self.sosa
    }

    /// The kinship memo of this version.
    #[must_use]
    pub fn kinship_cache(&self) -> &KinshipCache {
        &self.kinship
    }

    /// The configuration this snapshot answers with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Sosa number of `target` relative to `root`.
    pub fn sosa_of(&self, root: &PersonKey, target: &PersonKey) -> Result<SosaLookup, LineageError> {
        sosa::sosa_of(&self.sosa, root, target)
    }

    /// Sosa number of `target` relative to the configured default root.
    pub fn sosa_of_default_root(&self, target: &PersonKey) -> Result<SosaLookup, LineageError> {
        let root = self
            .config
            .default_root
            .as_ref()
            .ok_or_else(|| LineageError::Config("no default Sosa root configured".to_string()))?;
        self.sosa_of(root, target)
    }

    /// The complete numbering of `root`.
    pub fn sosa_table(&self, root: &PersonKey) -> Result<Arc<SosaTable>, LineageError> {
        self.sosa.table_for(root)
    }

    /// Persons from the ancestor at `number` down to `root`.
    pub fn ancestor_chain(
        &self,
        root: &PersonKey,
        number: &SosaNumber,
    ) -> Result<Option<Vec<PersonKey>>, LineageError> {
        sosa::ancestor_chain(&self.graph, root, number)
    }

    /// Sosa number spelled by a chain from an ancestor down to the root.
    pub fn sosa_of_chain(&self, chain: &[PersonKey]) -> Result<Option<SosaNumber>, LineageError> {
        sosa::sosa_of_chain(&self.graph, chain)
    }

    /// Classify with the configured depth.
    pub fn classify(&self, a: &PersonKey, b: &PersonKey) -> Result<RelationshipResult, LineageError> {
        self.classify_with(a, b, self.config.classify_options())
    }

    /// Classify with explicit options.
    pub fn classify_with(
        &self,
        a: &PersonKey,
        b: &PersonKey,
        options: ClassifyOptions,
    ) -> Result<RelationshipResult, LineageError> {
        consanguinity::classify(&self.graph, a, b, options)
    }

    /// Every common ancestor within the configured depth, best first.
    pub fn common_ancestors(
        &self,
        a: &PersonKey,
        b: &PersonKey,
    ) -> Result<Vec<CommonAncestor>, LineageError> {
        consanguinity::common_ancestors(&self.graph, a, b, self.config.max_depth)
    }

    /// Distance from `subject` to each ancestor within the configured depth.
    pub fn ancestor_distances(&self, subject: &PersonKey) -> Result<AncestorDistances, LineageError> {
        consanguinity::ancestor_distances(&self.graph, subject, self.config.max_depth)
    }

    /// Kinship coefficient of `a` and `b`.
    pub fn kinship_coefficient(
        &self,
        a: &PersonKey,
        b: &PersonKey,
    ) -> Result<Coefficient, LineageError> {
        self.kinship.kinship(a, b)
    }

    /// Inbreeding coefficient of `person`.
    pub fn consanguinity(&self, person: &PersonKey) -> Result<Coefficient, LineageError> {
        self.kinship.inbreeding(person)
    }

    /// Inbreeding coefficient of every person, in key order.
    #[must_use]
    pub fn consanguinity_all(&self) -> BTreeMap<PersonKey, Coefficient> {
        kinship::inbreeding_coefficients(&self.kinship)
    }

    /// Kinship coefficient with nearest common ancestors and their lines,
    /// followed up to the configured depth.
    pub fn relationship_summary(
        &self,
        a: &PersonKey,
        b: &PersonKey,
    ) -> Result<RelationshipSummary, LineageError> {
        kinship::relationship_summary(&self.kinship, a, b, self.config.max_depth)
    }

    /// Shortest relationship path using at most `max_distance` edges.
    pub fn shortest_path(
        &self,
        a: &PersonKey,
        b: &PersonKey,
        max_distance: u32,
    ) -> Result<PathOutcome, LineageError> {
        path::shortest_path(&self.graph, a, b, max_distance)
    }

    /// Shortest relationship path within the configured distance.
    pub fn shortest_path_default(
        &self,
        a: &PersonKey,
        b: &PersonKey,
    ) -> Result<PathOutcome, LineageError> {
        self.shortest_path(a, b, self.config.max_distance)
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// The query facade. Share it behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct Engine {
    live: RwLock<Arc<Snapshot>>,
    reloading: Mutex<()>,
    config: EngineConfig,
}

impl Engine {
    /// Build an engine over `records` with the default configuration.
    pub fn new(records: RecordSet) -> Result<Self, LineageError> {
        Self::with_config(records, EngineConfig::default())
    }

    /// Build an engine over `records` with `config`.
    pub fn with_config(records: RecordSet, config: EngineConfig) -> Result<Self, LineageError> {
        config.validate()?;
        let snapshot = Snapshot::build(records, GraphVersion::INITIAL, config.clone())?;
        tracing::info!(
            version = %snapshot.version(),
            persons = snapshot.graph().person_count(),
            "lineage engine ready"
        );
        Ok(Self {
            live: RwLock::new(Arc::new(snapshot)),
            reloading: Mutex::new(()),
            config,
        })
    }

    /// Pin the live snapshot for a batch of consistent queries.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let live = self.live.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*live)
    }

    /// Replace the graph with one built from `records`.
    ///
    /// On failure the live snapshot is left untouched. Concurrent reloads
    /// are serialized so versions stay strictly increasing.
    pub fn reload(&self, records: RecordSet) -> Result<GraphVersion, LineageError> {
        let _guard = self.reloading.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.version();
        let next = match Snapshot::build(records, previous.next(), self.config.clone()) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                tracing::warn!(live = %previous, error = %e, "reload rejected");
                return Err(e);
            }
        };

        let version = next.version();
        *self.live.write().unwrap_or_else(PoisonError::into_inner) = next;
        tracing::info!(from = %previous, to = %version, "graph reloaded");
        Ok(version)
    }

    /// Version of the live snapshot.
    #[must_use]
    pub fn version(&self) -> GraphVersion {
        self.snapshot().version()
    }

    /// The configuration every snapshot is built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Side of the pedigree a number belongs to.
    #[must_use]
    pub fn branch_of(number: &SosaNumber) -> Branch {
        sosa::branch_of(number)
    }

    /// Generation of a number, the root being 1.
    #[must_use]
    pub fn generation_of(number: &SosaNumber) -> u32 {
        sosa::generation_of(number)
    }

    /// English label for a classification.
    #[must_use]
    pub fn describe(result: &RelationshipResult) -> String {
        describe::describe(result)
    }

    /// Sosa number of `target` relative to `root` on the live snapshot.
    pub fn sosa_of(&self, root: &PersonKey, target: &PersonKey) -> Result<SosaLookup, LineageError> {
        self.snapshot().sosa_of(root, target)
    }

    /// Sosa number of `target` relative to the configured default root.
    pub fn sosa_of_default_root(&self, target: &PersonKey) -> Result<SosaLookup, LineageError> {
        self.snapshot().sosa_of_default_root(target)
    }

    /// The complete numbering of `root`.
    pub fn sosa_table(&self, root: &PersonKey) -> Result<Arc<SosaTable>, LineageError> {
        self.snapshot().sosa_table(root)
    }

    /// Persons from the ancestor at `number` down to `root`.
    pub fn ancestor_chain(
        &self,
        root: &PersonKey,
        number: &SosaNumber,
    ) -> Result<Option<Vec<PersonKey>>, LineageError> {
        self.snapshot().ancestor_chain(root, number)
    }

    /// Classify with the configured depth.
    pub fn classify(&self, a: &PersonKey, b: &PersonKey) -> Result<RelationshipResult, LineageError> {
        self.snapshot().classify(a, b)
    }

    /// Classify with explicit options.
    pub fn classify_with(
        &self,
        a: &PersonKey,
        b: &PersonKey,
        options: ClassifyOptions,
    ) -> Result<RelationshipResult, LineageError> {
        self.snapshot().classify_with(a, b, options)
    }

    /// Every common ancestor within the configured depth, best first.
    pub fn common_ancestors(
        &self,
        a: &PersonKey,
        b: &PersonKey,
    ) -> Result<Vec<CommonAncestor>, LineageError> {
        self.snapshot().common_ancestors(a, b)
    }

    /// Kinship coefficient of `a` and `b`.
    pub fn kinship_coefficient(
        &self,
        a: &PersonKey,
        b: &PersonKey,
    ) -> Result<Coefficient, LineageError> {
        self.snapshot().kinship_coefficient(a, b)
    }

    /// Inbreeding coefficient of `person`.
    pub fn consanguinity(&self, person: &PersonKey) -> Result<Coefficient, LineageError> {
        self.snapshot().consanguinity(person)
    }

    /// Kinship coefficient with nearest common ancestors and their lines.
    pub fn relationship_summary(
        &self,
        a: &PersonKey,
        b: &PersonKey,
    ) -> Result<RelationshipSummary, LineageError> {
        self.snapshot().relationship_summary(a, b)
    }

    /// Shortest relationship path using at most `max_distance` edges.
    pub fn shortest_path(
        &self,
        a: &PersonKey,
        b: &PersonKey,
        max_distance: u32,
    ) -> Result<PathOutcome, LineageError> {
        self.snapshot().shortest_path(a, b, max_distance)
    }
}

// =============================================================================
// TESTS
// =============================================================================
