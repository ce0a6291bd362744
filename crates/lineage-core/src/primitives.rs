//! # Innate Primitives
//!
//! Compiled-in defaults and hard limits for the lineage engine.
//!
//! Every search the engine runs is bounded. The defaults below apply when
//! neither the caller nor the configuration picks a limit; the `MAX_*`
//! constants clamp whatever is picked.

/// Default number of parent edges the consanguinity search climbs per subject.
///
/// Twenty generations covers roughly five centuries of ancestry.
pub const DEFAULT_MAX_DEPTH: u32 = 20;

/// Hard cap on the consanguinity search depth.
///
/// Requests above this are clamped, never rejected at query time.
pub const MAX_ANCESTOR_DEPTH: u32 = 256;

/// Default number of edges the relationship path finder may use.
pub const DEFAULT_MAX_DISTANCE: u32 = 40;

/// Hard cap on the relationship path length.
pub const MAX_PATH_DISTANCE: u32 = 1000;

/// Environment variable overriding `EngineConfig::max_depth`.
pub const ENV_MAX_DEPTH: &str = "LINEAGE_MAX_DEPTH";

/// Environment variable overriding `EngineConfig::max_distance`.
pub const ENV_MAX_DISTANCE: &str = "LINEAGE_MAX_DISTANCE";

/// Environment variable naming the default Sosa root.
pub const ENV_SOSA_ROOT: &str = "LINEAGE_SOSA_ROOT";

/// Environment variable toggling `EngineConfig::distinguish_depth_exceeded`.
pub const ENV_DISTINGUISH_DEPTH_EXCEEDED: &str = "LINEAGE_DISTINGUISH_DEPTH_EXCEEDED";
