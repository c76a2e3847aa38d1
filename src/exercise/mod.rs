//! Exercise catalog: metadata schema, in-memory model, registry and progress store

pub mod metadata;
pub mod model;
pub mod progress;
pub mod registry;

pub use metadata::{ExerciseMetadata, MetadataError};
pub use model::{Exercise, Hints, ValidationConfig, ValidationMode};
pub use progress::{Progress, SessionLock};
pub use registry::{ExerciseRegistry, ProgressStats, RegistryError, RegistryPaths};
