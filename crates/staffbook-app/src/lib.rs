// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod debounce;
pub mod forms;
pub mod ids;
pub mod lifecycle;
pub mod listing;
pub mod model;
pub mod persist;
pub mod qualifications;
pub mod repository;
pub mod state;

pub use forms::*;
pub use ids::*;
pub use model::*;
pub use persist::{KeyValueStore, MemoryStore, OVERVIEW_STATE_KEY, PersistedOverviewState};
pub use qualifications::{
    CascadeReport, EnsureError, EnsuredQualification, QualificationCatalog, QualificationManager,
};
pub use repository::*;
pub use state::*;
