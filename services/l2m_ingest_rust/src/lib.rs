//! L2M ingest service: reads cached raw reports, augments incorrect calls
//! with AI team attribution, and replaces each game's rows in the `calls`
//! table. Exposed as a library so integration tests can drive the pipeline
//! with fake collaborators.

pub mod config;
pub mod pipeline;
