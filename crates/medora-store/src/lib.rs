//! Data model and collaborator stores for Medora.
//!
//! The study core never talks to a database directly. It exchanges in-memory
//! values with two collaborators, [`MaterialStore`] and [`ProfileStore`],
//! and only ever sends whole-field replacements ([`patch`]).

pub mod error;
pub mod migration;
pub mod models;
pub mod patch;
pub mod repositories;

pub use error::StoreError;
pub use patch::{MaterialPatch, ProfilePatch};
pub use repositories::{
    InMemoryMaterialStore, InMemoryProfileStore, JsonFileProfileStore, MaterialStore,
    ProfileStore,
};
