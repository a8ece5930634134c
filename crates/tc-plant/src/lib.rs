//! `tc-plant` — the plant graph model and its versioned store.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                      |
//! |-----------|---------------------------------------------------------------|
//! | [`model`] | `Point`, `Path`, `Block`, `PlantModel` (+ R-tree), builder     |
//! | [`store`] | `PlantStore` — copy-on-write snapshots with a generation counter |
//! | [`error`] | `PlantError`, `PlantResult<T>`                                 |
//!
//! # Snapshots
//!
//! A `PlantModel` is never mutated once built.  Lock-state changes and
//! topology edits go through [`PlantStore`], which installs a fresh
//! `Arc<PlantModel>` and bumps its generation.  Readers that captured the old
//! `Arc` keep a consistent (if stale) view; routers compare generations to
//! decide when their cached graphs must be rebuilt.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on element types.          |

pub mod error;
pub mod model;
pub mod store;


pub use error::{PlantError, PlantResult};
pub use model::{Block, Path, PlantModel, PlantModelBuilder, Point};
pub use store::PlantStore;
