//! # connectome
//!
//! Discrete-time emulation of a fixed network of signaling units ("neurons")
//! and output units ("muscles"), wired by a packed, read-only connection table.
//!
//! Each tick the engine propagates weighted influence from stimulated units and
//! from every unit above the discharge threshold, resets units that have sat
//! unchanged for too long, and commits the new potentials.
//!
//! ## Quick Start
//!
//! ```
//! use connectome::prelude::*;
//!
//! // Two signaling units and one output unit.
//! let mut wiring = TableBuilder::new(2, 3);
//! wiring.connect(0, 1, 40).unwrap();
//! wiring.connect(1, 2, 12).unwrap();
//! let table = wiring.build().unwrap();
//!
//! let mut engine = Engine::new(&table);
//! engine.tick(&[0]).unwrap(); // stimulate unit 0
//! engine.tick(&[]).unwrap(); // unit 1 is above threshold and discharges
//!
//! assert_eq!(engine.discharged(&[0, 1]).unwrap(), vec![false, true]);
//! assert_eq!(engine.current_potential(2).unwrap(), 12);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): `Serialize`/`Deserialize` for [`engine::EngineConfig`]
//!   and [`observer::EngineSnapshot`]
//!
//! ## Modules
//!
//! - [`decode`]: packed connection words
//! - [`table`]: validated connection table
//! - [`state`]: dual-buffered potentials
//! - [`engine`]: per-tick propagation and queries
//! - [`wiring`]: table construction from edges, names or a seed
//! - [`observer`]: read-only snapshots

#[path = "core/decode.rs"]
pub mod decode;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/table.rs"]
pub mod table;

#[path = "core/state.rs"]
pub mod state;

#[path = "core/engine.rs"]
pub mod engine;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/wiring.rs"]
pub mod wiring;

pub mod observer;

/// Prelude module for convenient imports.
///
/// ```
/// use connectome::prelude::*;
/// ```
pub mod prelude {
    pub use crate::decode::{decode_word, encode_word, Connection, UnitId, Weight};
    pub use crate::engine::{Diagnostics, Engine, EngineConfig};
    pub use crate::error::ConnectomeError;
    pub use crate::observer::{EngineAdapter, EngineSnapshot};
    pub use crate::table::ConnectionTable;
    pub use crate::wiring::{BuildError, NamedTable, TableBuilder};
}
