//! Building connection tables.
//!
//! [`TableBuilder`] collects edges per source unit and packs them into the
//! word layout read by [`ConnectionTable`]. [`NamedTable`] loads a connectome
//! described by unit names:
//!
//! ```json
//! { "ADAL": { "ADAR": 1, "MVL05": -2 }, "ADAR": {}, "MVL05": {} }
//! ```
//!
//! Negative weights are inhibitory. Every name seen as origin or target is a
//! unit; the caller decides which names are output units.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::decode::{encode_word, UnitId, Weight, ID_SPACE, WEIGHT_MAX, WEIGHT_MIN};
use crate::error::ConnectomeError;
use crate::prng::Prng;
use crate::table::ConnectionTable;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown unit name: {0}")]
    UnknownUnit(String),

    #[error("{cells} units do not fit the {max}-id space")]
    TooManyCells { cells: usize, max: u16 },

    #[error("malformed connectome json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Table(#[from] ConnectomeError),
}

#[derive(Debug, Clone)]
pub struct TableBuilder {
    signaling_count: u16,
    cell_count: u16,
    lists: Vec<Vec<u16>>,
}

impl TableBuilder {
    /// Ids `0..signaling_count` are signaling units, the rest up to
    /// `cell_count` output units.
    pub fn new(signaling_count: u16, cell_count: u16) -> Self {
        Self {
            signaling_count,
            cell_count,
            lists: vec![Vec::new(); cell_count as usize],
        }
    }

    /// Append a connection to `from`'s list.
    ///
    /// Weights outside the packed 7-bit range are saturated.
    pub fn connect(&mut self, from: UnitId, to: UnitId, weight: i32) -> Result<(), ConnectomeError> {
        for id in [from, to] {
            if id >= self.cell_count {
                return Err(ConnectomeError::InvalidUnitId {
                    id,
                    limit: self.cell_count,
                });
            }
        }

        let packed = weight.clamp(WEIGHT_MIN as i32, WEIGHT_MAX as i32) as Weight;
        if packed as i32 != weight {
            warn!(from, to, weight, saturated = packed, "connection weight saturated");
        }

        self.lists[from as usize].push(encode_word(to, packed));
        Ok(())
    }

    /// Reproducible random wiring: every signaling unit gets `fanout`
    /// connections to arbitrary other units, output units get none.
    pub fn random(signaling_count: u16, cell_count: u16, fanout: usize, seed: u64) -> Self {
        let mut b = Self::new(signaling_count, cell_count);
        let mut rng = Prng::new(seed);
        if cell_count < 2 {
            return b;
        }

        for from in 0..signaling_count.min(cell_count) {
            for _ in 0..fanout {
                let mut to = rng.gen_range_u16(0, cell_count);
                if to == from {
                    to = (to + 1) % cell_count;
                }
                let weight = rng.gen_range_i8(-20, 40);
                b.lists[from as usize].push(encode_word(to, weight));
            }
        }
        b
    }

    pub fn connection_count(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    /// Pack into a validated table.
    pub fn build(&self) -> Result<ConnectionTable, ConnectomeError> {
        let header_len = 1 + self.lists.len();
        let total = header_len + self.connection_count();
        if total > u16::MAX as usize {
            return Err(ConnectomeError::InvalidTable(format!(
                "{total} words cannot be addressed by 16-bit offsets"
            )));
        }

        let mut words = Vec::with_capacity(total);
        words.push(self.signaling_count);

        let mut offset = header_len;
        for list in &self.lists {
            words.push(offset as u16);
            offset += list.len();
        }
        for list in &self.lists {
            words.extend_from_slice(list);
        }

        ConnectionTable::from_words(words, self.cell_count)
    }
}

/// A connection table plus the unit names it was built from.
#[derive(Debug, Clone)]
pub struct NamedTable {
    table: ConnectionTable,
    names: Vec<String>,
    index: HashMap<String, UnitId>,
}

impl NamedTable {
    /// Parse a nested `origin -> target -> weight` map.
    ///
    /// Signaling units are numbered first in name order, output units (those
    /// for which `is_output` returns true) follow, also in name order.
    pub fn from_json_str(json: &str, is_output: impl Fn(&str) -> bool) -> Result<Self, BuildError> {
        let edges: BTreeMap<String, BTreeMap<String, i32>> = serde_json::from_str(json)?;

        let mut all: BTreeSet<&str> = BTreeSet::new();
        for (origin, targets) in &edges {
            all.insert(origin.as_str());
            all.extend(targets.keys().map(String::as_str));
        }

        let (outputs, signaling): (Vec<&str>, Vec<&str>) =
            all.into_iter().partition(|name| is_output(name));

        let cells = signaling.len() + outputs.len();
        if cells > ID_SPACE as usize {
            return Err(BuildError::TooManyCells {
                cells,
                max: ID_SPACE,
            });
        }

        let names: Vec<String> = signaling
            .iter()
            .chain(outputs.iter())
            .map(|s| s.to_string())
            .collect();
        let index: HashMap<String, UnitId> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i as UnitId))
            .collect();

        let mut builder = TableBuilder::new(signaling.len() as u16, cells as u16);
        for (origin, targets) in &edges {
            let from = index[origin.as_str()];
            for (target, &weight) in targets {
                builder.connect(from, index[target.as_str()], weight)?;
            }
        }
        let table = builder.build()?;

        debug!(
            signaling = signaling.len(),
            outputs = outputs.len(),
            "named connectome loaded"
        );

        Ok(Self {
            table,
            names,
            index,
        })
    }

    pub fn table(&self) -> &ConnectionTable {
        &self.table
    }

    pub fn id(&self, name: &str) -> Option<UnitId> {
        self.index.get(name).copied()
    }

    /// Resolve a list of names, failing on the first unknown one.
    pub fn ids<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<UnitId>, BuildError> {
        names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                self.id(n).ok_or_else(|| BuildError::UnknownUnit(n.to_string()))
            })
            .collect()
    }

    pub fn name(&self, id: UnitId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }
}
