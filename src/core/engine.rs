//! Tick-driven propagation over a [`ConnectionTable`].
//!
//! One call to [`Engine::tick`] runs, in order:
//!
//! 1. stimulate: propagate the outgoing connections of every stimulated unit
//! 2. discharge: every signaling unit whose committed potential is above the
//!    threshold propagates its connections and has its accumulator cleared
//! 3. idle decay: units that did not change for too long are reset to zero
//! 4. commit: accumulators become the committed state
//!
//! Nothing is visible to queries until the commit at the end of the tick.

use tracing::{debug, trace};

use crate::decode::UnitId;
use crate::error::{ConnectomeError, Result};
use crate::state::StateStore;
use crate::table::ConnectionTable;

pub const DEFAULT_THRESHOLD: i8 = 30;
pub const DEFAULT_IDLE_LIMIT: u8 = 10;

/// Largest idle limit for which the 7-bit idle counter can never reach 127.
///
/// The counter is observed at most at `idle_limit + 1` before it is reset.
pub const MAX_IDLE_LIMIT: u8 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// A signaling unit discharges when its committed potential is strictly above this.
    pub threshold: i8,
    /// Ticks without change a unit may sit through before it is forced to zero.
    pub idle_limit: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            idle_limit: DEFAULT_IDLE_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn with_threshold(mut self, threshold: i8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_idle_limit(mut self, idle_limit: u8) -> Self {
        self.idle_limit = idle_limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.idle_limit > MAX_IDLE_LIMIT {
            return Err(ConnectomeError::InvalidConfig(
                "idle_limit must be <= 125 so the idle counter fits in 7 bits",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub cell_count: u16,
    pub signaling_count: u16,
    pub connection_count: usize,
    pub discharged_last_tick: usize,
    pub ticks: u64,
}

#[derive(Debug, Clone)]
pub struct Engine<'t> {
    table: &'t ConnectionTable,
    cfg: EngineConfig,
    state: StateStore,
    ticks: u64,
    discharged_last_tick: usize,
}

impl<'t> Engine<'t> {
    /// Engine with the default threshold and idle limit.
    pub fn new(table: &'t ConnectionTable) -> Self {
        // The default config is always within range.
        Self::build(table, EngineConfig::default())
    }

    pub fn with_config(table: &'t ConnectionTable, cfg: EngineConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self::build(table, cfg))
    }

    fn build(table: &'t ConnectionTable, cfg: EngineConfig) -> Self {
        debug!(
            cells = table.cell_count(),
            signaling = table.signaling_count(),
            threshold = cfg.threshold,
            idle_limit = cfg.idle_limit,
            "engine initialized"
        );
        Self {
            table,
            cfg,
            state: StateStore::new(table.signaling_count(), table.cell_count()),
            ticks: 0,
            discharged_last_tick: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn table(&self) -> &'t ConnectionTable {
        self.table
    }

    /// Advance by exactly one tick.
    ///
    /// All stimulus ids are checked before anything is touched; on error the
    /// engine is left as it was.
    pub fn tick(&mut self, stimuli: &[UnitId]) -> Result<()> {
        for &id in stimuli {
            self.check_cell(id)?;
        }

        for &id in stimuli {
            self.propagate(id);
        }

        let threshold = self.cfg.threshold as i16;
        let mut discharged = 0;
        for u in 0..self.table.signaling_count() {
            let fire = self.state.read_current(u) > threshold;
            if fire {
                self.propagate(u);
                self.state.write_next(u, 0);
                discharged += 1;
            }
            self.state.meta_mut(u).discharged = fire;
        }

        self.decay_idle();
        self.state.commit();

        self.ticks += 1;
        self.discharged_last_tick = discharged;
        trace!(tick = self.ticks, discharged, "tick committed");
        Ok(())
    }

    /// Inject `id`'s outgoing weights into the accumulators of its targets.
    fn propagate(&mut self, id: UnitId) {
        for c in self.table.connections_unchecked(id) {
            self.state.accumulate_next(c.target, c.weight);
        }
    }

    fn decay_idle(&mut self) {
        let limit = self.cfg.idle_limit;
        for u in 0..self.table.signaling_count() {
            let observed = self.state.meta(u).idle_ticks;

            if self.state.read_next(u) == self.state.read_current(u) {
                self.state.meta_mut(u).idle_ticks = observed + 1;
            }

            if observed > limit {
                self.state.write_next(u, 0);
                self.state.meta_mut(u).idle_ticks = 0;
            }
        }
    }

    fn check_cell(&self, id: UnitId) -> Result<()> {
        if id >= self.table.cell_count() {
            return Err(ConnectomeError::InvalidUnitId {
                id,
                limit: self.table.cell_count(),
            });
        }
        Ok(())
    }

    fn check_signaling(&self, id: UnitId) -> Result<()> {
        if id >= self.table.signaling_count() {
            return Err(ConnectomeError::InvalidUnitId {
                id,
                limit: self.table.signaling_count(),
            });
        }
        Ok(())
    }

    /// Committed potential of any unit.
    pub fn current_potential(&self, id: UnitId) -> Result<i16> {
        self.check_cell(id)?;
        Ok(self.state.read_current(id))
    }

    /// Discharge flags from the last committed tick, in request order.
    ///
    /// Every id must name a signaling unit.
    pub fn discharged(&self, ids: &[UnitId]) -> Result<Vec<bool>> {
        ids.iter()
            .map(|&id| {
                self.check_signaling(id)?;
                Ok(self.state.meta(id).discharged)
            })
            .collect()
    }

    pub fn idle_ticks(&self, id: UnitId) -> Result<u8> {
        self.check_signaling(id)?;
        Ok(self.state.meta(id).idle_ticks)
    }

    /// Committed potentials of all signaling units, indexed by id.
    pub fn signaling_potentials(&self) -> &[i8] {
        self.state.signaling_current()
    }

    /// Committed potentials of all output units; index 0 is id `signaling_count`.
    pub fn output_potentials(&self) -> &[i16] {
        self.state.output_current()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            cell_count: self.table.cell_count(),
            signaling_count: self.table.signaling_count(),
            connection_count: self.table.connection_count(),
            discharged_last_tick: self.discharged_last_tick,
            ticks: self.ticks,
        }
    }

    pub(crate) fn state(&self) -> &StateStore {
        &self.state
    }
}
