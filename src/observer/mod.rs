use crate::decode::UnitId;
use crate::engine::Engine;
use crate::error::{ConnectomeError, Result};
use crate::state::UnitMeta;

/// A read-only copy of the committed engine state.
///
/// Design intent:
/// - The engine has a single writer; snapshots are what other readers get.
/// - Snapshotting allocates; the tick loop itself stays unchanged.
/// - Metadata is kept in its one-byte form (bit 7 discharge flag, bits 0-6 idle count).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineSnapshot {
    pub tick: u64,
    pub signaling: Vec<i8>,
    pub outputs: Vec<i16>,
    pub meta: Vec<u8>,
}

impl EngineSnapshot {
    pub fn cell_count(&self) -> usize {
        self.signaling.len() + self.outputs.len()
    }

    pub fn current_potential(&self, id: UnitId) -> Result<i16> {
        let i = id as usize;
        if let Some(&p) = self.signaling.get(i) {
            return Ok(p as i16);
        }
        self.outputs
            .get(i - self.signaling.len())
            .copied()
            .ok_or(ConnectomeError::InvalidUnitId {
                id,
                limit: self.cell_count() as u16,
            })
    }

    pub fn discharged(&self, ids: &[UnitId]) -> Result<Vec<bool>> {
        let limit = self.signaling.len();
        ids.iter()
            .map(|&id| {
                let i = id as usize;
                if i >= limit {
                    return Err(ConnectomeError::InvalidUnitId {
                        id,
                        limit: limit as u16,
                    });
                }
                // A deserialized snapshot may carry fewer meta bytes than units.
                Ok(self
                    .meta
                    .get(i)
                    .is_some_and(|&b| UnitMeta::from_packed(b).discharged))
            })
            .collect()
    }

    /// Ids of signaling units that discharged on the snapshot's tick.
    pub fn discharged_units(&self) -> Vec<UnitId> {
        self.meta
            .iter()
            .enumerate()
            .take(self.signaling.len())
            .filter(|(_, b)| UnitMeta::from_packed(**b).discharged)
            .map(|(i, _)| i as UnitId)
            .collect()
    }
}

pub struct EngineAdapter<'a, 't> {
    engine: &'a Engine<'t>,
}

impl<'a, 't> EngineAdapter<'a, 't> {
    pub fn new(engine: &'a Engine<'t>) -> Self {
        Self { engine }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.engine.state();
        EngineSnapshot {
            tick: self.engine.ticks(),
            signaling: state.signaling_current().to_vec(),
            outputs: state.output_current().to_vec(),
            meta: state.metas().iter().map(|m| m.packed()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::wiring::TableBuilder;

    #[test]
    fn snapshot_matches_engine_queries() {
        let t = TableBuilder::random(20, 26, 4, 5).build().unwrap();
        let mut e = Engine::new(&t);
        let ids: Vec<UnitId> = (0..20).collect();
        for i in 0..30u16 {
            e.tick(&[i % 20]).unwrap();
        }

        let snap = EngineAdapter::new(&e).snapshot();
        assert_eq!(snap.tick, 30);
        assert_eq!(snap.cell_count(), 26);
        for id in 0..26 {
            assert_eq!(snap.current_potential(id), e.current_potential(id));
        }
        assert_eq!(snap.discharged(&ids), e.discharged(&ids));

        let fired: Vec<UnitId> = ids
            .iter()
            .copied()
            .filter(|&id| e.discharged(&[id]).unwrap()[0])
            .collect();
        assert_eq!(snap.discharged_units(), fired);
    }

    #[test]
    fn snapshot_rejects_bad_ids() {
        let t = TableBuilder::new(2, 3).build().unwrap();
        let e = Engine::new(&t);
        let snap = EngineAdapter::new(&e).snapshot();
        assert_eq!(
            snap.current_potential(3),
            Err(ConnectomeError::InvalidUnitId { id: 3, limit: 3 })
        );
        assert_eq!(
            snap.discharged(&[2]),
            Err(ConnectomeError::InvalidUnitId { id: 2, limit: 2 })
        );
    }

    #[test]
    fn discharge_flags_stop_at_signaling_units() {
        let snap = EngineSnapshot {
            tick: 4,
            signaling: vec![0, 50],
            outputs: vec![3],
            meta: vec![0x00, 0x80, 0x80],
        };
        assert_eq!(snap.discharged(&[0, 1]), Ok(vec![false, true]));
        assert_eq!(
            snap.discharged(&[2]),
            Err(ConnectomeError::InvalidUnitId { id: 2, limit: 2 })
        );
        assert_eq!(snap.discharged_units(), vec![1]);
    }

    #[test]
    fn snapshots_can_be_shared_across_threads() {
        let mut b = TableBuilder::new(2, 2);
        b.connect(0, 1, 9).unwrap();
        let t = b.build().unwrap();
        let mut e = Engine::new(&t);
        e.tick(&[0]).unwrap();

        let snap = Arc::new(EngineAdapter::new(&e).snapshot());

        // Later ticks do not affect a published snapshot.
        e.tick(&[0]).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&snap);
                thread::spawn(move || s.current_potential(1))
            })
            .collect();
        for r in readers {
            assert_eq!(r.join().unwrap(), Ok(9));
        }
        assert_eq!(e.current_potential(1), Ok(18));
    }
}
