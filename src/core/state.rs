//! Dual-buffered unit potentials.
//!
//! Signaling units hold an `i8` potential, output units an `i16`. Every unit
//! has a committed (`current`) value and an accumulator (`next`) written during
//! a tick. Signaling potentials saturate at the `i8` bounds, output potentials
//! are stored as-is and wrap on `i16` overflow.
//!
//! Methods index directly and panic on ids `>= cell_count`; the engine checks
//! caller-supplied ids before they get here.

use crate::decode::UnitId;

/// Per-signaling-unit bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitMeta {
    /// Did the unit discharge on the most recently committed tick?
    pub discharged: bool,
    /// Consecutive ticks without a net change of potential.
    pub idle_ticks: u8,
}

impl UnitMeta {
    const DISCHARGE_BIT: u8 = 0x80;
    const IDLE_MASK: u8 = 0x7F;

    /// One-byte form: discharge flag in bit 7, idle count in bits 0-6.
    #[inline]
    pub fn packed(self) -> u8 {
        let flag = if self.discharged { Self::DISCHARGE_BIT } else { 0 };
        flag | (self.idle_ticks & Self::IDLE_MASK)
    }

    #[inline]
    pub fn from_packed(byte: u8) -> Self {
        Self {
            discharged: byte & Self::DISCHARGE_BIT != 0,
            idle_ticks: byte & Self::IDLE_MASK,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateStore {
    signaling_current: Vec<i8>,
    signaling_next: Vec<i8>,
    output_current: Vec<i16>,
    output_next: Vec<i16>,
    meta: Vec<UnitMeta>,
}

impl StateStore {
    /// All potentials and metadata start at zero.
    pub fn new(signaling_count: u16, cell_count: u16) -> Self {
        let n = signaling_count as usize;
        let m = cell_count.saturating_sub(signaling_count) as usize;
        Self {
            signaling_current: vec![0; n],
            signaling_next: vec![0; n],
            output_current: vec![0; m],
            output_next: vec![0; m],
            meta: vec![UnitMeta::default(); n],
        }
    }

    #[inline]
    pub fn signaling_count(&self) -> usize {
        self.signaling_current.len()
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.signaling_current.len() + self.output_current.len()
    }

    #[inline]
    pub fn read_current(&self, id: UnitId) -> i16 {
        let i = id as usize;
        match i.checked_sub(self.signaling_count()) {
            None => self.signaling_current[i] as i16,
            Some(o) => self.output_current[o],
        }
    }

    #[inline]
    pub fn read_next(&self, id: UnitId) -> i16 {
        let i = id as usize;
        match i.checked_sub(self.signaling_count()) {
            None => self.signaling_next[i] as i16,
            Some(o) => self.output_next[o],
        }
    }

    /// Signaling units clamp to `[-128, 127]`, output units store `value` raw.
    #[inline]
    pub fn write_next(&mut self, id: UnitId, value: i16) {
        let i = id as usize;
        match i.checked_sub(self.signaling_count()) {
            None => {
                self.signaling_next[i] = value.clamp(i8::MIN as i16, i8::MAX as i16) as i8;
            }
            Some(o) => self.output_next[o] = value,
        }
    }

    #[inline]
    pub fn accumulate_next(&mut self, id: UnitId, delta: i8) {
        let value = self.read_next(id).wrapping_add(delta as i16);
        self.write_next(id, value);
    }

    /// Publish `next` into `current` and clear the output accumulators.
    ///
    /// Signaling accumulators keep their value into the following tick.
    pub fn commit(&mut self) {
        self.signaling_current.copy_from_slice(&self.signaling_next);
        self.output_current.copy_from_slice(&self.output_next);
        self.output_next.fill(0);
    }

    #[inline]
    pub fn meta(&self, id: UnitId) -> UnitMeta {
        self.meta[id as usize]
    }

    #[inline]
    pub fn meta_mut(&mut self, id: UnitId) -> &mut UnitMeta {
        &mut self.meta[id as usize]
    }

    pub fn signaling_current(&self) -> &[i8] {
        &self.signaling_current
    }

    pub fn output_current(&self) -> &[i16] {
        &self.output_current
    }

    pub fn metas(&self) -> &[UnitMeta] {
        &self.meta
    }
}
