//! Read-only connection table.
//!
//! Layout of the flat word array:
//!
//! - word `0`: number of signaling units
//! - words `1..=cell_count`: absolute index of the first word of each unit's
//!   connection list; a list ends where the next unit's begins, the last one
//!   at the end of the table
//! - remaining words: packed connections (see [`crate::decode`])
//!
//! The table is validated once on construction. After that every list is in
//! bounds and every decoded target is a valid unit id, so propagation needs no
//! further checks.

use core::ops::Range;

use tracing::debug;

use crate::decode::{decode_word, Connection, UnitId, ID_SPACE};
use crate::error::{ConnectomeError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTable {
    words: Vec<u16>,
    cell_count: u16,
    signaling_count: u16,
}

impl ConnectionTable {
    /// Validate `words` as a table describing `cell_count` units.
    pub fn from_words(words: impl Into<Vec<u16>>, cell_count: u16) -> Result<Self> {
        let words = words.into();

        if cell_count > ID_SPACE {
            return Err(ConnectomeError::InvalidTable(format!(
                "cell count {cell_count} exceeds the {ID_SPACE}-id target space"
            )));
        }

        let header_len = 1 + cell_count as usize;
        if words.len() < header_len {
            return Err(ConnectomeError::InvalidTable(format!(
                "header needs {header_len} words, table has {}",
                words.len()
            )));
        }

        let signaling_count = words[0];
        if signaling_count > cell_count {
            return Err(ConnectomeError::InvalidTable(format!(
                "signaling count {signaling_count} exceeds cell count {cell_count}"
            )));
        }

        let table = Self {
            words,
            cell_count,
            signaling_count,
        };

        for id in 0..cell_count {
            let span = table.span(id);
            if span.start < header_len || span.start > span.end || span.end > table.words.len() {
                return Err(ConnectomeError::InvalidTable(format!(
                    "unit {id} list {}..{} is outside the body {header_len}..{}",
                    span.start,
                    span.end,
                    table.words.len()
                )));
            }

            for &word in &table.words[span] {
                let target = decode_word(word).target;
                if target >= cell_count {
                    return Err(ConnectomeError::InvalidTable(format!(
                        "unit {id} connects to {target}, but only {cell_count} cells exist"
                    )));
                }
            }
        }

        debug!(
            cells = cell_count,
            signaling = signaling_count,
            connections = table.connection_count(),
            "connection table loaded"
        );

        Ok(table)
    }

    #[inline]
    pub fn cell_count(&self) -> u16 {
        self.cell_count
    }

    #[inline]
    pub fn signaling_count(&self) -> u16 {
        self.signaling_count
    }

    #[inline]
    pub fn output_count(&self) -> u16 {
        self.cell_count - self.signaling_count
    }

    #[inline]
    pub fn is_signaling(&self, id: UnitId) -> bool {
        id < self.signaling_count
    }

    /// Total number of connection words referenced by the header.
    pub fn connection_count(&self) -> usize {
        (0..self.cell_count).map(|id| self.span(id).len()).sum()
    }

    /// Raw table words, header included.
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// Decoded outgoing connections of `id`.
    pub fn connections(&self, id: UnitId) -> Result<impl Iterator<Item = Connection> + '_> {
        if id >= self.cell_count {
            return Err(ConnectomeError::InvalidUnitId {
                id,
                limit: self.cell_count,
            });
        }
        Ok(self.connections_unchecked(id))
    }

    /// Caller guarantees `id < cell_count`.
    #[inline]
    pub(crate) fn connections_unchecked(
        &self,
        id: UnitId,
    ) -> impl Iterator<Item = Connection> + '_ {
        self.words[self.span(id)].iter().map(|&w| decode_word(w))
    }

    fn span(&self, id: UnitId) -> Range<usize> {
        let idx = 1 + id as usize;
        let start = self.words[idx] as usize;
        let end = if id + 1 < self.cell_count {
            self.words[idx + 1] as usize
        } else {
            self.words.len()
        };
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::encode_word;

    // Three cells: 0 and 1 signaling, 2 output.
    // 0 -> 1 (+5), 0 -> 2 (-3); 1 -> 2 (+7); 2 has no list.
    fn small_words() -> Vec<u16> {
        vec![
            2,
            4,
            6,
            7,
            encode_word(1, 5),
            encode_word(2, -3),
            encode_word(2, 7),
        ]
    }

    #[test]
    fn reads_header_and_lists() {
        let t = ConnectionTable::from_words(small_words(), 3).unwrap();
        assert_eq!(t.cell_count(), 3);
        assert_eq!(t.signaling_count(), 2);
        assert_eq!(t.output_count(), 1);
        assert_eq!(t.connection_count(), 3);

        let c0: Vec<_> = t.connections(0).unwrap().collect();
        assert_eq!(
            c0,
            vec![
                Connection { target: 1, weight: 5 },
                Connection { target: 2, weight: -3 }
            ]
        );
        assert_eq!(t.connections(1).unwrap().count(), 1);
        assert_eq!(t.connections(2).unwrap().count(), 0);
        assert!(t.is_signaling(1));
        assert!(!t.is_signaling(2));
    }

    #[test]
    fn rejects_unknown_unit_in_lookup() {
        let t = ConnectionTable::from_words(small_words(), 3).unwrap();
        assert_eq!(
            t.connections(3).err(),
            Some(ConnectomeError::InvalidUnitId { id: 3, limit: 3 })
        );
    }

    #[test]
    fn rejects_signaling_count_above_cells() {
        let mut w = small_words();
        w[0] = 4;
        assert!(matches!(
            ConnectionTable::from_words(w, 3),
            Err(ConnectomeError::InvalidTable(_))
        ));
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(matches!(
            ConnectionTable::from_words(vec![2, 4], 3),
            Err(ConnectomeError::InvalidTable(_))
        ));
    }

    #[test]
    fn rejects_non_monotonic_offsets() {
        let mut w = small_words();
        w[1] = 6;
        w[2] = 4;
        assert!(matches!(
            ConnectionTable::from_words(w, 3),
            Err(ConnectomeError::InvalidTable(_))
        ));
    }

    #[test]
    fn rejects_offsets_into_header_or_past_end() {
        let mut w = small_words();
        w[1] = 2;
        assert!(ConnectionTable::from_words(w, 3).is_err());

        let mut w = small_words();
        w[3] = 99;
        assert!(ConnectionTable::from_words(w, 3).is_err());
    }

    #[test]
    fn rejects_targets_beyond_cell_count() {
        let mut w = small_words();
        w[6] = encode_word(3, 1);
        assert!(matches!(
            ConnectionTable::from_words(w, 3),
            Err(ConnectomeError::InvalidTable(_))
        ));
    }

    #[test]
    fn accepts_all_output_units() {
        let t = ConnectionTable::from_words(vec![0, 3, 3], 2).unwrap();
        assert_eq!(t.signaling_count(), 0);
        assert_eq!(t.output_count(), 2);
        assert_eq!(t.connection_count(), 0);
    }
}
