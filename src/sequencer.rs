//!Reassembly of stream data into an in-order byte source.

use crate::varint::MAX_VARINT;
use getset::CopyGetters;
use std::collections::BTreeMap;
use thiserror::Error;

///Stream data that cannot be accepted by a [`StreamSequencer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    #[error("stream data ends at {end} beyond the final offset {close_offset}")]
    DataBeyondClose { end: u64, close_offset: u64 },
    #[error("final offset {offset} differs from the earlier final offset {close_offset}")]
    InconsistentFin { offset: u64, close_offset: u64 },
    #[error("final offset {offset} is below the {received} bytes already received")]
    FinBelowReceived { offset: u64, received: u64 },
    #[error("stream data at offset {offset} with length {length} exceeds the largest stream offset")]
    OffsetOverflow { offset: u64, length: usize },
}

///Buffers stream frames and exposes the contiguous bytes that follow the consumed offset.
#[derive(Debug, Default, CopyGetters)]
pub struct StreamSequencer {
    readable: Vec<u8>,
    out_of_order: BTreeMap<u64, Vec<u8>>,
    #[getset(get_copy = "pub")]
    num_bytes_consumed: u64,
    #[getset(get_copy = "pub")]
    close_offset: Option<u64>,
    level_triggered: bool,
}

impl StreamSequencer {
    ///Creates.
    pub fn new() -> Self {
        Self::default()
    }

    ///Records whether the owner wants all buffered data on every delivery,
    ///not only newly arrived bytes.
    ///
    ///[`StreamSequencer::readable_region`] always returns the whole contiguous
    ///buffer, so the flag changes nothing here; it only records the owner's request.
    pub fn set_level_triggered(&mut self, level_triggered: bool) {
        self.level_triggered = level_triggered;
    }

    ///Returns true if the owner asked for level-triggered delivery.
    pub fn is_level_triggered(&self) -> bool {
        self.level_triggered
    }

    fn contiguous_end(&self) -> u64 {
        self.num_bytes_consumed + self.readable.len() as u64
    }

    fn highest_received(&self) -> u64 {
        let parked_end = self
            .out_of_order
            .iter()
            .map(|(offset, data)| offset + data.len() as u64)
            .max()
            .unwrap_or(0);
        self.contiguous_end().max(parked_end)
    }

    ///Accepts stream data at `offset`. Overlapping and duplicate data is tolerated.
    ///
    ///Offsets past 2^62-1 and a FIN below data already received are rejected.
    pub fn on_stream_frame(&mut self, offset: u64, data: &[u8], fin: bool) -> Result<(), SequencerError> {
        let end = offset
            .checked_add(data.len() as u64)
            .filter(|end| *end <= MAX_VARINT)
            .ok_or(SequencerError::OffsetOverflow {
                offset,
                length: data.len(),
            })?;
        if fin {
            if let Some(close_offset) = self.close_offset {
                if close_offset != end {
                    return Err(SequencerError::InconsistentFin {
                        offset: end,
                        close_offset,
                    });
                }
            }
            let received = self.highest_received();
            if end < received {
                return Err(SequencerError::FinBelowReceived {
                    offset: end,
                    received,
                });
            }
            self.close_offset = Some(end);
        }
        if let Some(close_offset) = self.close_offset {
            if end > close_offset {
                return Err(SequencerError::DataBeyondClose { end, close_offset });
            }
        }

        let contiguous_end = self.contiguous_end();
        if end <= contiguous_end {
            return Ok(());
        }
        if offset <= contiguous_end {
            let skip = (contiguous_end - offset) as usize;
            self.readable.extend_from_slice(&data[skip..]);
            self.drain_out_of_order();
        } else {
            let entry = self.out_of_order.entry(offset).or_default();
            if data.len() > entry.len() {
                *entry = data.to_vec();
            }
        }
        Ok(())
    }

    fn drain_out_of_order(&mut self) {
        while let Some(entry) = self.out_of_order.first_entry() {
            let offset = *entry.key();
            let contiguous_end = self.num_bytes_consumed + self.readable.len() as u64;
            if offset > contiguous_end {
                break;
            }
            let data = entry.remove();
            let end = offset + data.len() as u64;
            if end > contiguous_end {
                let skip = (contiguous_end - offset) as usize;
                self.readable.extend_from_slice(&data[skip..]);
            }
        }
    }

    ///Returns the next contiguous readable region, or None if nothing is buffered.
    pub fn readable_region(&self) -> Option<&[u8]> {
        if self.readable.is_empty() {
            None
        } else {
            Some(&self.readable)
        }
    }

    ///Returns the number of contiguous bytes ready to read.
    pub fn readable_bytes(&self) -> usize {
        self.readable.len()
    }

    ///Marks `n` bytes of the readable region as finished with.
    pub fn mark_consumed(&mut self, n: usize) {
        debug_assert!(n <= self.readable.len());
        let n = n.min(self.readable.len());
        self.readable.drain(..n);
        self.num_bytes_consumed += n as u64;
    }

    ///Returns true once the final offset is known and everything before it is consumed.
    pub fn is_closed(&self) -> bool {
        self.close_offset == Some(self.num_bytes_consumed)
    }
}
