//! Bounded staging buffer connecting one producer stage to one consumer
//! stage.
//!
//! The four operations `reserve`/`publish`/`wait`/`release` are the complete
//! contract; internal cursors are not exposed. Capacity accounting guarantees
//! that reserved plus filled slots never exceed the capacity fixed at
//! construction. Single-producer/single-consumer discipline is enforced by
//! the handle types: each side owns one non-clonable handle.
//!
//! There is no timeout: a live but stalled counterpart blocks the other side
//! indefinitely. Only a dropped counterpart unblocks the peer, with
//! `Disconnected`.

use std::{
    collections::VecDeque,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
};

use tracing::trace;

use crate::{config::BufferId, error::TileFlowError};

/// A published group of slots travelling producer to consumer.
struct SlotGroup {
    slots: usize,
    data: Vec<u8>,
}

struct RingState {
    /// Slots neither reserved nor filled nor draining.
    free: usize,
    filled: VecDeque<SlotGroup>,
    /// Recycled group buffers, handed back to `reserve`.
    spare: Vec<Vec<u8>>,
    producer_alive: bool,
    consumer_alive: bool,
}

struct Shared {
    id: BufferId,
    slot_bytes: usize,
    capacity: usize,
    state: Mutex<RingState>,
    /// Producer waits here for `release`.
    space_available: Condvar,
    /// Consumer waits here for `publish`.
    data_available: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates one staging buffer and splits it into its two endpoints.
pub fn staging_pair(
    id: BufferId,
    slot_bytes: usize,
    capacity_slots: usize,
) -> (StagingProducer, StagingConsumer) {
    let shared = Arc::new(Shared {
        id,
        slot_bytes,
        capacity: capacity_slots,
        state: Mutex::new(RingState {
            free: capacity_slots,
            filled: VecDeque::new(),
            spare: Vec::new(),
            producer_alive: true,
            consumer_alive: true,
        }),
        space_available: Condvar::new(),
        data_available: Condvar::new(),
    });
    (
        StagingProducer {
            shared: Arc::clone(&shared),
            pending: None,
        },
        StagingConsumer {
            shared,
            draining: None,
        },
    )
}

pub struct StagingProducer {
    shared: Arc<Shared>,
    pending: Option<SlotGroup>,
}

impl StagingProducer {
    pub fn id(&self) -> BufferId {
        self.shared.id
    }

    pub fn slot_bytes(&self) -> usize {
        self.shared.slot_bytes
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Blocks until `slots` slots are free, then claims them.
    ///
    /// This is capacity accounting only: the claimed region carries no data
    /// guarantee until `publish`. The write region is zero-initialized.
    pub fn reserve(&mut self, slots: usize) -> Result<(), TileFlowError> {
        if self.pending.is_some() {
            return Err(TileFlowError::ReservationActive { id: self.shared.id });
        }
        if slots == 0 || slots > self.shared.capacity {
            return Err(TileFlowError::ReservationTooLarge {
                requested: slots,
                capacity: self.shared.capacity,
            });
        }

        let mut state = self.shared.lock();
        loop {
            if !state.consumer_alive {
                return Err(TileFlowError::Disconnected { id: self.shared.id });
            }
            if state.free >= slots {
                break;
            }
            state = self
                .shared
                .space_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.free -= slots;
        let mut data = state.spare.pop().unwrap_or_default();
        drop(state);

        data.clear();
        data.resize(slots * self.shared.slot_bytes, 0);
        self.pending = Some(SlotGroup { slots, data });
        Ok(())
    }

    /// The reserved region transfers land in.
    pub fn write_region(&mut self) -> Result<&mut [u8], TileFlowError> {
        match self.pending.as_mut() {
            Some(group) => Ok(&mut group.data),
            None => Err(TileFlowError::NoReservation { id: self.shared.id }),
        }
    }

    /// Makes the reserved slots visible to the consumer.
    ///
    /// Must only be called after every transfer into the region has been
    /// barrier-confirmed complete.
    pub fn publish(&mut self, slots: usize) -> Result<(), TileFlowError> {
        let group = match self.pending.take() {
            Some(group) => group,
            None => return Err(TileFlowError::NoReservation { id: self.shared.id }),
        };
        if group.slots != slots {
            let reserved = group.slots;
            self.pending = Some(group);
            return Err(TileFlowError::PublishMismatch {
                published: slots,
                reserved,
            });
        }

        let mut state = self.shared.lock();
        if !state.consumer_alive {
            return Err(TileFlowError::Disconnected { id: self.shared.id });
        }
        state.filled.push_back(group);
        drop(state);
        trace!(buffer = self.shared.id.0, slots, "publish");
        self.shared.data_available.notify_one();
        Ok(())
    }
}

impl Drop for StagingProducer {
    fn drop(&mut self) {
        self.shared.lock().producer_alive = false;
        self.shared.data_available.notify_all();
    }
}

pub struct StagingConsumer {
    shared: Arc<Shared>,
    draining: Option<SlotGroup>,
}

impl StagingConsumer {
    pub fn id(&self) -> BufferId {
        self.shared.id
    }

    pub fn slot_bytes(&self) -> usize {
        self.shared.slot_bytes
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Blocks until a published group of exactly `slots` slots is available
    /// and takes it for draining.
    pub fn wait(&mut self, slots: usize) -> Result<(), TileFlowError> {
        if self.draining.is_some() {
            return Err(TileFlowError::GroupAlreadyHeld { id: self.shared.id });
        }

        let mut state = self.shared.lock();
        loop {
            match state.filled.front() {
                Some(front) if front.slots != slots => {
                    return Err(TileFlowError::GroupSizeMismatch {
                        requested: slots,
                        available: front.slots,
                    });
                }
                Some(_) => break,
                None => {
                    if !state.producer_alive {
                        return Err(TileFlowError::Disconnected { id: self.shared.id });
                    }
                    state = self
                        .shared
                        .data_available
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
        self.draining = state.filled.pop_front();
        Ok(())
    }

    /// The filled region being drained.
    pub fn read_region(&self) -> Result<&[u8], TileFlowError> {
        match self.draining.as_ref() {
            Some(group) => Ok(&group.data),
            None => Err(TileFlowError::NoFilledGroup { id: self.shared.id }),
        }
    }

    /// Returns the drained slots to the free pool.
    ///
    /// Must only be called after every transfer out of the region has been
    /// barrier-confirmed complete.
    pub fn release(&mut self, slots: usize) -> Result<(), TileFlowError> {
        let group = match self.draining.take() {
            Some(group) => group,
            None => return Err(TileFlowError::NoFilledGroup { id: self.shared.id }),
        };
        if group.slots != slots {
            let held = group.slots;
            self.draining = Some(group);
            return Err(TileFlowError::ReleaseMismatch {
                released: slots,
                held,
            });
        }

        let mut state = self.shared.lock();
        state.free += group.slots;
        state.spare.push(group.data);
        drop(state);
        trace!(buffer = self.shared.id.0, slots, "release");
        self.shared.space_available.notify_one();
        Ok(())
    }
}

impl Drop for StagingConsumer {
    fn drop(&mut self) {
        self.shared.lock().consumer_alive = false;
        self.shared.space_available.notify_all();
    }
}

#[path = "staging.test.rs"]
mod tests;
