//! Radio driver packet queue
//!
//! The radio keeps completed packets in a small queue of held slots. A packet
//! is held from the moment the receive interrupt fires until the main loop
//! releases it, so the loop can copy it out at its own pace.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{trace, warn};

use super::receive::PacketNotifier;

/// Opaque token for a held packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketHandle(pub u32);

/// A completed packet waiting in the driver queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketInfo {
    pub handle: PacketHandle,
    /// Byte count reported by the driver
    pub bytes: usize,
}

/// Access to the driver's completed-packet queue
pub trait PacketQueue {
    /// Oldest completed packet still held, `None` once the queue is empty
    fn oldest_complete(&self) -> Option<PacketInfo>;

    /// Copy the packet's bytes into `dest`, returning the number copied.
    /// `dest` must be at least as long as the packet's reported byte count.
    fn copy_packet(&self, handle: PacketHandle, dest: &mut [u8]) -> usize;

    /// Hand the packet's slot back to the driver
    fn release(&self, handle: PacketHandle);
}

impl<Q: PacketQueue + ?Sized> PacketQueue for Arc<Q> {
    fn oldest_complete(&self) -> Option<PacketInfo> {
        (**self).oldest_complete()
    }

    fn copy_packet(&self, handle: PacketHandle, dest: &mut [u8]) -> usize {
        (**self).copy_packet(handle, dest)
    }

    fn release(&self, handle: PacketHandle) {
        (**self).release(handle)
    }
}

struct HeldPacket {
    handle: PacketHandle,
    data: Vec<u8>,
}

/// Host-side stand-in for the radio driver
///
/// `receive` plays the part of the receive interrupt: it holds the packet in a
/// free slot and raises the notifier. When every slot is held the packet is
/// lost, as it would be on the radio.
pub struct SimulatedRadio {
    held: Mutex<VecDeque<HeldPacket>>,
    slots: usize,
    next_handle: AtomicU32,
    notifier: PacketNotifier,
    received: AtomicU64,
    dropped: AtomicU64,
}

impl SimulatedRadio {
    pub fn new(slots: usize) -> Self {
        Self {
            held: Mutex::new(VecDeque::with_capacity(slots)),
            slots: slots.max(1),
            next_handle: AtomicU32::new(1),
            notifier: PacketNotifier::new(),
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Notifier raised for every held packet
    pub fn notifier(&self) -> PacketNotifier {
        self.notifier.clone()
    }

    /// Receive interrupt: hold a completed packet and flag the main loop.
    ///
    /// Runs on a host thread, not in interrupt context, so it may take the
    /// slot mutex and log a drop. Only `PacketNotifier::notify` stands for
    /// the non-blocking interrupt side.
    pub fn receive(&self, data: Vec<u8>) -> Option<PacketHandle> {
        let mut held = self.lock();
        if held.len() >= self.slots {
            drop(held);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("All {} packet slots held, dropping packet", self.slots);
            return None;
        }

        let handle = PacketHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        trace!("Holding packet {:?} ({} bytes)", handle, data.len());
        held.push_back(HeldPacket { handle, data });
        drop(held);

        self.received.fetch_add(1, Ordering::Relaxed);
        self.notifier.notify();
        Some(handle)
    }

    /// Packets currently held
    pub fn held(&self) -> usize {
        self.lock().len()
    }

    /// Every slot is held; the next packet would be lost
    pub fn is_full(&self) -> bool {
        self.held() >= self.slots
    }

    pub fn packets_received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn packets_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<HeldPacket>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PacketQueue for SimulatedRadio {
    fn oldest_complete(&self) -> Option<PacketInfo> {
        self.lock().front().map(|packet| PacketInfo {
            handle: packet.handle,
            bytes: packet.data.len(),
        })
    }

    fn copy_packet(&self, handle: PacketHandle, dest: &mut [u8]) -> usize {
        let held = self.lock();
        match held.iter().find(|packet| packet.handle == handle) {
            Some(packet) => {
                let n = packet.data.len().min(dest.len());
                dest[..n].copy_from_slice(&packet.data[..n]);
                n
            }
            None => {
                warn!("Copy from unknown packet {:?}", handle);
                0
            }
        }
    }

    fn release(&self, handle: PacketHandle) {
        let mut held = self.lock();
        match held.iter().position(|packet| packet.handle == handle) {
            Some(index) => {
                held.remove(index);
            }
            None => warn!("Release of unknown packet {:?}", handle),
        }
    }
}
