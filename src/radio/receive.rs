//! Interrupt → main loop packet handoff
//!
//! The receive interrupt only holds the packet and raises a flag. The main
//! loop clears the flag and then walks the driver queue until it is empty, so
//! the flag just means "work may be pending": several interrupts before a
//! drain collapse into one, and the queue walk still picks up every packet.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

use super::bits::RawCapture;
use super::decoder::{Decoder, DecoderStats};
use super::driver::{PacketInfo, PacketQueue};
use crate::rts::ButtonEvent;

/// Single-slot "packet available" flag shared with the interrupt context
#[derive(Debug, Clone, Default)]
pub struct PacketNotifier {
    pending: Arc<AtomicBool>,
}

impl PacketNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupt side: mark work as pending. Never blocks.
    pub fn notify(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Loop side: clear the flag, returning whether it was set
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    PacketPending,
    Draining,
}

/// Counters for the drain loop itself
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoopStats {
    pub drains: u64,
    pub packets: u64,
    pub overflows: u64,
    pub short_copies: u64,
    pub released: u64,
}

/// Cooperative loop draining the driver queue into the decoder
pub struct ReceiveLoop<Q: PacketQueue> {
    queue: Q,
    notifier: PacketNotifier,
    capture: RawCapture,
    decoder: Decoder,
    state: LoopState,
    stats: LoopStats,
}

impl<Q: PacketQueue> ReceiveLoop<Q> {
    pub fn new(queue: Q, notifier: PacketNotifier) -> Self {
        Self {
            queue,
            notifier,
            capture: RawCapture::new(),
            decoder: Decoder::new(),
            state: LoopState::Idle,
            stats: LoopStats::default(),
        }
    }

    /// One loop iteration; never blocks. Returns the events decoded during
    /// this iteration's drain.
    pub fn process_action(&mut self) -> Vec<ButtonEvent> {
        // Clear before draining: a packet completing mid-drain raises the
        // flag again and is picked up next iteration at the latest.
        if !self.notifier.take() {
            return Vec::new();
        }

        self.state = LoopState::Draining;
        self.stats.drains += 1;

        let mut events = Vec::new();
        while let Some(packet) = self.queue.oldest_complete() {
            if let Some(event) = self.handle_packet(packet) {
                events.push(event);
            }
            self.queue.release(packet.handle);
            self.stats.released += 1;
        }

        self.state = LoopState::Idle;
        events
    }

    fn handle_packet(&mut self, packet: PacketInfo) -> Option<ButtonEvent> {
        self.stats.packets += 1;
        trace!("Draining packet {:?} ({} bytes)", packet.handle, packet.bytes);

        let dest = match self.capture.load(packet.bytes) {
            Ok(dest) => dest,
            Err(err) => {
                self.stats.overflows += 1;
                warn!("OVF! {}", err);
                return None;
            }
        };
        let copied = self.queue.copy_packet(packet.handle, dest);
        if copied != packet.bytes {
            // the rest of the buffer still holds the previous packet
            self.stats.short_copies += 1;
            warn!(
                "Short copy of packet {:?}: {} of {} bytes",
                packet.handle, copied, packet.bytes
            );
            return None;
        }

        self.decoder.decode(&mut self.capture).ok()
    }

    /// Current state as seen from outside the loop
    pub fn state(&self) -> LoopState {
        match self.state {
            LoopState::Idle if self.notifier.is_pending() => LoopState::PacketPending,
            state => state,
        }
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn decoder_stats(&self) -> &DecoderStats {
        &self.decoder.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::driver::{PacketHandle, SimulatedRadio};
    use crate::radio::testing::{encode_capture, seal, Framing};
    use crate::radio::timing::CAPTURE_CAPACITY;
    use crate::rts::Button;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    /// Scripted driver queue that records every call
    #[derive(Default)]
    struct ScriptedQueue {
        packets: RefCell<VecDeque<(PacketInfo, Vec<u8>)>>,
        copies: RefCell<Vec<PacketHandle>>,
        releases: RefCell<HashMap<PacketHandle, u32>>,
        /// raised when the queue is first polled, as if a packet completed mid-drain
        interrupt_during_drain: Option<PacketNotifier>,
    }

    impl ScriptedQueue {
        fn push(&self, handle: u32, reported_bytes: usize, data: Vec<u8>) {
            let info = PacketInfo {
                handle: PacketHandle(handle),
                bytes: reported_bytes,
            };
            self.packets.borrow_mut().push_back((info, data));
        }

        fn releases_of(&self, handle: u32) -> u32 {
            self.releases
                .borrow()
                .get(&PacketHandle(handle))
                .copied()
                .unwrap_or(0)
        }
    }

    impl PacketQueue for ScriptedQueue {
        fn oldest_complete(&self) -> Option<PacketInfo> {
            if let Some(notifier) = &self.interrupt_during_drain {
                notifier.notify();
            }
            self.packets.borrow().front().map(|(info, _)| *info)
        }

        fn copy_packet(&self, handle: PacketHandle, dest: &mut [u8]) -> usize {
            self.copies.borrow_mut().push(handle);
            let packets = self.packets.borrow();
            let (_, data) = packets
                .iter()
                .find(|(info, _)| info.handle == handle)
                .expect("copy of a queued packet");
            dest[..data.len()].copy_from_slice(data);
            data.len()
        }

        fn release(&self, handle: PacketHandle) {
            *self.releases.borrow_mut().entry(handle).or_default() += 1;
            self.packets.borrow_mut().retain(|(info, _)| info.handle != handle);
        }
    }

    fn example_capture() -> Vec<u8> {
        encode_capture(seal([0x00, 0x42, 0x00, 0x2A, 0x3C, 0x2B, 0x1A]), Framing::Plain)
    }

    #[test]
    fn test_notifier_collapses_notifications() {
        let notifier = PacketNotifier::new();
        notifier.notify();
        notifier.notify();
        notifier.notify();
        assert!(notifier.take());
        assert!(!notifier.take());
    }

    #[test]
    fn test_idle_without_notification() {
        let queue = ScriptedQueue::default();
        queue.push(1, 4, vec![0; 4]);
        let mut receive = ReceiveLoop::new(queue, PacketNotifier::new());

        assert!(receive.process_action().is_empty());
        assert_eq!(receive.state(), LoopState::Idle);
        // no flag, no queue walk
        assert_eq!(receive.queue.releases_of(1), 0);
    }

    #[test]
    fn test_overflow_skips_decode_and_releases_once() {
        let queue = ScriptedQueue::default();
        queue.push(7, CAPTURE_CAPACITY + 1, vec![0xFF; CAPTURE_CAPACITY + 1]);
        let notifier = PacketNotifier::new();
        let mut receive = ReceiveLoop::new(queue, notifier.clone());

        notifier.notify();
        assert!(receive.process_action().is_empty());

        assert!(receive.queue.copies.borrow().is_empty());
        assert_eq!(receive.queue.releases_of(7), 1);
        assert_eq!(receive.stats().overflows, 1);
        // the decoder never saw it
        assert_eq!(receive.decoder_stats().packets, 0);
    }

    #[test]
    fn test_end_to_end_drain() {
        let queue = ScriptedQueue::default();
        queue.push(1, 200, vec![0; 200]);
        queue.push(2, CAPTURE_CAPACITY, example_capture());
        let notifier = PacketNotifier::new();
        let mut receive = ReceiveLoop::new(queue, notifier.clone());

        notifier.notify();
        assert_eq!(receive.state(), LoopState::PacketPending);

        let events = receive.process_action();
        assert_eq!(
            events,
            vec![ButtonEvent {
                remote_address: 0x1A2B3C,
                rolling_code: 42,
                button: Button::Down,
            }]
        );

        assert_eq!(receive.queue.releases_of(1), 1);
        assert_eq!(receive.queue.releases_of(2), 1);
        assert_eq!(*receive.queue.copies.borrow(), vec![PacketHandle(2)]);
        assert_eq!(receive.stats().overflows, 1);
        assert_eq!(receive.stats().released, 2);
        assert_eq!(receive.state(), LoopState::Idle);
    }

    #[test]
    fn test_short_copy_skips_decode() {
        let queue = ScriptedQueue::default();
        queue.push(1, CAPTURE_CAPACITY, example_capture());
        // driver reports a full packet but has nothing to copy
        queue.push(2, CAPTURE_CAPACITY, Vec::new());
        let notifier = PacketNotifier::new();
        let mut receive = ReceiveLoop::new(queue, notifier.clone());

        notifier.notify();
        let events = receive.process_action();

        // no second event decoded from the bytes packet 1 left behind
        assert_eq!(events.len(), 1);
        assert_eq!(receive.stats().short_copies, 1);
        assert_eq!(receive.decoder_stats().packets, 1);
        assert_eq!(receive.queue.releases_of(1), 1);
        assert_eq!(receive.queue.releases_of(2), 1);
    }

    #[test]
    fn test_failed_decode_still_released() {
        let queue = ScriptedQueue::default();
        queue.push(3, 16, vec![0x0F; 16]);
        queue.push(4, CAPTURE_CAPACITY, example_capture());
        let notifier = PacketNotifier::new();
        let mut receive = ReceiveLoop::new(queue, notifier.clone());

        notifier.notify();
        let events = receive.process_action();
        assert_eq!(events.len(), 1);
        assert_eq!(receive.queue.releases_of(3), 1);
        assert_eq!(receive.queue.releases_of(4), 1);
        assert_eq!(receive.decoder_stats().sync_errors, 1);
    }

    #[test]
    fn test_flag_cleared_before_drain() {
        let notifier = PacketNotifier::new();
        let queue = ScriptedQueue {
            interrupt_during_drain: Some(notifier.clone()),
            ..Default::default()
        };
        queue.push(1, CAPTURE_CAPACITY, example_capture());
        let mut receive = ReceiveLoop::new(queue, notifier.clone());

        notifier.notify();
        assert_eq!(receive.process_action().len(), 1);
        // the interrupt that fired mid-drain is not lost
        assert_eq!(receive.state(), LoopState::PacketPending);
        assert!(receive.process_action().is_empty());
    }

    #[test]
    fn test_drains_simulated_radio() {
        let radio = Arc::new(SimulatedRadio::new(4));
        let mut receive = ReceiveLoop::new(radio.clone(), radio.notifier());

        radio.receive(example_capture());
        radio.receive(encode_capture(
            seal([0xA7, 0x10, 0x00, 0x2B, 0x3C, 0x2B, 0x1A]),
            Framing::Repeated,
        ));

        let events = receive.process_action();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].button, Button::My);
        assert_eq!(events[1].rolling_code, 43);
        assert_eq!(radio.held(), 0);
        assert_eq!(receive.stats().drains, 1);
        assert_eq!(receive.decoder_stats().repeated_frames, 1);
    }
}
