// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! PSX Interrupt Controller Implementation
//!
//! The interrupt controller collects interrupt requests from every device
//! and exposes a single pending value that the CPU polls each cycle.
//!
//! ## Registers
//!
//! - **I_STAT** (0x1F801070): Interrupt status register (R/W)
//!   - Reading returns current interrupt flags
//!   - Writing 1 to a bit acknowledges that interrupt (clears the bit)
//!   - Writing 0 to a bit has no effect
//!
//! - **I_MASK** (0x1F801074): Interrupt mask register (R/W)
//!   - Writing 1 to a bit enables that interrupt
//!   - Writing 0 to a bit has no effect
//!
//! ## Interrupt Sources (Bit Positions)
//!
//! ```text
//! Bit  | Source        | Description
//! -----|---------------|----------------------------------
//! 0    | VBLANK        | Vertical blank interrupt
//! 1    | GPU           | GPU command/transfer complete
//! 2    | CDROM         | CD-ROM controller
//! 3    | DMA           | DMA transfer complete
//! 4    | TIMER0        | Timer 0 interrupt
//! 5    | TIMER1        | Timer 1 interrupt
//! 6    | TIMER2        | Timer 2 interrupt
//! 7    | CONTROLLER    | Controller/memory card
//! 8    | SIO           | Serial I/O
//! 9    | SPU           | Sound processing unit
//! 10   | LIGHTPEN      | Lightpen/IRQ10 (PIO)
//! ```
//!
//! ## Requests
//!
//! Devices call [`InterruptController::request_interrupt`] with the previous
//! and new level of their interrupt line. Only a rising edge asserts. A
//! non-zero delay queues the request and schedules an
//! [`EventKind::Interrupt`] event; the event handler calls
//! [`InterruptController::deliver_due`].

use crate::core::error::Result;
use crate::core::memory::{region, BusName, BusRange, Device, Line, CPU_BUS};
use crate::core::scheduler::{Clock, Event, EventKind, SharedScheduler};

#[cfg(test)]
mod tests;

/// Interrupt source bit flags
///
/// These constants represent the bit positions in I_STAT and I_MASK registers
/// for each interrupt source.
pub mod interrupts {
    /// Vertical blank interrupt (bit 0)
    pub const VBLANK: u16 = 1 << 0;

    /// GPU command/transfer complete interrupt (bit 1)
    pub const GPU: u16 = 1 << 1;

    /// CD-ROM controller interrupt (bit 2)
    pub const CDROM: u16 = 1 << 2;

    /// DMA transfer complete interrupt (bit 3)
    pub const DMA: u16 = 1 << 3;

    /// Timer 0 interrupt (bit 4)
    pub const TIMER0: u16 = 1 << 4;

    /// Timer 1 interrupt (bit 5)
    pub const TIMER1: u16 = 1 << 5;

    /// Timer 2 interrupt (bit 6)
    pub const TIMER2: u16 = 1 << 6;

    /// Controller/memory card interrupt (bit 7)
    pub const CONTROLLER: u16 = 1 << 7;

    /// Serial I/O interrupt (bit 8)
    pub const SIO: u16 = 1 << 8;

    /// Sound processing unit interrupt (bit 9)
    pub const SPU: u16 = 1 << 9;

    /// Lightpen/IRQ10 (PIO) interrupt (bit 10)
    pub const LIGHTPEN: u16 = 1 << 10;

    /// All 11 implemented bits
    pub const ALL: u16 = 0x07FF;
}

/// A request waiting for its scheduled clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DelayedRequest {
    source: u16,
    target: Clock,
}

/// PlayStation Interrupt Controller
///
/// # Example
///
/// ```
/// use psx_engine::core::interrupt::{interrupts, InterruptController};
/// use psx_engine::core::scheduler::Scheduler;
///
/// let mut ic = InterruptController::new(Scheduler::shared());
///
/// // Rising edge on the VBLANK line
/// ic.request_interrupt(interrupts::VBLANK, false, true, 0);
///
/// // Enable VBLANK interrupts
/// ic.write_mask(interrupts::VBLANK as u32);
/// assert!(ic.is_pending());
///
/// // Acknowledge the interrupt (write 1 to clear)
/// ic.write_status(interrupts::VBLANK as u32);
/// assert!(!ic.is_pending());
/// ```
pub struct InterruptController {
    /// I_STAT (0x1F801070) - Interrupt status register
    status: u16,

    /// I_MASK (0x1F801074) - Interrupt mask register
    mask: u16,

    /// Requests queued with a non-zero delay
    delayed: Vec<DelayedRequest>,

    scheduler: SharedScheduler,
}

impl InterruptController {
    /// Create a new interrupt controller
    ///
    /// Initializes with all interrupts cleared and masked.
    pub fn new(scheduler: SharedScheduler) -> Self {
        Self {
            status: 0,
            mask: 0,
            delayed: Vec::new(),
            scheduler,
        }
    }

    /// Request an interrupt on a line transition
    ///
    /// Asserts `source` in I_STAT only on a false→true transition, and only
    /// if the bit is not already set. With a non-zero `delay` the assertion
    /// happens when the scheduler reaches `now + delay`.
    ///
    /// # Arguments
    ///
    /// * `source` - Interrupt bit (see [`interrupts`])
    /// * `prev_level` - Line level before the change
    /// * `new_level` - Line level after the change
    /// * `delay` - Propagation delay in cycles
    ///
    /// # Returns
    ///
    /// `true` if the request asserted or was queued
    pub fn request_interrupt(
        &mut self,
        source: u16,
        prev_level: bool,
        new_level: bool,
        delay: Clock,
    ) -> bool {
        if prev_level || !new_level {
            return false;
        }

        let source = source & interrupts::ALL;

        if delay == 0 {
            if self.status & source == source {
                return false;
            }
            self.request(source);
            return true;
        }

        if self.delayed.iter().any(|r| r.source == source) {
            return false;
        }

        let mut scheduler = self.scheduler.borrow_mut();
        let now = scheduler.now();
        let target = now + delay;
        self.delayed.push(DelayedRequest { source, target });
        scheduler.schedule_event(Event::once(
            EventKind::Interrupt,
            now,
            target,
            source as u32,
        ));

        log::trace!(
            "IRQ: 0x{:03X} queued for clock {} (delay {})",
            source,
            target,
            delay
        );
        true
    }

    /// Assert interrupt bits directly
    pub fn request(&mut self, interrupt: u16) {
        let bits = interrupt & interrupts::ALL;
        log::trace!("IRQ: assert 0x{:03X}", bits);
        self.status |= bits;
    }

    /// Deliver every delayed request whose clock has been reached
    ///
    /// # Returns
    ///
    /// Bits asserted by this call
    pub fn deliver_due(&mut self, now: Clock) -> u16 {
        let mut asserted = 0;
        self.delayed.retain(|r| {
            if r.target <= now {
                asserted |= r.source;
                false
            } else {
                true
            }
        });

        if asserted != 0 {
            self.request(asserted);
        }
        asserted
    }

    /// Number of requests waiting for their scheduled clock
    pub fn delayed_count(&self) -> usize {
        self.delayed.len()
    }

    /// Acknowledge (clear) interrupt bits
    pub fn acknowledge(&mut self, value: u16) {
        self.status &= !value;
    }

    /// Masked pending interrupts (`status & mask`)
    #[inline(always)]
    pub fn pending(&self) -> u16 {
        self.status & self.mask
    }

    /// Check whether any enabled interrupt is pending
    #[inline(always)]
    pub fn is_pending(&self) -> bool {
        self.pending() != 0
    }

    /// Read I_STAT
    pub fn read_status(&self) -> u32 {
        self.status as u32
    }

    /// Write I_STAT: bits written as 1 are cleared
    pub fn write_status(&mut self, value: u32) {
        self.acknowledge(value as u16 & interrupts::ALL);
    }

    /// Read I_MASK
    pub fn read_mask(&self) -> u32 {
        self.mask as u32
    }

    /// Write I_MASK: bits written as 1 are set
    pub fn write_mask(&mut self, value: u32) {
        self.mask |= value as u16 & interrupts::ALL;
    }

    /// Replace I_MASK outright (reset and snapshot restore)
    pub fn set_mask(&mut self, value: u16) {
        self.mask = value & interrupts::ALL;
    }

    /// Clear all state, dropping queued requests
    pub fn reset(&mut self) {
        self.status = 0;
        self.mask = 0;
        self.delayed.clear();
    }
}

impl Device for InterruptController {
    fn name(&self) -> &str {
        "Interrupt Controller"
    }

    fn ranges(&self, bus: BusName) -> Vec<BusRange> {
        match bus {
            CPU_BUS => region::mirrored(region::IRQ_CONTROL, 8, 0x7),
            _ => Vec::new(),
        }
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        Ok(match addr & 0x4 {
            0 => self.read_status(),
            _ => self.read_mask(),
        })
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        match addr & 0x4 {
            0 => self.write_status(value),
            _ => self.write_mask(value),
        }
        Ok(())
    }

    // Both registers live in the low half; the upper half is open
    fn write16(&mut self, addr: u32, value: u16) -> Result<()> {
        if addr & 0x2 == 0 {
            self.write32(addr, value as u32)?;
        }
        Ok(())
    }

    fn write8(&mut self, addr: u32, value: u8) -> Result<()> {
        let shift = (addr & 0x1) * 8;
        if addr & 0x2 == 0 {
            self.write32(addr, (value as u32) << shift)?;
        }
        Ok(())
    }

    fn signal(&mut self, line: Line, level: bool) {
        if line == Line::Reset && level {
            self.reset();
        }
    }
}
