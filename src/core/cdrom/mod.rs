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

//! CD-ROM controller
//!
//! Four byte-wide ports at 0x1F801800, banked by the index register:
//!
//! ```text
//!          read                write idx0   write idx1   write idx2/3
//! +0       status              index        index        index
//! +1       response FIFO       command      -            -
//! +2       data FIFO           parameter    IE           -
//! +3       IE (idx0/2)         request      IF ack       -
//!          IF (idx1/3)
//! ```
//!
//! A command drains the parameter FIFO and queues one or two responses
//! (acknowledge, then completion). Each response carries an interrupt
//! class (INT1 data ready, INT2 complete, INT3 acknowledge, INT5 error) and
//! is delivered by a `CdromResponse` scheduler event, but only once the
//! CPU has cleared the previous class from IF. Delivery refills the
//! response FIFO and raises the CDROM line of the interrupt controller.
//!
//! While reading, a periodic `CdromRead` event pulls one sector from the
//! [`DiscSource`] into the sector buffer and queues INT1. Setting BFRD in
//! the request register copies the sector payload into the data FIFO, which
//! the CPU or DMA channel 3 then drains.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use psx_engine::core::cdrom::CDROM;
//! use psx_engine::core::interrupt::InterruptController;
//! use psx_engine::core::scheduler::Scheduler;
//!
//! let scheduler = Scheduler::shared();
//! let interrupts = Rc::new(RefCell::new(InterruptController::new(scheduler.clone())));
//! let mut cdrom = CDROM::new(scheduler.clone(), interrupts);
//!
//! cdrom.write_command(0x01); // Getstat
//! assert!(cdrom.is_busy());
//!
//! // Let the acknowledge arrive
//! let event = scheduler.borrow_mut().pop().unwrap();
//! cdrom.deliver_response(event.target);
//! assert_eq!(cdrom.interrupt_flag(), 3);
//! assert!(!cdrom.is_busy());
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use bitflags::bitflags;

mod commands;
mod disc;
#[cfg(test)]
mod tests;

pub use commands::Command;
pub use disc::{
    bcd_to_dec, build_sector, dec_to_bcd, CDPosition, DiscSource, SectorImage, PREGAP,
    SECTORS_PER_SECOND, SECTOR_SIZE,
};

use crate::core::error::{CdRomError, Result};
use crate::core::interrupt::{interrupts, InterruptController};
use crate::core::memory::{region, BusName, BusRange, Device, Line, CPU_BUS, DMA_BUS};
use crate::core::scheduler::{Clock, Event, EventKind, SharedScheduler};

bitflags! {
    /// Drive status byte, the first byte of most responses
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DriveStatus: u8 {
        const ERROR = 1 << 0;
        const MOTOR_ON = 1 << 1;
        const SEEK_ERROR = 1 << 2;
        const ID_ERROR = 1 << 3;
        const SHELL_OPEN = 1 << 4;
        const READING = 1 << 5;
        const SEEKING = 1 << 6;
        const PLAYING = 1 << 7;
    }
}

bitflags! {
    /// Setmode byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mode: u8 {
        const CDDA = 1 << 0;
        const AUTO_PAUSE = 1 << 1;
        const REPORT = 1 << 2;
        const XA_FILTER = 1 << 3;
        const IGNORE_BIT = 1 << 4;
        /// Deliver 2340 bytes per sector instead of 2048
        const WHOLE_SECTOR = 1 << 5;
        const XA_ADPCM = 1 << 6;
        const DOUBLE_SPEED = 1 << 7;
    }
}

/// Interrupt classes written to IF bits 0-2
pub mod int {
    pub const DATA_READY: u8 = 1;
    pub const COMPLETE: u8 = 2;
    pub const ACKNOWLEDGE: u8 = 3;
    pub const DATA_END: u8 = 4;
    pub const ERROR: u8 = 5;
}

/// A response waiting for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Interrupt class (see [`int`])
    pub class: u8,
    pub bytes: Vec<u8>,
    /// Command byte that produced it
    pub command: u8,
    /// Earliest delivery clock
    pub target: Clock,
    /// First response of a command; the controller is busy until it lands
    first: bool,
}

/// Default acknowledge latency in CPU cycles
pub const DEFAULT_ACK_DELAY: Clock = 50_000;

/// Default single-speed sector period (33.8688 MHz / 75)
pub const DEFAULT_SECTOR_CYCLES: Clock = 451_584;

/// Delivery retry interval while IF is still set
const RETRY_DELAY: Clock = 1_000;

const FIFO_SIZE: usize = 16;

/// CD-ROM controller
pub struct CDROM {
    /// Register bank select (0-3)
    index: u8,

    params: VecDeque<u8>,
    response: VecDeque<u8>,
    data: VecDeque<u8>,

    /// Last sector read from disc (raw, 2352 bytes)
    sector: Vec<u8>,

    pending: VecDeque<Response>,

    interrupt_enable: u8,
    interrupt_flag: u8,

    status: DriveStatus,
    mode: Mode,

    /// Setfilter file/channel
    filter: (u8, u8),

    /// Setloc target not yet consumed by a read or seek (LBA)
    seek_target: Option<u32>,

    /// LBA of the next sector to read
    position: u32,

    muted: bool,

    disc: Option<Box<dyn DiscSource>>,

    ack_delay: Clock,
    sector_cycles: Clock,

    scheduler: SharedScheduler,
    interrupts: Rc<RefCell<InterruptController>>,
}

impl CDROM {
    /// Create a controller with no disc inserted
    pub fn new(scheduler: SharedScheduler, interrupts: Rc<RefCell<InterruptController>>) -> Self {
        Self {
            index: 0,
            params: VecDeque::with_capacity(FIFO_SIZE),
            response: VecDeque::with_capacity(FIFO_SIZE),
            data: VecDeque::new(),
            sector: Vec::new(),
            pending: VecDeque::new(),
            interrupt_enable: 0,
            interrupt_flag: 0,
            status: DriveStatus::empty(),
            mode: Mode::empty(),
            filter: (0, 0),
            seek_target: None,
            position: 0,
            muted: false,
            disc: None,
            ack_delay: DEFAULT_ACK_DELAY,
            sector_cycles: DEFAULT_SECTOR_CYCLES,
            scheduler,
            interrupts,
        }
    }

    /// Override command latency and the single-speed sector period
    pub fn set_timing(&mut self, ack_delay: Clock, sector_cycles: Clock) {
        self.ack_delay = ack_delay;
        self.sector_cycles = sector_cycles;
    }

    /// Insert a disc; the drive spins up
    pub fn insert_disc(&mut self, disc: Box<dyn DiscSource>) {
        log::info!("CD-ROM: disc inserted ({} tracks)", disc.last_track());
        self.disc = Some(disc);
        self.status.remove(DriveStatus::SHELL_OPEN);
        self.status.insert(DriveStatus::MOTOR_ON);
    }

    /// Remove the disc, opening the shell
    pub fn eject(&mut self) -> Option<Box<dyn DiscSource>> {
        self.stop_reading();
        self.status = DriveStatus::SHELL_OPEN;
        self.disc.take()
    }

    pub fn has_disc(&self) -> bool {
        self.disc.is_some()
    }

    /// Current index register
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn drive_status(&self) -> DriveStatus {
        self.status
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// LBA of the next sector to read
    pub fn position(&self) -> u32 {
        self.position
    }

    /// IF bits 0-4
    pub fn interrupt_flag(&self) -> u8 {
        self.interrupt_flag & 0x1F
    }

    pub fn interrupt_enable(&self) -> u8 {
        self.interrupt_enable
    }

    /// Responses not yet delivered, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &Response> {
        self.pending.iter()
    }

    /// A command is in flight until its first response is delivered
    pub fn is_busy(&self) -> bool {
        self.pending.iter().any(|r| r.first)
    }

    /// Status register (0x1F801800)
    ///
    /// ```text
    /// Bit 0-1: Index
    /// Bit 2: ADPBUSY (always 0)
    /// Bit 3: Parameter FIFO empty
    /// Bit 4: Parameter FIFO not full
    /// Bit 5: Response FIFO not empty
    /// Bit 6: Data FIFO not empty
    /// Bit 7: Busy
    /// ```
    pub fn read_status(&self) -> u8 {
        let mut status = self.index & 0x3;
        if self.params.is_empty() {
            status |= 1 << 3;
        }
        if self.params.len() < FIFO_SIZE {
            status |= 1 << 4;
        }
        if !self.response.is_empty() {
            status |= 1 << 5;
        }
        if !self.data.is_empty() {
            status |= 1 << 6;
        }
        if self.is_busy() {
            status |= 1 << 7;
        }
        status
    }

    /// Push a parameter byte; writes beyond 16 bytes are dropped
    pub fn push_param(&mut self, value: u8) {
        if self.params.len() < FIFO_SIZE {
            self.params.push_back(value);
            log::trace!("CD-ROM: param 0x{:02X}", value);
        } else {
            log::warn!("CD-ROM: parameter FIFO overflow (0x{:02X} dropped)", value);
        }
    }

    /// Pop a response byte (0 when empty)
    pub fn pop_response(&mut self) -> u8 {
        self.response.pop_front().unwrap_or(0)
    }

    /// Pop a data byte (0 when empty)
    pub fn pop_data(&mut self) -> u8 {
        self.data.pop_front().unwrap_or(0)
    }

    /// Pop four data bytes, little-endian (DMA channel 3)
    pub fn pop_data_word(&mut self) -> u32 {
        u32::from_le_bytes(std::array::from_fn(|_| self.pop_data()))
    }

    /// Bytes left in the data FIFO
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Write the command register: drain parameters and dispatch
    pub fn write_command(&mut self, command: u8) {
        let params: Vec<u8> = self.params.drain(..).collect();
        if self.is_busy() {
            log::warn!("CD-ROM: command 0x{:02X} issued while busy", command);
        }
        log::debug!("CD-ROM: command 0x{:02X} params {:02X?}", command, params);
        self.execute_command(command, &params);
    }

    /// IE write: bits written as 1 are enabled
    pub fn write_interrupt_enable(&mut self, value: u8) {
        let prev = self.irq_level();
        self.interrupt_enable |= value & 0x1F;
        self.update_irq(prev);
    }

    /// IF write: bits written as 1 are acknowledged; bit 6 resets the
    /// parameter FIFO
    pub fn acknowledge(&mut self, value: u8) {
        self.interrupt_flag &= !(value & 0x1F);
        if value & 0x40 != 0 {
            self.params.clear();
        }
        log::trace!("CD-ROM: acknowledge 0x{:02X}", value);
    }

    /// Request register: BFRD (bit 7) loads the sector buffer into the data
    /// FIFO, clearing it resets the FIFO
    pub fn write_request(&mut self, value: u8) {
        if value & 0x80 == 0 {
            self.data.clear();
            return;
        }
        if !self.data.is_empty() {
            return;
        }
        let range = if self.mode.contains(Mode::WHOLE_SECTOR) {
            12..SECTOR_SIZE
        } else {
            24..24 + 2048
        };
        let payload = self.sector.get(range).unwrap_or_default();
        log::trace!("CD-ROM: BFRD loads {} bytes", payload.len());
        self.data.extend(payload.iter().copied());
    }

    /// Deliver the oldest due response
    ///
    /// Handler for `CdromResponse`. If IF still holds an unacknowledged
    /// class the delivery is retried a little later.
    pub fn deliver_response(&mut self, now: Clock) {
        let blocked = self.interrupt_flag & 0x07 != 0;
        let Some(front) = self.pending.front_mut() else {
            return;
        };

        if front.target > now {
            self.arm(now);
            return;
        }
        if blocked {
            front.target = now + RETRY_DELAY;
            self.arm(now);
            return;
        }

        if let Some(response) = self.pending.pop_front() {
            log::debug!(
                "CD-ROM: INT{} for 0x{:02X}: {:02X?}",
                response.class,
                response.command,
                response.bytes
            );

            if response.class == int::COMPLETE
                && matches!(
                    Command::from_byte(response.command),
                    Some(Command::SeekL | Command::SeekP)
                )
            {
                self.status.remove(DriveStatus::SEEKING);
            }

            self.response.clear();
            self.response
                .extend(response.bytes.iter().take(FIFO_SIZE).copied());

            let prev = self.irq_level();
            self.interrupt_flag = (self.interrupt_flag & !0x07) | response.class;
            self.update_irq(prev);
        }

        self.arm(now);
    }

    /// Read the next sector
    ///
    /// Handler for the periodic `CdromRead` event.
    pub fn read_tick(&mut self) {
        if !self.status.contains(DriveStatus::READING) {
            return;
        }

        let lba = self.position;
        let result = match self.disc.as_mut() {
            Some(disc) => disc.seek(lba).and_then(|()| disc.read_sector()),
            None => Err(CdRomError::NoDisc),
        };

        match result {
            Ok(sector) => {
                log::trace!("CD-ROM: read LBA {}", lba);
                self.sector = sector;
                self.position = lba + 1;

                // The CPU has not taken the previous sector yet
                if self.pending.iter().any(|r| r.class == int::DATA_READY) {
                    log::debug!("CD-ROM: sector {} overran the buffer", lba);
                    return;
                }
                let stat = self.stat();
                self.respond(Command::ReadN as u8, int::DATA_READY, vec![stat], 0, false);
            }
            Err(err) => {
                log::warn!("CD-ROM: {}", err);
                self.stop_reading();
                let stat = self.stat() | DriveStatus::ERROR.bits();
                self.respond(
                    Command::ReadN as u8,
                    int::ERROR,
                    vec![stat, commands::ERR_SEEK_FAILED],
                    0,
                    false,
                );
            }
        }
    }

    /// Clear every register and FIFO; the disc stays inserted
    pub fn reset(&mut self) {
        self.index = 0;
        self.params.clear();
        self.response.clear();
        self.data.clear();
        self.sector.clear();
        self.pending.clear();
        self.interrupt_enable = 0;
        self.interrupt_flag = 0;
        self.mode = Mode::empty();
        self.filter = (0, 0);
        self.seek_target = None;
        self.position = 0;
        self.muted = false;
        self.status = if self.disc.is_some() {
            DriveStatus::MOTOR_ON
        } else {
            DriveStatus::empty()
        };

        let mut scheduler = self.scheduler.borrow_mut();
        scheduler.unschedule_all_events_of_kind(EventKind::CdromResponse);
        scheduler.unschedule_all_events_of_kind(EventKind::CdromRead);
    }

    #[inline(always)]
    fn stat(&self) -> u8 {
        self.status.bits()
    }

    #[inline(always)]
    fn irq_level(&self) -> bool {
        self.interrupt_flag & self.interrupt_enable & 0x1F != 0
    }

    fn update_irq(&self, prev: bool) {
        self.interrupts
            .borrow_mut()
            .request_interrupt(interrupts::CDROM, prev, self.irq_level(), 0);
    }

    /// Queue a response `delay` cycles from now
    fn respond(&mut self, command: u8, class: u8, bytes: Vec<u8>, delay: Clock, first: bool) {
        let now = self.scheduler.borrow().now();
        self.pending.push_back(Response {
            class,
            bytes,
            command,
            target: now + delay,
            first,
        });
        self.arm(now);
    }

    /// Keep exactly one `CdromResponse` event, aimed at the oldest response
    fn arm(&self, now: Clock) {
        let mut scheduler = self.scheduler.borrow_mut();
        scheduler.unschedule_all_events_of_kind(EventKind::CdromResponse);
        if let Some(next) = self.pending.front() {
            scheduler.schedule_event(Event::once(
                EventKind::CdromResponse,
                now,
                next.target.max(now),
                next.command as u32,
            ));
        }
    }

    /// Sector period for the current speed
    fn read_interval(&self) -> Clock {
        if self.mode.contains(Mode::DOUBLE_SPEED) {
            self.sector_cycles / 2
        } else {
            self.sector_cycles
        }
    }

    fn start_reading(&mut self) {
        if let Some(target) = self.seek_target.take() {
            self.position = target;
        }
        self.status.remove(DriveStatus::SEEKING | DriveStatus::PLAYING);
        self.status.insert(DriveStatus::READING | DriveStatus::MOTOR_ON);
        log::debug!("CD-ROM: reading from LBA {}", self.position);
        self.rearm_reading();
    }

    /// Restart the read tick on the current speed, if reading
    fn rearm_reading(&mut self) {
        if !self.status.contains(DriveStatus::READING) {
            return;
        }
        let interval = self.read_interval();
        let mut scheduler = self.scheduler.borrow_mut();
        scheduler.unschedule_all_events_of_kind(EventKind::CdromRead);
        scheduler.schedule_periodic(EventKind::CdromRead, interval, 0);
        log::debug!("CD-ROM: read tick every {} cycles", interval);
    }

    fn stop_reading(&mut self) {
        self.status
            .remove(DriveStatus::READING | DriveStatus::PLAYING | DriveStatus::SEEKING);
        self.scheduler
            .borrow_mut()
            .unschedule_all_events_of_kind(EventKind::CdromRead);
    }
}

impl Device for CDROM {
    fn name(&self) -> &str {
        "CD-ROM"
    }

    fn ranges(&self, bus: BusName) -> Vec<BusRange> {
        match bus {
            CPU_BUS => region::mirrored(region::CDROM_START, 4, 0x3),
            // DMA channel 3 reads the data FIFO at +2
            DMA_BUS => vec![BusRange::new(region::CDROM_START, 4, 0x3)],
            _ => Vec::new(),
        }
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        if addr & 0x3 == 2 {
            return Ok(self.pop_data_word());
        }
        Ok(self.read8(addr)? as u32)
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.write8(addr, value as u8)
    }

    fn read16(&mut self, addr: u32) -> Result<u16> {
        if addr & 0x3 == 2 {
            let lo = self.pop_data() as u16;
            let hi = self.pop_data() as u16;
            return Ok(lo | (hi << 8));
        }
        Ok(self.read8(addr)? as u16)
    }

    fn write16(&mut self, addr: u32, value: u16) -> Result<()> {
        self.write8(addr, value as u8)
    }

    fn read8(&mut self, addr: u32) -> Result<u8> {
        Ok(match (addr & 0x3, self.index) {
            (0, _) => self.read_status(),
            (1, _) => self.pop_response(),
            (2, _) => self.pop_data(),
            (_, 0 | 2) => 0xE0 | self.interrupt_enable,
            _ => 0xE0 | self.interrupt_flag(),
        })
    }

    fn write8(&mut self, addr: u32, value: u8) -> Result<()> {
        match (addr & 0x3, self.index) {
            (0, _) => self.index = value & 0x3,
            (1, 0) => self.write_command(value),
            (2, 0) => self.push_param(value),
            (2, 1) => self.write_interrupt_enable(value),
            (3, 0) => self.write_request(value),
            (3, 1) => self.acknowledge(value),
            (reg, index) => {
                // Audio volume and sound map registers
                log::trace!(
                    "CD-ROM: ignored write {}.{} = 0x{:02X}",
                    reg,
                    index,
                    value
                );
            }
        }
        Ok(())
    }

    fn signal(&mut self, line: Line, level: bool) {
        if line == Line::Reset && level {
            self.reset();
        }
    }
}
