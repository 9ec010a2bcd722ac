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

//! DMA (Direct Memory Access) Controller
//!
//! This module implements the PlayStation's DMA controller, which moves
//! words between main RAM and peripherals without CPU intervention.
//!
//! # DMA Channels
//!
//! | Channel | Device      | Registers    | Port (DMA bus) |
//! |---------|-------------|--------------|----------------|
//! | 0       | MDEC In     | 0x1F801080   | 0x1F801820     |
//! | 1       | MDEC Out    | 0x1F801090   | 0x1F801824     |
//! | 2       | GPU         | 0x1F8010A0   | 0x1F801810     |
//! | 3       | CD-ROM      | 0x1F8010B0   | 0x1F801802     |
//! | 4       | SPU         | 0x1F8010C0   | 0x1F801DA8     |
//! | 5       | PIO         | 0x1F8010D0   | 0x1F802000     |
//! | 6       | OTC         | 0x1F8010E0   | (none)         |
//!
//! Each channel has MADR (+0x0), BCR (+0x4) and CHCR (+0x8). DPCR
//! (0x1F8010F0) holds priorities and per-channel enables; DICR
//! (0x1F8010F4) holds the interrupt configuration and flags.
//!
//! # Execution
//!
//! A transfer runs synchronously inside the CHCR store that activates it.
//! RAM and the peripheral ports are reached through the `dma` bus; a port
//! with nothing attached is reported as [`EmulatorError::UnsupportedDma`].
//!
//! # References
//!
//! - [PSX-SPX: DMA Controller](http://problemkaputt.de/psx-spx.htm#dmacontroller)

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::error::{EmulatorError, Result};
use crate::core::interrupt::{interrupts, InterruptController};
use crate::core::memory::{region, Bus, BusName, BusRange, Device, Line, CPU_BUS};
use crate::core::scheduler::Clock;

mod channel;
#[cfg(test)]
mod tests;

pub use channel::{DMAChannel, Direction, Step, SyncMode, TransferStatus};

/// Linked-list header terminator bit
const END_OF_LIST: u32 = 0x0080_0000;

/// Ordering-table terminal entry
pub const OT_END: u32 = 0x00FF_FFFF;

/// RAM address mask for DMA (word aligned, 2MB)
const ADDR_MASK: u32 = 0x001F_FFFC;

/// Upper bound on linked-list nodes walked by one store
const MAX_LIST_NODES: u32 = 0x10_0000;

/// DMA controller
pub struct DMA {
    channels: [DMAChannel; 7],

    /// DPCR
    control: u32,

    /// DICR bits 0-5 (read/write, no function)
    dicr_low: u32,
    /// DICR bit 15: bus error / force IRQ
    force_irq: bool,
    /// DICR bits 16-22
    irq_enable: u8,
    /// DICR bit 23
    irq_master_enable: bool,
    /// DICR bits 24-30
    irq_flags: u8,

    /// Last computed master flag (DICR bit 31)
    master_flag: bool,

    /// Delay between completion and the DMA interrupt, per word moved
    irq_delay_per_word: Clock,

    last_transfer: Option<TransferStatus>,

    bus: Bus,
    interrupts: Rc<RefCell<InterruptController>>,
}

impl DMA {
    pub const CH_MDEC_IN: usize = 0;
    pub const CH_MDEC_OUT: usize = 1;
    pub const CH_GPU: usize = 2;
    pub const CH_CDROM: usize = 3;
    pub const CH_SPU: usize = 4;
    pub const CH_PIO: usize = 5;
    pub const CH_OTC: usize = 6;

    /// Peripheral port addresses on the DMA bus
    const PORTS: [Option<u32>; 7] = [
        Some(region::MDEC_DATA),
        Some(region::MDEC_DATA + 4),
        Some(region::GPU_GP0),
        Some(region::CDROM_START + 2),
        Some(region::SPU_FIFO),
        Some(0x1F80_2000),
        None,
    ];

    /// Create a DMA controller
    ///
    /// # Arguments
    ///
    /// * `bus` - The `dma` bus (main RAM plus peripheral ports)
    /// * `interrupts` - Interrupt controller for completion interrupts
    pub fn new(bus: Bus, interrupts: Rc<RefCell<InterruptController>>) -> Self {
        Self {
            channels: std::array::from_fn(DMAChannel::new),
            control: 0x0765_4321,
            dicr_low: 0,
            force_irq: false,
            irq_enable: 0,
            irq_master_enable: false,
            irq_flags: 0,
            master_flag: false,
            irq_delay_per_word: 0,
            last_transfer: None,
            bus,
            interrupts,
        }
    }

    /// Delay the completion interrupt by `cycles` per word moved
    ///
    /// Zero (the default) raises it in the same cycle.
    pub fn set_irq_delay_per_word(&mut self, cycles: Clock) {
        self.irq_delay_per_word = cycles;
    }

    /// Borrow a channel
    pub fn channel(&self, ch: usize) -> &DMAChannel {
        &self.channels[ch]
    }

    /// Status of the most recent transfer
    pub fn last_transfer(&self) -> Option<TransferStatus> {
        self.last_transfer
    }

    // Register access methods

    pub fn read_madr(&self, ch: usize) -> u32 {
        self.channels[ch].base_address
    }

    pub fn write_madr(&mut self, ch: usize, value: u32) {
        self.channels[ch].base_address = value & 0x00FF_FFFF;
        log::trace!("DMA{} MADR = 0x{:08X}", ch, value);
    }

    pub fn read_bcr(&self, ch: usize) -> u32 {
        self.channels[ch].block_control
    }

    pub fn write_bcr(&mut self, ch: usize, value: u32) {
        self.channels[ch].block_control = value;
        log::trace!("DMA{} BCR = 0x{:08X}", ch, value);
    }

    pub fn read_chcr(&self, ch: usize) -> u32 {
        self.channels[ch].channel_control
    }

    /// Store CHCR, starting the transfer if the channel became active
    ///
    /// # Errors
    ///
    /// `UnsupportedDma` if the channel's port or direction has no
    /// peripheral behind it; the channel is returned to idle first.
    pub fn write_chcr(&mut self, ch: usize, value: u32) -> Result<()> {
        let value = if ch == Self::CH_OTC {
            // OTC: only enable/trigger/pause are writable, always steps backwards
            (value & 0x5100_0000) | 0x2
        } else {
            value & 0x7177_0703
        };
        self.channels[ch].channel_control = value;
        log::trace!("DMA{} CHCR = 0x{:08X}", ch, value);

        if self.channels[ch].is_active() {
            if self.control & (0x8 << (ch * 4)) == 0 {
                log::trace!("DMA{} started with DPCR enable clear", ch);
            }
            self.run(ch)?;
        }
        Ok(())
    }

    pub fn read_control(&self) -> u32 {
        self.control
    }

    pub fn write_control(&mut self, value: u32) {
        self.control = value;
        log::trace!("DPCR = 0x{:08X}", value);
    }

    /// Read DICR
    pub fn read_interrupt(&self) -> u32 {
        self.dicr_low
            | ((self.force_irq as u32) << 15)
            | ((self.irq_enable as u32) << 16)
            | ((self.irq_master_enable as u32) << 23)
            | ((self.irq_flags as u32) << 24)
            | ((self.master_flag as u32) << 31)
    }

    /// Write DICR
    pub fn write_interrupt(&mut self, value: u32) {
        self.write_interrupt_masked(value, 0xFFFF_FFFF);
    }

    /// DICR store limited to the bytes in `mask`
    ///
    /// Flag bits (24-30) are cleared by writing 1; configuration bits are
    /// replaced.
    fn write_interrupt_masked(&mut self, value: u32, mask: u32) {
        let value = value & mask;
        let current = self.read_interrupt();
        let config = (current & !mask) | value;

        self.dicr_low = config & 0x3F;
        self.force_irq = config & (1 << 15) != 0;
        self.irq_enable = ((config >> 16) & 0x7F) as u8;
        self.irq_master_enable = config & (1 << 23) != 0;
        self.irq_flags &= !(((value >> 24) & 0x7F) as u8);

        log::trace!("DICR = 0x{:08X}", self.read_interrupt());
        self.update_master_flag(0);
    }

    /// Recompute bit 31 and request the DMA interrupt on a rising edge
    fn update_master_flag(&mut self, delay: Clock) {
        let prev = self.master_flag;
        self.master_flag = self.force_irq
            || (self.irq_master_enable && (self.irq_enable & self.irq_flags) != 0);

        self.interrupts
            .borrow_mut()
            .request_interrupt(interrupts::DMA, prev, self.master_flag, delay);
    }

    /// Run a transfer on `ch`
    fn run(&mut self, ch: usize) -> Result<()> {
        let channel = &self.channels[ch];
        log::debug!(
            "DMA{} transfer: madr=0x{:06X} bcr=0x{:08X} chcr=0x{:08X} mode={:?}",
            ch,
            channel.base_address,
            channel.block_control,
            channel.channel_control,
            channel.sync_mode()
        );

        let result = match channel.sync_mode() {
            SyncMode::Manual | SyncMode::Block => self.transfer_block(ch),
            SyncMode::LinkedList => self.transfer_linked_list(ch),
            SyncMode::Reserved => {
                log::warn!("DMA{} reserved sync mode, ignoring", ch);
                Ok(TransferStatus {
                    channel: ch,
                    complete: true,
                    ..Default::default()
                })
            }
        };

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                self.channels[ch].finish();
                return Err(e);
            }
        };

        self.last_transfer = Some(status);
        if status.complete {
            self.complete(ch, status.words);
        }
        Ok(())
    }

    /// Resolve the peripheral port for `ch` in `direction`
    fn port(&self, ch: usize, direction: Direction) -> Result<u32> {
        let unsupported = EmulatorError::UnsupportedDma {
            channel: ch,
            direction: direction.label(),
        };
        match Self::PORTS[ch] {
            Some(port) if self.bus.is_mapped(port) => Ok(port),
            _ => Err(unsupported),
        }
    }

    /// Block transfer (manual and blocks modes, including OTC)
    fn transfer_block(&mut self, ch: usize) -> Result<TransferStatus> {
        let channel = &self.channels[ch];
        let direction = channel.direction();
        let step = channel.step().offset();
        let total = channel.transfer_size().unwrap_or(0);
        let mut addr = channel.base_address & ADDR_MASK;

        let mut status = TransferStatus {
            channel: ch,
            address: addr,
            ..Default::default()
        };

        match (ch, direction) {
            (Self::CH_OTC, Direction::ToRam) => {
                for i in 0..total {
                    let word = if i == total - 1 {
                        OT_END
                    } else {
                        addr.wrapping_add(step) & 0x001F_FFFF
                    };
                    self.bus.write32(addr, word)?;
                    addr = addr.wrapping_add(step) & ADDR_MASK;
                    status.words += 1;
                }
            }
            (Self::CH_OTC, Direction::FromRam) => {
                return Err(EmulatorError::UnsupportedDma {
                    channel: ch,
                    direction: direction.label(),
                });
            }
            (_, Direction::ToRam) => {
                let port = self.port(ch, direction)?;
                for _ in 0..total {
                    let word = self.bus.read32(port)?;
                    self.bus.write32(addr, word)?;
                    addr = addr.wrapping_add(step) & ADDR_MASK;
                    status.words += 1;
                }
            }
            (_, Direction::FromRam) => {
                let port = self.port(ch, direction)?;
                for _ in 0..total {
                    let word = self.bus.read32(addr)?;
                    self.bus.write32(port, word)?;
                    addr = addr.wrapping_add(step) & ADDR_MASK;
                    status.words += 1;
                }
            }
        }

        if self.channels[ch].sync_mode() == SyncMode::Block {
            let channel = &mut self.channels[ch];
            channel.base_address = addr;
            channel.block_control &= 0xFFFF;
        }

        status.address = addr;
        status.complete = true;
        log::debug!("DMA{} block transfer complete ({} words)", ch, status.words);
        Ok(status)
    }

    /// Linked-list transfer (RAM → peripheral only)
    fn transfer_linked_list(&mut self, ch: usize) -> Result<TransferStatus> {
        let direction = self.channels[ch].direction();
        if direction != Direction::FromRam {
            return Err(EmulatorError::UnsupportedDma {
                channel: ch,
                direction: direction.label(),
            });
        }
        let port = self.port(ch, direction)?;

        let mut addr = self.channels[ch].base_address & ADDR_MASK;
        let mut status = TransferStatus {
            channel: ch,
            address: addr,
            ..Default::default()
        };

        while status.nodes < MAX_LIST_NODES {
            let header = self.bus.read32(addr)?;
            let count = header >> 24;

            for i in 1..=count {
                let word = self.bus.read32(addr.wrapping_add(i * 4) & ADDR_MASK)?;
                self.bus.write32(port, word)?;
                status.words += 1;
            }
            status.nodes += 1;

            if header & END_OF_LIST != 0 {
                status.complete = true;
                break;
            }
            addr = header & ADDR_MASK;
        }

        status.address = addr;
        if status.complete {
            self.channels[ch].base_address = OT_END;
            log::debug!(
                "DMA{} linked list complete ({} nodes, {} words)",
                ch,
                status.nodes,
                status.words
            );
        } else {
            log::warn!(
                "DMA{} linked list did not terminate after {} nodes; channel left busy",
                ch,
                status.nodes
            );
        }
        Ok(status)
    }

    /// Mark `ch` done and raise its DICR flag
    fn complete(&mut self, ch: usize, words: u32) {
        self.channels[ch].finish();

        if self.irq_enable & (1 << ch) != 0 {
            self.irq_flags |= 1 << ch;
        }
        self.update_master_flag(self.irq_delay_per_word * words as Clock);
    }

    /// Register store limited to the bytes in `mask`
    fn write_register(&mut self, offset: u32, value: u32, mask: u32) -> Result<()> {
        let ch = (offset >> 4) as usize;
        let merge = |old: u32| (old & !mask) | (value & mask);

        match (ch, offset & 0xC) {
            (7, 0x0) => self.write_control(merge(self.control)),
            (7, 0x4) => self.write_interrupt_masked(value, mask),
            (7, _) => log::warn!("DMA: write to unknown register 0x{:02X}", offset),
            (ch, 0x0) => self.write_madr(ch, merge(self.channels[ch].base_address)),
            (ch, 0x4) => self.write_bcr(ch, merge(self.channels[ch].block_control)),
            (ch, 0x8) => return self.write_chcr(ch, merge(self.channels[ch].channel_control)),
            (ch, _) => log::warn!("DMA{}: write to unused register 0x{:02X}", ch, offset),
        }
        Ok(())
    }

    /// Return every channel and register to power-on state
    pub fn reset(&mut self) {
        self.channels = std::array::from_fn(DMAChannel::new);
        self.control = 0x0765_4321;
        self.dicr_low = 0;
        self.force_irq = false;
        self.irq_enable = 0;
        self.irq_master_enable = false;
        self.irq_flags = 0;
        self.master_flag = false;
        self.last_transfer = None;
    }
}

impl Device for DMA {
    fn name(&self) -> &str {
        "DMA"
    }

    fn ranges(&self, bus: BusName) -> Vec<BusRange> {
        match bus {
            CPU_BUS => region::mirrored(region::DMA_START, 0x80, 0x7F),
            _ => Vec::new(),
        }
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        let ch = (addr >> 4) as usize;
        Ok(match (ch, addr & 0xC) {
            (7, 0x0) => self.read_control(),
            (7, 0x4) => self.read_interrupt(),
            (7, _) => 0,
            (ch, 0x0) => self.read_madr(ch),
            (ch, 0x4) => self.read_bcr(ch),
            (ch, 0x8) => self.read_chcr(ch),
            _ => 0,
        })
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.write_register(addr & 0x7C, value, 0xFFFF_FFFF)
    }

    fn write16(&mut self, addr: u32, value: u16) -> Result<()> {
        let shift = (addr & 0x2) * 8;
        self.write_register(addr & 0x7C, (value as u32) << shift, 0xFFFF << shift)
    }

    fn write8(&mut self, addr: u32, value: u8) -> Result<()> {
        let shift = (addr & 0x3) * 8;
        self.write_register(addr & 0x7C, (value as u32) << shift, 0xFF << shift)
    }

    fn signal(&mut self, line: Line, level: bool) {
        if line == Line::Reset && level {
            self.reset();
        }
    }
}
