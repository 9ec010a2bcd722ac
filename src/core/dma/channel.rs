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

//! DMA channel state and control-word decoding
//!
//! # CHCR layout
//!
//! ```text
//! Bit   | Field
//! ------|-----------------------------------------------
//! 0     | Direction (0 = to main RAM, 1 = from main RAM)
//! 1     | Step (0 = +4, 1 = -4)
//! 8     | Chopping enable
//! 9-10  | Sync mode (0 manual, 1 blocks, 2 linked list, 3 reserved)
//! 16-18 | Chopping DMA window (1 << n words)
//! 20-22 | Chopping CPU window (1 << n cycles)
//! 24    | Enable / busy
//! 28    | Trigger (manual mode start)
//! 30    | Pause (unused here)
//! ```

/// Transfer direction relative to main RAM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Peripheral → RAM
    ToRam,
    /// RAM → peripheral
    FromRam,
}

impl Direction {
    /// Short label for logs and errors
    pub fn label(self) -> &'static str {
        match self {
            Direction::ToRam => "to RAM",
            Direction::FromRam => "from RAM",
        }
    }
}

/// Address step per word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// +4
    Increment,
    /// -4
    Decrement,
}

impl Step {
    /// Signed byte offset per word
    pub fn offset(self) -> u32 {
        match self {
            Step::Increment => 4,
            Step::Decrement => (-4i32) as u32,
        }
    }
}

/// Synchronization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Single burst of `block_size` words, started by the trigger bit
    Manual,
    /// `block_count` bursts of `block_size` words
    Block,
    /// Pointer-chased packets
    LinkedList,
    /// Undefined
    Reserved,
}

/// Bookkeeping for the transfer currently (or most recently) run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStatus {
    /// Channel number
    pub channel: usize,
    /// Next RAM address
    pub address: u32,
    /// Words moved so far
    pub words: u32,
    /// Linked-list nodes visited
    pub nodes: u32,
    /// Whether the transfer reached its end condition
    pub complete: bool,
}

/// One DMA channel
#[derive(Debug, Clone)]
pub struct DMAChannel {
    /// MADR: base address (24 bits)
    pub(super) base_address: u32,

    /// BCR: block size (low 16) and block count (high 16)
    pub(super) block_control: u32,

    /// CHCR: channel control
    pub(super) channel_control: u32,

    id: usize,
}

impl DMAChannel {
    const ENABLE: u32 = 1 << 24;
    const TRIGGER: u32 = 1 << 28;

    pub(super) fn new(id: usize) -> Self {
        Self {
            base_address: 0,
            block_control: 0,
            channel_control: 0,
            id,
        }
    }

    /// Channel number
    pub fn id(&self) -> usize {
        self.id
    }

    /// MADR
    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    /// BCR
    pub fn block_control(&self) -> u32 {
        self.block_control
    }

    /// CHCR
    pub fn channel_control(&self) -> u32 {
        self.channel_control
    }

    #[inline(always)]
    pub fn direction(&self) -> Direction {
        if self.channel_control & 1 != 0 {
            Direction::FromRam
        } else {
            Direction::ToRam
        }
    }

    #[inline(always)]
    pub fn step(&self) -> Step {
        if self.channel_control & 2 != 0 {
            Step::Decrement
        } else {
            Step::Increment
        }
    }

    #[inline(always)]
    pub fn chopping(&self) -> bool {
        self.channel_control & (1 << 8) != 0
    }

    #[inline(always)]
    pub fn sync_mode(&self) -> SyncMode {
        match (self.channel_control >> 9) & 3 {
            0 => SyncMode::Manual,
            1 => SyncMode::Block,
            2 => SyncMode::LinkedList,
            _ => SyncMode::Reserved,
        }
    }

    /// Chopping DMA window in words
    pub fn chop_dma_words(&self) -> u32 {
        1 << ((self.channel_control >> 16) & 7)
    }

    /// Chopping CPU window in cycles
    pub fn chop_cpu_cycles(&self) -> u32 {
        1 << ((self.channel_control >> 20) & 7)
    }

    #[inline(always)]
    pub fn enabled(&self) -> bool {
        self.channel_control & Self::ENABLE != 0
    }

    #[inline(always)]
    pub fn trigger(&self) -> bool {
        self.channel_control & Self::TRIGGER != 0
    }

    /// Block size in words (0 means 0x10000 in manual mode)
    pub fn block_size(&self) -> u32 {
        self.block_control & 0xFFFF
    }

    /// Number of blocks
    pub fn block_count(&self) -> u32 {
        self.block_control >> 16
    }

    /// Whether a store to CHCR should start a transfer now
    ///
    /// Enabled, and in manual mode also triggered.
    pub fn is_active(&self) -> bool {
        match self.sync_mode() {
            SyncMode::Manual => self.enabled() && self.trigger(),
            _ => self.enabled(),
        }
    }

    /// Total words for a block-shaped transfer, `None` for linked lists
    pub fn transfer_size(&self) -> Option<u32> {
        match self.sync_mode() {
            SyncMode::Manual => Some(match self.block_size() {
                0 => 0x1_0000,
                n => n,
            }),
            SyncMode::Block => Some(self.block_size() * self.block_count()),
            SyncMode::LinkedList | SyncMode::Reserved => None,
        }
    }

    /// Return to idle: clear enable and trigger
    pub(super) fn finish(&mut self) {
        log::trace!("DMA channel {} done", self.id);
        self.channel_control &= !(Self::ENABLE | Self::TRIGGER);
    }
}
