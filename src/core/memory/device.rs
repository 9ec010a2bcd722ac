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

//! Device trait for bus-attached peripherals
//!
//! Every component reachable through a [`Bus`](super::Bus) implements
//! [`Device`]. A device declares the ranges it occupies on each named bus,
//! and the bus forwards typed loads and stores to it.
//!
//! # Address Folding
//!
//! The bus hands the device `address & range.mask`, never the raw address:
//!
//! - Range: `start = 0x8000_0000, length = 0x80_0000, mask = 0x1F_FFFF`
//! - Access: `0x8020_0010`
//! - Device sees: `0x0000_0010` (the 2MB RAM is mirrored four times)
//!
//! # Example
//!
//! ```
//! use psx_engine::core::error::Result;
//! use psx_engine::core::memory::{BusName, BusRange, Device, CPU_BUS};
//!
//! struct Latch {
//!     value: u32,
//! }
//!
//! impl Device for Latch {
//!     fn name(&self) -> &str {
//!         "latch"
//!     }
//!
//!     fn ranges(&self, bus: BusName) -> Vec<BusRange> {
//!         if bus == CPU_BUS {
//!             vec![BusRange::new(0x1F80_2000, 4, 0x3)]
//!         } else {
//!             Vec::new()
//!         }
//!     }
//!
//!     fn read32(&mut self, _addr: u32) -> Result<u32> {
//!         Ok(self.value)
//!     }
//!
//!     fn write32(&mut self, _addr: u32, value: u32) -> Result<()> {
//!         self.value = value;
//!         Ok(())
//!     }
//! }
//! ```

use crate::core::error::Result;

/// Name of a bus a device can be attached to
pub type BusName = &'static str;

/// Bus used by the CPU for instruction fetch and data access
pub const CPU_BUS: BusName = "cpu";

/// Bus used by the DMA engine to reach main RAM and peripheral ports
pub const DMA_BUS: BusName = "dma";

/// Address window binding a device to a bus
///
/// `mask` is applied to the incoming address before the device sees it,
/// which lets a range alias a smaller physical window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusRange {
    /// First address of the window
    pub start: u32,
    /// Window size in bytes
    pub length: u32,
    /// Mask applied to addresses routed to the device
    pub mask: u32,
}

impl BusRange {
    /// Create a new range
    pub const fn new(start: u32, length: u32, mask: u32) -> Self {
        Self {
            start,
            length,
            mask,
        }
    }

    /// Check whether `addr` falls inside `[start, start + length)`
    ///
    /// Written with a wrapping subtraction so windows ending at the top of
    /// the address space work.
    #[inline(always)]
    pub const fn contains(&self, addr: u32) -> bool {
        addr.wrapping_sub(self.start) < self.length
    }

    /// Inclusive last address of the window
    pub const fn last(&self) -> u32 {
        self.start.wrapping_add(self.length).wrapping_sub(1)
    }
}

/// Control lines fanned out to every device on a bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    /// Hardware reset
    Reset,
}

/// Trait for bus-attached devices
///
/// Devices must implement the 32-bit accessors. The 8- and 16-bit defaults
/// go through the containing aligned word (read-modify-write on store);
/// devices whose registers are narrower than a word, or whose reads have
/// side effects (FIFO pops), override them.
///
/// Byte order is little-endian throughout.
pub trait Device {
    /// Human-readable name used in logs
    fn name(&self) -> &str;

    /// Ranges this device occupies on `bus`
    ///
    /// An empty vector means the device is not attached to that bus.
    fn ranges(&self, bus: BusName) -> Vec<BusRange>;

    /// Load a word
    fn read32(&mut self, addr: u32) -> Result<u32>;

    /// Store a word
    fn write32(&mut self, addr: u32, value: u32) -> Result<()>;

    /// Load a halfword
    fn read16(&mut self, addr: u32) -> Result<u16> {
        let value = self.read32(addr & !0x3)?;
        let shift = (addr & 0x2) * 8;
        Ok((value >> shift) as u16)
    }

    /// Store a halfword
    fn write16(&mut self, addr: u32, value: u16) -> Result<()> {
        let aligned = addr & !0x3;
        let shift = (addr & 0x2) * 8;
        let current = self.read32(aligned)?;
        let merged = (current & !(0xFFFF << shift)) | ((value as u32) << shift);
        self.write32(aligned, merged)
    }

    /// Load a byte
    fn read8(&mut self, addr: u32) -> Result<u8> {
        let value = self.read32(addr & !0x3)?;
        let shift = (addr & 0x3) * 8;
        Ok((value >> shift) as u8)
    }

    /// Store a byte
    fn write8(&mut self, addr: u32, value: u8) -> Result<()> {
        let aligned = addr & !0x3;
        let shift = (addr & 0x3) * 8;
        let current = self.read32(aligned)?;
        let merged = (current & !(0xFF << shift)) | ((value as u32) << shift);
        self.write32(aligned, merged)
    }

    /// Receive a broadcast control line
    fn signal(&mut self, _line: Line, _level: bool) {}
}
