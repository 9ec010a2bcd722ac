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

//! Bus/device fabric
//!
//! A [`Bus`] routes a 32-bit address to exactly one attached [`Device`] and
//! forwards typed (8/16/32-bit) loads and stores. Devices are attached per
//! named bus: the CPU and the DMA engine each see their own bus, and main RAM
//! is attached to both.
//!
//! # Memory Map (CPU bus, physical)
//!
//! | Physical Address Range | Region       | Size   | Access |
//! |------------------------|--------------|--------|--------|
//! | 0x00000000-0x007FFFFF  | RAM (x4)     | 2MB    | R/W    |
//! | 0x1F000000-0x1F7FFFFF  | Expansion 1  | 8MB    | R      |
//! | 0x1F800000-0x1F8003FF  | Scratchpad   | 1KB    | R/W    |
//! | 0x1F801000-0x1F802FFF  | I/O Ports    | 8KB    | R/W    |
//! | 0x1FC00000-0x1FC7FFFF  | BIOS ROM     | 512KB  | R only |
//!
//! Mirrors in KUSEG, KSEG0 and KSEG1 are expressed as additional ranges,
//! see [`region::mirrored`].
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use psx_engine::core::memory::{Bus, Ram, CPU_BUS};
//!
//! let mut bus = Bus::new(CPU_BUS);
//! bus.attach(Rc::new(RefCell::new(Ram::main())));
//!
//! // Write to RAM via KSEG0
//! bus.write32(0x8000_0000, 0x1234_5678).unwrap();
//!
//! // Read from same location via different segment (should mirror)
//! assert_eq!(bus.read32(0x0000_0000).unwrap(), 0x1234_5678);
//! assert_eq!(bus.read32(0xA020_0000).unwrap(), 0x1234_5678);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::error::{EmulatorError, Result};

mod device;
mod ram;
pub mod region;
#[cfg(test)]
mod tests;

pub use device::{BusName, BusRange, Device, Line, CPU_BUS, DMA_BUS};
pub use ram::{OpenBus, Ram, RegisterFile, Rom};

/// Shared handle to a device
///
/// The top-level wiring owns every device; buses keep clones of the handle
/// purely for dispatch.
pub type DeviceRef = Rc<RefCell<dyn Device>>;

/// A device bound to one window of a bus
#[derive(Clone)]
struct Mapping {
    range: BusRange,
    device: DeviceRef,
}

/// A named address bus
///
/// Ranges are searched in registration order and the first match wins, so
/// catch-all devices must be attached last. Overlaps are a wiring concern
/// and are not diagnosed at runtime.
#[derive(Clone)]
pub struct Bus {
    name: BusName,
    mappings: Vec<Mapping>,
    devices: Vec<DeviceRef>,
}

impl Bus {
    /// Create an empty bus
    pub fn new(name: BusName) -> Self {
        Self {
            name,
            mappings: Vec::new(),
            devices: Vec::new(),
        }
    }

    /// Bus name
    pub fn name(&self) -> BusName {
        self.name
    }

    /// Attach a device at every range it declares for this bus
    ///
    /// Returns the number of ranges mapped. A device declaring no ranges
    /// still receives broadcast lines.
    pub fn attach(&mut self, device: DeviceRef) -> usize {
        let ranges = device.borrow().ranges(self.name);
        for range in &ranges {
            log::debug!(
                "Bus '{}': {} at 0x{:08X}-0x{:08X} (mask 0x{:08X})",
                self.name,
                device.borrow().name(),
                range.start,
                range.last(),
                range.mask
            );
            self.mappings.push(Mapping {
                range: *range,
                device: device.clone(),
            });
        }
        self.devices.push(device);
        ranges.len()
    }

    /// Map a device at an explicit range, ignoring what it declares
    pub fn map(&mut self, device: DeviceRef, range: BusRange) {
        if !self.devices.iter().any(|d| Rc::ptr_eq(d, &device)) {
            self.devices.push(device.clone());
        }
        self.mappings.push(Mapping { range, device });
    }

    /// Number of distinct devices attached
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Check whether any range covers `addr`
    pub fn is_mapped(&self, addr: u32) -> bool {
        self.mappings.iter().any(|m| m.range.contains(addr))
    }

    #[inline(always)]
    fn resolve(&self, addr: u32, width: u8) -> Result<(&DeviceRef, u32)> {
        self.mappings
            .iter()
            .find(|m| m.range.contains(addr))
            .map(|m| (&m.device, addr & m.range.mask))
            .ok_or(EmulatorError::UnmappedAddress {
                bus: self.name,
                address: addr,
                width,
            })
    }

    /// Load a byte
    pub fn read8(&self, addr: u32) -> Result<u8> {
        let (device, local) = self.resolve(addr, 8)?;
        device.borrow_mut().read8(local)
    }

    /// Load a halfword
    pub fn read16(&self, addr: u32) -> Result<u16> {
        let (device, local) = self.resolve(addr, 16)?;
        device.borrow_mut().read16(local)
    }

    /// Load a word
    pub fn read32(&self, addr: u32) -> Result<u32> {
        let (device, local) = self.resolve(addr, 32)?;
        device.borrow_mut().read32(local)
    }

    /// Store a byte
    pub fn write8(&self, addr: u32, value: u8) -> Result<()> {
        let (device, local) = self.resolve(addr, 8)?;
        device.borrow_mut().write8(local, value)
    }

    /// Store a halfword
    pub fn write16(&self, addr: u32, value: u16) -> Result<()> {
        let (device, local) = self.resolve(addr, 16)?;
        device.borrow_mut().write16(local, value)
    }

    /// Store a word
    pub fn write32(&self, addr: u32, value: u32) -> Result<()> {
        let (device, local) = self.resolve(addr, 32)?;
        log::trace!(
            "Bus '{}': write32 0x{:08X} = 0x{:08X}",
            self.name,
            addr,
            value
        );
        device.borrow_mut().write32(local, value)
    }

    /// Fan a control line out to every attached device
    pub fn broadcast(&self, line: Line, level: bool) {
        for device in &self.devices {
            device.borrow_mut().signal(line, level);
        }
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("name", &self.name)
            .field("mappings", &self.mappings.len())
            .field("devices", &self.devices.len())
            .finish()
    }
}
