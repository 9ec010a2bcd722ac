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

//! Memory devices: RAM, ROM, opaque register files and open bus

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::region::{self, BIOS_SIZE, RAM_SIZE, SCRATCHPAD_SIZE};
use super::{BusName, BusRange, Device, Line, CPU_BUS, DMA_BUS};
use crate::core::error::{EmulatorError, Result};

/// Byte-addressable read/write memory
///
/// Used for main RAM (attached to both the CPU and DMA buses) and the
/// scratchpad (CPU bus only).
pub struct Ram {
    name: &'static str,
    data: Vec<u8>,
    cpu_ranges: Vec<BusRange>,
    dma_ranges: Vec<BusRange>,
}

impl Ram {
    /// Main RAM, 2MB mirrored through the first 8MB of every segment
    pub fn main() -> Self {
        let mask = (RAM_SIZE - 1) as u32;
        Self {
            name: "RAM",
            data: vec![0; RAM_SIZE],
            cpu_ranges: region::mirrored(region::RAM_START, region::RAM_WINDOW, mask),
            dma_ranges: vec![BusRange::new(0, region::RAM_WINDOW, mask)],
        }
    }

    /// 1KB scratchpad (not reachable from KSEG1 or by DMA)
    pub fn scratchpad() -> Self {
        let mask = (SCRATCHPAD_SIZE - 1) as u32;
        let length = SCRATCHPAD_SIZE as u32;
        Self {
            name: "Scratchpad",
            data: vec![0; SCRATCHPAD_SIZE],
            cpu_ranges: vec![
                BusRange::new(region::SCRATCHPAD_START, length, mask),
                BusRange::new(0x8000_0000 | region::SCRATCHPAD_START, length, mask),
            ],
            dma_ranges: Vec::new(),
        }
    }

    /// Raw contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copy bytes into memory at a device-local offset
    pub fn load(&mut self, offset: usize, bytes: &[u8]) {
        let end = (offset + bytes.len()).min(self.data.len());
        if offset < end {
            self.data[offset..end].copy_from_slice(&bytes[..end - offset]);
        }
    }

    #[inline(always)]
    fn index(&self, addr: u32) -> usize {
        addr as usize & (self.data.len() - 1)
    }
}

impl Device for Ram {
    fn name(&self) -> &str {
        self.name
    }

    fn ranges(&self, bus: BusName) -> Vec<BusRange> {
        match bus {
            CPU_BUS => self.cpu_ranges.clone(),
            DMA_BUS => self.dma_ranges.clone(),
            _ => Vec::new(),
        }
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        let i = self.index(addr & !0x3);
        Ok(u32::from_le_bytes([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]))
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        let i = self.index(addr & !0x3);
        self.data[i..i + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn read16(&mut self, addr: u32) -> Result<u16> {
        let i = self.index(addr & !0x1);
        Ok(u16::from_le_bytes([self.data[i], self.data[i + 1]]))
    }

    fn write16(&mut self, addr: u32, value: u16) -> Result<()> {
        let i = self.index(addr & !0x1);
        self.data[i..i + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn read8(&mut self, addr: u32) -> Result<u8> {
        Ok(self.data[self.index(addr)])
    }

    fn write8(&mut self, addr: u32, value: u8) -> Result<()> {
        let i = self.index(addr);
        self.data[i] = value;
        Ok(())
    }
}

/// BIOS ROM
///
/// Stores are ignored with a warning.
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    /// Create a zero-filled 512KB ROM
    pub fn new() -> Self {
        Self {
            data: vec![0; BIOS_SIZE],
        }
    }

    /// Create a ROM from an image, which must be exactly 512KB
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() != BIOS_SIZE {
            return Err(EmulatorError::InvalidBiosSize {
                expected: BIOS_SIZE,
                got: data.len(),
            });
        }
        Ok(Self { data })
    }

    /// Load a BIOS image from disk
    ///
    /// # Errors
    ///
    /// - `BiosNotFound` if the file cannot be opened
    /// - `InvalidBiosSize` if it is not 512KB
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|_| EmulatorError::BiosNotFound(path.display().to_string()))?;

        let mut data = Vec::with_capacity(BIOS_SIZE);
        file.read_to_end(&mut data)?;

        let rom = Self::from_bytes(data)?;
        log::info!("BIOS loaded from {}", path.display());
        Ok(rom)
    }

    /// Replace the ROM contents with a validated image
    pub fn replace(&mut self, other: Rom) {
        self.data = other.data;
    }

    /// Patch ROM contents directly (test programs, HLE hooks)
    pub fn patch(&mut self, offset: usize, bytes: &[u8]) {
        let end = (offset + bytes.len()).min(self.data.len());
        if offset < end {
            self.data[offset..end].copy_from_slice(&bytes[..end - offset]);
        }
    }
}

impl Default for Rom {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for Rom {
    fn name(&self) -> &str {
        "BIOS"
    }

    fn ranges(&self, bus: BusName) -> Vec<BusRange> {
        match bus {
            CPU_BUS => region::mirrored(region::BIOS_START, BIOS_SIZE as u32, (BIOS_SIZE - 1) as u32),
            _ => Vec::new(),
        }
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        let i = (addr & !0x3) as usize;
        Ok(u32::from_le_bytes([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]))
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        log::warn!("Ignoring write to BIOS ROM: 0x{:05X} = 0x{:08X}", addr, value);
        Ok(())
    }

    fn read8(&mut self, addr: u32) -> Result<u8> {
        Ok(self.data[addr as usize])
    }

    fn write16(&mut self, addr: u32, value: u16) -> Result<()> {
        log::warn!("Ignoring write to BIOS ROM: 0x{:05X} = 0x{:04X}", addr, value);
        Ok(())
    }

    fn write8(&mut self, addr: u32, value: u8) -> Result<()> {
        log::warn!("Ignoring write to BIOS ROM: 0x{:05X} = 0x{:02X}", addr, value);
        Ok(())
    }
}

/// Opaque little-endian register storage
///
/// Memory control, RAM_SIZE and cache control are plain storage as far as
/// this core is concerned. The value sticks; nothing else happens.
pub struct RegisterFile {
    name: &'static str,
    ranges: Vec<BusRange>,
    words: Vec<u32>,
}

impl RegisterFile {
    /// Create a register file covering `ranges` with `words` 32-bit slots
    pub fn new(name: &'static str, ranges: Vec<BusRange>, words: usize) -> Self {
        Self {
            name,
            ranges,
            words: vec![0; words],
        }
    }

    fn slot(&self, addr: u32) -> usize {
        (addr as usize >> 2) % self.words.len().max(1)
    }
}

impl Device for RegisterFile {
    fn name(&self) -> &str {
        self.name
    }

    fn ranges(&self, bus: BusName) -> Vec<BusRange> {
        match bus {
            CPU_BUS => self.ranges.clone(),
            _ => Vec::new(),
        }
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        Ok(self.words.get(self.slot(addr)).copied().unwrap_or(0))
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        log::trace!("{}: [0x{:03X}] = 0x{:08X}", self.name, addr, value);
        let slot = self.slot(addr);
        if let Some(word) = self.words.get_mut(slot) {
            *word = value;
        }
        Ok(())
    }

    fn signal(&mut self, line: Line, level: bool) {
        if line == Line::Reset && level {
            self.words.iter_mut().for_each(|w| *w = 0);
        }
    }
}

/// Catch-all for unconnected windows
///
/// Loads return a fixed fill value; stores are logged and dropped. Attach
/// it after every real device so it only sees what nothing else claimed.
pub struct OpenBus {
    name: &'static str,
    ranges: Vec<BusRange>,
    fill: u32,
}

impl OpenBus {
    /// Create an open-bus window
    pub fn new(name: &'static str, ranges: Vec<BusRange>, fill: u32) -> Self {
        Self { name, ranges, fill }
    }

    /// Expansion region 1 (no cartridge: all ones)
    pub fn expansion1() -> Self {
        Self::new(
            "Expansion 1",
            region::mirrored(region::EXP1_START, region::EXP1_SIZE, region::PHYSICAL_MASK),
            0xFFFF_FFFF,
        )
    }

    /// Remaining I/O ports with no emulated peripheral
    pub fn io_ports() -> Self {
        Self::new(
            "I/O",
            region::mirrored(region::IO_START, region::IO_SIZE, region::PHYSICAL_MASK),
            0,
        )
    }
}

impl Device for OpenBus {
    fn name(&self) -> &str {
        self.name
    }

    fn ranges(&self, bus: BusName) -> Vec<BusRange> {
        match bus {
            CPU_BUS => self.ranges.clone(),
            _ => Vec::new(),
        }
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        log::trace!("{}: unhandled read at 0x{:08X}", self.name, addr);
        Ok(self.fill)
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        log::warn!(
            "{}: unmapped I/O write 0x{:08X} = 0x{:08X}",
            self.name,
            addr,
            value
        );
        Ok(())
    }

    fn write16(&mut self, addr: u32, value: u16) -> Result<()> {
        self.write32(addr, value as u32)
    }

    fn write8(&mut self, addr: u32, value: u8) -> Result<()> {
        self.write32(addr, value as u32)
    }
}
