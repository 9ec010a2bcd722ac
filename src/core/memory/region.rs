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

//! Physical memory map and segment mirroring
//!
//! The R3000 has no MMU on this machine. KUSEG (0x00000000), KSEG0
//! (0x80000000) and KSEG1 (0xA0000000) all alias the same 512MB physical
//! space, so a device is attached once per segment with identical masks.

use super::BusRange;

/// Main RAM physical base
pub const RAM_START: u32 = 0x0000_0000;
/// Main RAM size (2MB)
pub const RAM_SIZE: usize = 2 * 1024 * 1024;
/// RAM window size (2MB mirrored four times)
pub const RAM_WINDOW: u32 = 0x0080_0000;

/// Expansion region 1 base
pub const EXP1_START: u32 = 0x1F00_0000;
/// Expansion region 1 size
pub const EXP1_SIZE: u32 = 0x0080_0000;

/// Scratchpad physical base
pub const SCRATCHPAD_START: u32 = 0x1F80_0000;
/// Scratchpad size (1KB)
pub const SCRATCHPAD_SIZE: usize = 1024;

/// I/O port window base
pub const IO_START: u32 = 0x1F80_1000;
/// I/O port window size (including expansion region 2)
pub const IO_SIZE: u32 = 0x2000;

/// Memory control 1 registers (0x1F801000-0x1F801023)
pub const MEM_CONTROL: u32 = 0x1F80_1000;
/// RAM_SIZE register
pub const RAM_SIZE_REG: u32 = 0x1F80_1060;
/// Interrupt controller (I_STAT/I_MASK)
pub const IRQ_CONTROL: u32 = 0x1F80_1070;
/// DMA registers
pub const DMA_START: u32 = 0x1F80_1080;
/// CD-ROM registers
pub const CDROM_START: u32 = 0x1F80_1800;
/// GPU GP0/GPUREAD port
pub const GPU_GP0: u32 = 0x1F80_1810;
/// GPU GP1/GPUSTAT port
pub const GPU_GP1: u32 = 0x1F80_1814;
/// MDEC command/data port
pub const MDEC_DATA: u32 = 0x1F80_1820;
/// SPU data transfer FIFO
pub const SPU_FIFO: u32 = 0x1F80_1DA8;

/// BIOS ROM physical base
pub const BIOS_START: u32 = 0x1FC0_0000;
/// BIOS ROM size (512KB)
pub const BIOS_SIZE: usize = 512 * 1024;

/// Cache control register (KSEG2 only)
pub const CACHE_CONTROL: u32 = 0xFFFE_0130;

/// Segment base addresses
pub const SEGMENTS: [u32; 3] = [0x0000_0000, 0x8000_0000, 0xA000_0000];

/// Mask to fold a virtual address into the physical space
pub const PHYSICAL_MASK: u32 = 0x1FFF_FFFF;

/// Build one range per segment for a physical window
///
/// # Arguments
///
/// * `physical` - Physical start address
/// * `length` - Window length in bytes
/// * `mask` - Mask applied to the access address
///
/// # Example
///
/// ```
/// use psx_engine::core::memory::region;
///
/// let ranges = region::mirrored(region::BIOS_START, 0x8_0000, 0x7_FFFF);
/// assert_eq!(ranges[2].start, 0xBFC0_0000);
/// ```
pub fn mirrored(physical: u32, length: u32, mask: u32) -> Vec<BusRange> {
    SEGMENTS
        .iter()
        .map(|segment| BusRange::new(segment | physical, length, mask))
        .collect()
}

/// Translate a virtual address to physical
///
/// KSEG2 addresses pass through unchanged.
#[inline(always)]
pub fn physical(vaddr: u32) -> u32 {
    if vaddr >= 0xC000_0000 {
        vaddr
    } else {
        vaddr & PHYSICAL_MASK
    }
}
