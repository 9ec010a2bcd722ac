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

//! Display port
//!
//! The GP0/GP1 register pair at 0x1F801810/0x1F801814, without a
//! rasterizer behind it. GP0 words are queued for a renderer to drain with
//! [`VideoPort::take_commands`]; GP1 control words are applied to the few
//! status fields software polls and recorded. GPUSTAT always reports the
//! port as ready, so BIOS and game code waiting on it makes progress.
//!
//! | Offset | Read     | Write |
//! |--------|----------|-------|
//! | 0x0    | GPUREAD  | GP0   |
//! | 0x4    | GPUSTAT  | GP1   |
//!
//! The port is also the DMA channel 2 peripheral: it is attached to the
//! `dma` bus at GP0.

use crate::core::error::Result;
use crate::core::memory::{region, BusName, BusRange, Device, Line, CPU_BUS, DMA_BUS};

#[cfg(test)]
mod tests;

/// GPUSTAT bits
pub mod status {
    pub const DISPLAY_MODE_SHIFT: u32 = 17;
    pub const HORIZONTAL_368: u32 = 1 << 16;
    pub const DISPLAY_DISABLED: u32 = 1 << 23;
    pub const IRQ: u32 = 1 << 24;
    pub const DMA_REQUEST: u32 = 1 << 25;
    pub const READY_CMD: u32 = 1 << 26;
    pub const READY_VRAM_TO_CPU: u32 = 1 << 27;
    pub const READY_DMA: u32 = 1 << 28;
    pub const DMA_DIRECTION_SHIFT: u32 = 29;
    pub const ODD_LINE: u32 = 1 << 31;
}

/// GPU version reported through GP1(0x10) info 7
const GPU_VERSION: u32 = 2;

/// Display port device
pub struct VideoPort {
    /// GP0 words not yet taken by a renderer
    commands: Vec<u32>,

    /// Every GP1 word, in order
    control_log: Vec<u32>,

    /// Latched GPUREAD value
    gpuread: u32,

    display_disabled: bool,
    interrupt_request: bool,
    dma_direction: u8,

    /// GP1(0x08) bits 0-6
    display_mode: u32,

    /// GP1(0x05)-(0x07) raw words
    display_area: [u32; 3],

    odd_line: bool,
    frames: u64,
}

impl VideoPort {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            control_log: Vec::new(),
            gpuread: 0,
            display_disabled: true,
            interrupt_request: false,
            dma_direction: 0,
            display_mode: 0,
            display_area: [0; 3],
            odd_line: false,
            frames: 0,
        }
    }

    /// Queue a GP0 word
    pub fn write_gp0(&mut self, value: u32) {
        log::trace!("GP0 0x{:08X}", value);
        self.commands.push(value);
    }

    /// Drain the queued GP0 words
    pub fn take_commands(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.commands)
    }

    /// Number of GP0 words waiting
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// GP1 words received since the last reset
    pub fn control_log(&self) -> &[u32] {
        &self.control_log
    }

    /// Apply a GP1 control word
    pub fn write_gp1(&mut self, value: u32) {
        self.control_log.push(value);
        let command = value >> 24;

        match command {
            0x00 => {
                self.reset_state();
                log::debug!("GP1: reset");
            }
            0x01 => {
                self.commands.clear();
                log::debug!("GP1: reset command buffer");
            }
            0x02 => self.interrupt_request = false,
            0x03 => self.display_disabled = value & 1 != 0,
            0x04 => self.dma_direction = (value & 0x3) as u8,
            0x05..=0x07 => self.display_area[(command - 0x05) as usize] = value & 0x00FF_FFFF,
            0x08 => self.display_mode = value & 0x7F,
            0x10..=0x1F => {
                self.gpuread = match value & 0x7 {
                    0x7 => GPU_VERSION,
                    _ => 0,
                };
            }
            _ => log::warn!("GP1: unknown command 0x{:02X}", command),
        }
    }

    /// GPUSTAT
    pub fn status(&self) -> u32 {
        let mut stat = status::READY_CMD | status::READY_VRAM_TO_CPU | status::READY_DMA;

        // Horizontal resolution 1, vertical resolution, video mode, color depth, interlace
        stat |= (self.display_mode & 0x3F) << status::DISPLAY_MODE_SHIFT;
        if self.display_mode & 0x40 != 0 {
            stat |= status::HORIZONTAL_368;
        }
        if self.display_disabled {
            stat |= status::DISPLAY_DISABLED;
        }
        if self.interrupt_request {
            stat |= status::IRQ;
        }
        stat |= (self.dma_direction as u32) << status::DMA_DIRECTION_SHIFT;

        let dma_request = match self.dma_direction {
            0 => false,
            1 => true,
            2 => stat & status::READY_DMA != 0,
            _ => stat & status::READY_VRAM_TO_CPU != 0,
        };
        if dma_request {
            stat |= status::DMA_REQUEST;
        }
        if self.odd_line {
            stat |= status::ODD_LINE;
        }
        stat
    }

    /// GPUREAD
    pub fn read_gpuread(&self) -> u32 {
        self.gpuread
    }

    /// Display area words from GP1(0x05), (0x06), (0x07)
    pub fn display_area(&self) -> [u32; 3] {
        self.display_area
    }

    pub fn display_enabled(&self) -> bool {
        !self.display_disabled
    }

    /// Frame boundary, called from the vertical blank event
    pub fn vblank(&mut self) {
        self.frames += 1;
        self.odd_line = !self.odd_line;
    }

    /// Vertical blanks seen since power-on
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    fn reset_state(&mut self) {
        self.commands.clear();
        self.gpuread = 0;
        self.display_disabled = true;
        self.interrupt_request = false;
        self.dma_direction = 0;
        self.display_mode = 0;
        self.display_area = [0; 3];
    }

    /// Power-on state, including the frame counter and GP1 record
    pub fn reset(&mut self) {
        self.reset_state();
        self.control_log.clear();
        self.odd_line = false;
        self.frames = 0;
    }
}

impl Default for VideoPort {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for VideoPort {
    fn name(&self) -> &str {
        "GPU"
    }

    fn ranges(&self, bus: BusName) -> Vec<BusRange> {
        match bus {
            CPU_BUS => region::mirrored(region::GPU_GP0, 8, 0x7),
            DMA_BUS => vec![BusRange::new(region::GPU_GP0, 4, 0x7)],
            _ => Vec::new(),
        }
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        Ok(match addr & 0x4 {
            0 => self.read_gpuread(),
            _ => self.status(),
        })
    }

    fn write32(&mut self, addr: u32, value: u32) -> Result<()> {
        match addr & 0x4 {
            0 => self.write_gp0(value),
            _ => self.write_gp1(value),
        }
        Ok(())
    }

    fn signal(&mut self, line: Line, level: bool) {
        if line == Line::Reset && level {
            self.reset();
        }
    }
}
