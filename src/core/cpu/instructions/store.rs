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

use super::super::decode::Instruction;
use super::super::{ExceptionCause, CPU};
use crate::core::error::Result;
use crate::core::memory::Bus;

impl CPU {
    // === Store Instructions ===

    /// Stores are dropped while SR.IsC isolates the cache
    #[inline(always)]
    fn store_isolated(&self, addr: u32) -> bool {
        if self.cop0.cache_isolated() {
            log::trace!("CPU: store to 0x{:08X} ignored (cache isolated)", addr);
            return true;
        }
        false
    }

    /// SW: Store Word
    ///
    /// Format: sw rt, offset(rs)
    /// Operation: memory[rs + sign_extend(offset)] = rt
    ///
    /// # Returns
    ///
    /// Ok(()) on success or after raising AddressErrorStore on misalignment
    pub(in crate::core::cpu) fn op_sw(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        if addr & 0x3 != 0 {
            self.address_error(ExceptionCause::AddressErrorStore, addr);
            return Ok(());
        }
        if self.store_isolated(addr) {
            return Ok(());
        }
        bus.write32(addr, self.reg(instr.rt()))
    }

    /// SH: Store Halfword
    pub(in crate::core::cpu) fn op_sh(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        if addr & 0x1 != 0 {
            self.address_error(ExceptionCause::AddressErrorStore, addr);
            return Ok(());
        }
        if self.store_isolated(addr) {
            return Ok(());
        }
        bus.write16(addr, self.reg(instr.rt()) as u16)
    }

    /// SB: Store Byte
    pub(in crate::core::cpu) fn op_sb(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        if self.store_isolated(addr) {
            return Ok(());
        }
        bus.write8(addr, self.reg(instr.rt()) as u8)
    }

    /// SWL: Store Word Left
    ///
    /// Writes the high-order bytes of rt to the bytes at and below `addr`
    /// within its aligned word.
    pub(in crate::core::cpu) fn op_swl(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        if self.store_isolated(addr) {
            return Ok(());
        }
        let aligned = addr & !0x3;
        let memory = bus.read32(aligned)?;
        let value = self.reg(instr.rt());

        let merged = match addr & 0x3 {
            0 => (memory & 0xFFFF_FF00) | (value >> 24),
            1 => (memory & 0xFFFF_0000) | (value >> 16),
            2 => (memory & 0xFF00_0000) | (value >> 8),
            _ => value,
        };
        bus.write32(aligned, merged)
    }

    /// SWR: Store Word Right
    ///
    /// Writes the low-order bytes of rt to the bytes at and above `addr`.
    pub(in crate::core::cpu) fn op_swr(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        if self.store_isolated(addr) {
            return Ok(());
        }
        let aligned = addr & !0x3;
        let memory = bus.read32(aligned)?;
        let value = self.reg(instr.rt());

        let merged = match addr & 0x3 {
            0 => value,
            1 => (memory & 0x0000_00FF) | (value << 8),
            2 => (memory & 0x0000_FFFF) | (value << 16),
            _ => (memory & 0x00FF_FFFF) | (value << 24),
        };
        bus.write32(aligned, merged)
    }
}
