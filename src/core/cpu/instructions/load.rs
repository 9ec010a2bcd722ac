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
    // === Load Instructions ===
    //
    // All results go through the load delay slot. Alignment is checked
    // before the bus is touched.

    /// Effective address: rs + sign_extend(offset)
    #[inline(always)]
    pub(in crate::core::cpu) fn effective_address(&self, instr: Instruction) -> u32 {
        self.reg(instr.rs()).wrapping_add(instr.imm_se())
    }

    /// LW: Load Word
    ///
    /// Format: lw rt, offset(rs)
    /// Operation: rt = memory[rs + sign_extend(offset)]
    ///
    /// # Returns
    ///
    /// Ok(()) on success or after raising AddressErrorLoad on misalignment;
    /// Err only for unmapped addresses.
    pub(in crate::core::cpu) fn op_lw(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        if addr & 0x3 != 0 {
            self.address_error(ExceptionCause::AddressErrorLoad, addr);
            return Ok(());
        }

        let value = bus.read32(addr)?;
        self.set_reg_delayed(instr.rt(), value);
        Ok(())
    }

    /// LH: Load Halfword (sign-extended)
    pub(in crate::core::cpu) fn op_lh(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        if addr & 0x1 != 0 {
            self.address_error(ExceptionCause::AddressErrorLoad, addr);
            return Ok(());
        }

        let value = bus.read16(addr)? as i16 as i32 as u32;
        self.set_reg_delayed(instr.rt(), value);
        Ok(())
    }

    /// LHU: Load Halfword Unsigned (zero-extended)
    pub(in crate::core::cpu) fn op_lhu(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        if addr & 0x1 != 0 {
            self.address_error(ExceptionCause::AddressErrorLoad, addr);
            return Ok(());
        }

        let value = bus.read16(addr)? as u32;
        self.set_reg_delayed(instr.rt(), value);
        Ok(())
    }

    /// LB: Load Byte (sign-extended)
    pub(in crate::core::cpu) fn op_lb(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        let value = bus.read8(addr)? as i8 as i32 as u32;
        self.set_reg_delayed(instr.rt(), value);
        Ok(())
    }

    /// LBU: Load Byte Unsigned
    pub(in crate::core::cpu) fn op_lbu(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        let value = bus.read8(addr)? as u32;
        self.set_reg_delayed(instr.rt(), value);
        Ok(())
    }

    /// LWL: Load Word Left
    ///
    /// Loads the high-order bytes of an unaligned word into the high end of
    /// rt. Paired with LWR to read a word at any address; never faults on
    /// alignment. The register value merged with is the one a load in
    /// flight would produce, so `lwl`/`lwr` back to back combine correctly.
    ///
    /// Format: lwl rt, offset(rs)
    pub(in crate::core::cpu) fn op_lwl(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        let word = bus.read32(addr & !0x3)?;
        let current = self.reg_for_merge(instr.rt());

        let value = match addr & 0x3 {
            0 => (current & 0x00FF_FFFF) | (word << 24),
            1 => (current & 0x0000_FFFF) | (word << 16),
            2 => (current & 0x0000_00FF) | (word << 8),
            _ => word,
        };
        self.set_reg_delayed(instr.rt(), value);
        Ok(())
    }

    /// LWR: Load Word Right
    ///
    /// Loads the low-order bytes of an unaligned word into the low end of rt.
    ///
    /// Format: lwr rt, offset(rs)
    pub(in crate::core::cpu) fn op_lwr(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let addr = self.effective_address(instr);
        let word = bus.read32(addr & !0x3)?;
        let current = self.reg_for_merge(instr.rt());

        let value = match addr & 0x3 {
            0 => word,
            1 => (current & 0xFF00_0000) | (word >> 8),
            2 => (current & 0xFFFF_0000) | (word >> 16),
            _ => (current & 0xFFFF_FF00) | (word >> 24),
        };
        self.set_reg_delayed(instr.rt(), value);
        Ok(())
    }
}
