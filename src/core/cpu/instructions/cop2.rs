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

//! COP2 (GTE) instruction implementations
//!
//! Every COP2 access requires SR.CU2; without it the instruction raises
//! CoprocessorUnusable with CE = 2.

use super::super::decode::Instruction;
use super::super::{ExceptionCause, CPU};
use crate::core::error::Result;
use crate::core::memory::Bus;

impl CPU {
    /// Raise CoprocessorUnusable unless COP2 is enabled
    fn cop2_usable(&mut self) -> bool {
        if self.cop0.cop2_enabled() {
            return true;
        }
        self.coprocessor_unusable(2);
        false
    }

    /// MFC2: Move From Coprocessor 2 (data register)
    ///
    /// Format: MFC2 rt, rd
    /// - rt: CPU destination register (bits [20:16])
    /// - rd: GTE data register (bits [15:11])
    ///
    /// ```text
    /// MFC2 r5, [25]  // r5 = GTE.data[25] (MAC1)
    /// ```
    pub(in crate::core::cpu) fn op_mfc2(&mut self, instr: Instruction) {
        if !self.cop2_usable() {
            return;
        }
        let value = self.gte.read_data(instr.rd() as usize);
        self.set_reg_delayed(instr.rt(), value as u32);

        log::trace!("MFC2: r{} = GTE.data[{}] (0x{:08X})", instr.rt(), instr.rd(), value);
    }

    /// CFC2: Move From Coprocessor 2 (control register)
    ///
    /// ```text
    /// CFC2 r5, [26]  // r5 = GTE.control[26] (H)
    /// ```
    pub(in crate::core::cpu) fn op_cfc2(&mut self, instr: Instruction) {
        if !self.cop2_usable() {
            return;
        }
        let value = self.gte.read_control(instr.rd() as usize);
        self.set_reg_delayed(instr.rt(), value as u32);
    }

    /// MTC2: Move To Coprocessor 2 (data register)
    pub(in crate::core::cpu) fn op_mtc2(&mut self, instr: Instruction) {
        if !self.cop2_usable() {
            return;
        }
        let value = self.reg(instr.rt()) as i32;
        self.gte.write_data(instr.rd() as usize, value);
    }

    /// CTC2: Move To Coprocessor 2 (control register)
    pub(in crate::core::cpu) fn op_ctc2(&mut self, instr: Instruction) {
        if !self.cop2_usable() {
            return;
        }
        let value = self.reg(instr.rt()) as i32;
        self.gte.write_control(instr.rd() as usize, value);
    }

    /// COP2 command: run a GTE operation
    ///
    /// The command's cycle cost is added to this instruction.
    pub(in crate::core::cpu) fn op_gte_command(&mut self, instr: Instruction) {
        if !self.cop2_usable() {
            return;
        }
        self.extra_cycles += self.gte.execute(instr.cop_command());
    }

    /// LWC2: Load Word to Coprocessor 2
    ///
    /// Format: lwc2 rt, offset(rs)
    /// Operation: GTE.data[rt] = memory[rs + sign_extend(offset)]
    pub(in crate::core::cpu) fn op_lwc2(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        if !self.cop2_usable() {
            return Ok(());
        }
        let addr = self.effective_address(instr);
        if addr & 0x3 != 0 {
            self.address_error(ExceptionCause::AddressErrorLoad, addr);
            return Ok(());
        }
        let value = bus.read32(addr)?;
        self.gte.write_data(instr.rt() as usize, value as i32);
        Ok(())
    }

    /// SWC2: Store Word from Coprocessor 2
    ///
    /// Format: swc2 rt, offset(rs)
    /// Operation: memory[rs + sign_extend(offset)] = GTE.data[rt]
    pub(in crate::core::cpu) fn op_swc2(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        if !self.cop2_usable() {
            return Ok(());
        }
        let addr = self.effective_address(instr);
        if addr & 0x3 != 0 {
            self.address_error(ExceptionCause::AddressErrorStore, addr);
            return Ok(());
        }
        if self.cop0.cache_isolated() {
            return Ok(());
        }
        let value = self.gte.read_data(instr.rt() as usize) as u32;
        bus.write32(addr, value)
    }
}
