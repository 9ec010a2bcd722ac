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

impl CPU {
    // === Arithmetic Instructions ===

    /// ADD: Add (with overflow trap)
    ///
    /// Format: add rd, rs, rt
    /// Operation: rd = rs + rt
    ///
    /// Signed overflow raises ArithmeticOverflow and leaves rd untouched.
    pub(in crate::core::cpu) fn op_add(&mut self, instr: Instruction) {
        let a = self.reg(instr.rs()) as i32;
        let b = self.reg(instr.rt()) as i32;
        match a.checked_add(b) {
            Some(value) => self.set_reg(instr.rd(), value as u32),
            None => self.exception(ExceptionCause::ArithmeticOverflow),
        }
    }

    /// ADDU: Add Unsigned (no trap)
    ///
    /// Format: addu rd, rs, rt
    /// Operation: rd = rs + rt
    pub(in crate::core::cpu) fn op_addu(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()).wrapping_add(self.reg(instr.rt()));
        self.set_reg(instr.rd(), value);
    }

    /// SUB: Subtract (with overflow trap)
    ///
    /// Format: sub rd, rs, rt
    /// Operation: rd = rs - rt
    pub(in crate::core::cpu) fn op_sub(&mut self, instr: Instruction) {
        let a = self.reg(instr.rs()) as i32;
        let b = self.reg(instr.rt()) as i32;
        match a.checked_sub(b) {
            Some(value) => self.set_reg(instr.rd(), value as u32),
            None => self.exception(ExceptionCause::ArithmeticOverflow),
        }
    }

    /// SUBU: Subtract Unsigned (no trap)
    pub(in crate::core::cpu) fn op_subu(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()).wrapping_sub(self.reg(instr.rt()));
        self.set_reg(instr.rd(), value);
    }

    /// ADDI: Add Immediate (with overflow trap)
    ///
    /// Format: addi rt, rs, imm
    /// Operation: rt = rs + sign_extend(imm)
    pub(in crate::core::cpu) fn op_addi(&mut self, instr: Instruction) {
        let a = self.reg(instr.rs()) as i32;
        let b = instr.imm_se() as i32;
        match a.checked_add(b) {
            Some(value) => self.set_reg(instr.rt(), value as u32),
            None => self.exception(ExceptionCause::ArithmeticOverflow),
        }
    }

    /// ADDIU: Add Immediate Unsigned (no trap; the immediate is still sign-extended)
    pub(in crate::core::cpu) fn op_addiu(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()).wrapping_add(instr.imm_se());
        self.set_reg(instr.rt(), value);
    }

    /// SLT: Set on Less Than (signed)
    pub(in crate::core::cpu) fn op_slt(&mut self, instr: Instruction) {
        let value = (self.reg(instr.rs()) as i32) < (self.reg(instr.rt()) as i32);
        self.set_reg(instr.rd(), value as u32);
    }

    /// SLTU: Set on Less Than Unsigned
    pub(in crate::core::cpu) fn op_sltu(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()) < self.reg(instr.rt());
        self.set_reg(instr.rd(), value as u32);
    }

    /// SLTI: Set on Less Than Immediate (signed)
    pub(in crate::core::cpu) fn op_slti(&mut self, instr: Instruction) {
        let value = (self.reg(instr.rs()) as i32) < (instr.imm_se() as i32);
        self.set_reg(instr.rt(), value as u32);
    }

    /// SLTIU: Set on Less Than Immediate Unsigned
    ///
    /// The immediate is sign-extended, then compared unsigned.
    pub(in crate::core::cpu) fn op_sltiu(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()) < instr.imm_se();
        self.set_reg(instr.rt(), value as u32);
    }

    /// LUI: Load Upper Immediate
    ///
    /// Format: lui rt, imm
    /// Operation: rt = imm << 16
    pub(in crate::core::cpu) fn op_lui(&mut self, instr: Instruction) {
        self.set_reg(instr.rt(), instr.imm() << 16);
    }
}
