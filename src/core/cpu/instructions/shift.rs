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
use super::super::CPU;

impl CPU {
    // === Shift Instructions ===

    /// SLL: Shift Left Logical
    ///
    /// Format: sll rd, rt, shamt
    /// Operation: rd = rt << shamt
    ///
    /// `sll r0, r0, 0` is the canonical NOP.
    pub(in crate::core::cpu) fn op_sll(&mut self, instr: Instruction) {
        let value = self.reg(instr.rt()) << instr.shamt();
        self.set_reg(instr.rd(), value);
    }

    /// SRL: Shift Right Logical
    pub(in crate::core::cpu) fn op_srl(&mut self, instr: Instruction) {
        let value = self.reg(instr.rt()) >> instr.shamt();
        self.set_reg(instr.rd(), value);
    }

    /// SRA: Shift Right Arithmetic
    pub(in crate::core::cpu) fn op_sra(&mut self, instr: Instruction) {
        let value = (self.reg(instr.rt()) as i32) >> instr.shamt();
        self.set_reg(instr.rd(), value as u32);
    }

    /// SLLV: Shift Left Logical Variable (amount is rs & 0x1F)
    pub(in crate::core::cpu) fn op_sllv(&mut self, instr: Instruction) {
        let value = self.reg(instr.rt()) << (self.reg(instr.rs()) & 0x1F);
        self.set_reg(instr.rd(), value);
    }

    /// SRLV: Shift Right Logical Variable
    pub(in crate::core::cpu) fn op_srlv(&mut self, instr: Instruction) {
        let value = self.reg(instr.rt()) >> (self.reg(instr.rs()) & 0x1F);
        self.set_reg(instr.rd(), value);
    }

    /// SRAV: Shift Right Arithmetic Variable
    pub(in crate::core::cpu) fn op_srav(&mut self, instr: Instruction) {
        let value = (self.reg(instr.rt()) as i32) >> (self.reg(instr.rs()) & 0x1F);
        self.set_reg(instr.rd(), value as u32);
    }
}
