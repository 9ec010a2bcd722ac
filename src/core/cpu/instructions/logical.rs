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
    // === Logical Instructions ===

    /// AND: rd = rs & rt
    pub(in crate::core::cpu) fn op_and(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()) & self.reg(instr.rt());
        self.set_reg(instr.rd(), value);
    }

    /// OR: rd = rs | rt
    pub(in crate::core::cpu) fn op_or(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()) | self.reg(instr.rt());
        self.set_reg(instr.rd(), value);
    }

    /// XOR: rd = rs ^ rt
    pub(in crate::core::cpu) fn op_xor(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()) ^ self.reg(instr.rt());
        self.set_reg(instr.rd(), value);
    }

    /// NOR: rd = !(rs | rt)
    pub(in crate::core::cpu) fn op_nor(&mut self, instr: Instruction) {
        let value = !(self.reg(instr.rs()) | self.reg(instr.rt()));
        self.set_reg(instr.rd(), value);
    }

    /// ANDI: rt = rs & zero_extend(imm)
    pub(in crate::core::cpu) fn op_andi(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()) & instr.imm();
        self.set_reg(instr.rt(), value);
    }

    /// ORI: rt = rs | zero_extend(imm)
    pub(in crate::core::cpu) fn op_ori(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()) | instr.imm();
        self.set_reg(instr.rt(), value);
    }

    /// XORI: rt = rs ^ zero_extend(imm)
    pub(in crate::core::cpu) fn op_xori(&mut self, instr: Instruction) {
        let value = self.reg(instr.rs()) ^ instr.imm();
        self.set_reg(instr.rt(), value);
    }
}
