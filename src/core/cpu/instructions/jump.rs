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
    // === Jump Instructions ===

    /// J: Jump
    ///
    /// Format: j target
    /// Operation: PC = (PC & 0xF0000000) | (target << 2)
    ///
    /// The upper bits come from the delay slot address.
    pub(in crate::core::cpu) fn op_j(&mut self, instr: Instruction) {
        self.branched = true;
        self.next_pc = (self.pc & 0xF000_0000) | (instr.target() << 2);
    }

    /// JAL: Jump and Link
    ///
    /// Format: jal target
    /// Operation: r31 = PC + 8; PC = (PC & 0xF0000000) | (target << 2)
    pub(in crate::core::cpu) fn op_jal(&mut self, instr: Instruction) {
        self.set_reg(31, self.next_pc);
        self.op_j(instr);
    }

    /// JR: Jump Register
    ///
    /// A misaligned target faults on the following fetch.
    pub(in crate::core::cpu) fn op_jr(&mut self, instr: Instruction) {
        self.branched = true;
        self.next_pc = self.reg(instr.rs());
    }

    /// JALR: Jump and Link Register
    ///
    /// Format: jalr rd, rs
    /// Operation: rd = PC + 8; PC = rs
    ///
    /// rs is read before rd is written, so `jalr r1, r1` jumps to the old r1.
    pub(in crate::core::cpu) fn op_jalr(&mut self, instr: Instruction) {
        let target = self.reg(instr.rs());
        self.set_reg(instr.rd(), self.next_pc);
        self.branched = true;
        self.next_pc = target;
    }
}
