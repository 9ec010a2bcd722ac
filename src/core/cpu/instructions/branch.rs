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
    // === Branch Instructions ===
    //
    // Every branch marks the next instruction as a delay slot, taken or not.
    // The target is relative to the delay slot address.

    /// Common tail of every conditional branch
    fn branch_if(&mut self, instr: Instruction, condition: bool) {
        self.branched = true;
        if condition {
            self.branch(instr.imm_se() << 2);
        }
    }

    /// BLTZ, BGEZ, BLTZAL, BGEZAL (opcode 0x01)
    ///
    /// Bit 0 of rt selects BGEZ over BLTZ. The link forms are encoded with
    /// rt = 0x10/0x11; other rt values with bit 4 set behave as the plain
    /// branch. Linking happens whether or not the branch is taken.
    pub(in crate::core::cpu) fn op_bcond(&mut self, instr: Instruction) {
        let rt = instr.rt();
        let negative = (self.reg(instr.rs()) as i32) < 0;
        let condition = if rt & 0x01 != 0 { !negative } else { negative };

        if rt & 0x1E == 0x10 {
            self.set_reg(31, self.next_pc);
        }
        self.branch_if(instr, condition);
    }

    /// BEQ: Branch on Equal
    ///
    /// Format: beq rs, rt, offset
    /// Operation: if (rs == rt) PC = PC + 4 + (sign_extend(offset) << 2)
    pub(in crate::core::cpu) fn op_beq(&mut self, instr: Instruction) {
        let condition = self.reg(instr.rs()) == self.reg(instr.rt());
        self.branch_if(instr, condition);
    }

    /// BNE: Branch on Not Equal
    pub(in crate::core::cpu) fn op_bne(&mut self, instr: Instruction) {
        let condition = self.reg(instr.rs()) != self.reg(instr.rt());
        self.branch_if(instr, condition);
    }

    /// BLEZ: Branch on Less Than or Equal to Zero (signed)
    pub(in crate::core::cpu) fn op_blez(&mut self, instr: Instruction) {
        let condition = (self.reg(instr.rs()) as i32) <= 0;
        self.branch_if(instr, condition);
    }

    /// BGTZ: Branch on Greater Than Zero (signed)
    pub(in crate::core::cpu) fn op_bgtz(&mut self, instr: Instruction) {
        let condition = (self.reg(instr.rs()) as i32) > 0;
        self.branch_if(instr, condition);
    }
}
