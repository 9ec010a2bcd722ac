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
    // === COP0 Instructions ===

    /// MFC0: Move From Coprocessor 0
    ///
    /// Format: mfc0 rt, rd
    /// Operation: rt = COP0[rd] (through the load delay slot)
    pub(in crate::core::cpu) fn op_mfc0(&mut self, instr: Instruction) {
        let value = self.cop0.read(instr.rd());
        self.set_reg_delayed(instr.rt(), value);
    }

    /// MTC0: Move To Coprocessor 0
    ///
    /// Format: mtc0 rt, rd
    /// Operation: COP0[rd] = rt
    pub(in crate::core::cpu) fn op_mtc0(&mut self, instr: Instruction) {
        let value = self.reg(instr.rt());
        log::trace!("MTC0: cop0r{} = 0x{:08X}", instr.rd(), value);
        self.cop0.write(instr.rd(), value);
    }

    /// RFE: Return From Exception
    ///
    /// Pops the KU/IE mode stack in SR. The jump back to EPC is done by the
    /// JR that precedes RFE in its delay slot.
    pub(in crate::core::cpu) fn op_rfe(&mut self) {
        self.cop0.return_from_exception();
    }
}
