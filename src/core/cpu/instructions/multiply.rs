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
    // === Multiply/Divide Instructions ===

    /// MULT: Multiply (signed)
    ///
    /// Format: mult rs, rt
    /// Operation: (HI, LO) = rs * rt (signed 64-bit result)
    pub(in crate::core::cpu) fn op_mult(&mut self, instr: Instruction) {
        let a = self.reg(instr.rs()) as i32 as i64;
        let b = self.reg(instr.rt()) as i32 as i64;
        let result = (a * b) as u64;

        self.lo = result as u32;
        self.hi = (result >> 32) as u32;
    }

    /// MULTU: Multiply Unsigned
    ///
    /// Format: multu rs, rt
    /// Operation: (HI, LO) = rs * rt (unsigned 64-bit result)
    pub(in crate::core::cpu) fn op_multu(&mut self, instr: Instruction) {
        let a = self.reg(instr.rs()) as u64;
        let b = self.reg(instr.rt()) as u64;
        let result = a * b;

        self.lo = result as u32;
        self.hi = (result >> 32) as u32;
    }

    /// DIV: Divide (signed)
    ///
    /// Format: div rs, rt
    /// Operation: LO = rs / rt, HI = rs % rt
    ///
    /// Never traps. Division by zero yields LO = -1 (or 1 for a negative
    /// dividend) and HI = rs; 0x80000000 / -1 yields LO = 0x80000000, HI = 0.
    pub(in crate::core::cpu) fn op_div(&mut self, instr: Instruction) {
        let n = self.reg(instr.rs()) as i32;
        let d = self.reg(instr.rt()) as i32;

        if d == 0 {
            self.hi = n as u32;
            self.lo = if n >= 0 { 0xFFFF_FFFF } else { 1 };
        } else if n == i32::MIN && d == -1 {
            self.hi = 0;
            self.lo = i32::MIN as u32;
        } else {
            self.hi = (n % d) as u32;
            self.lo = (n / d) as u32;
        }
    }

    /// DIVU: Divide Unsigned
    ///
    /// Division by zero yields LO = 0xFFFFFFFF and HI = rs.
    pub(in crate::core::cpu) fn op_divu(&mut self, instr: Instruction) {
        let n = self.reg(instr.rs());
        let d = self.reg(instr.rt());

        if d == 0 {
            self.hi = n;
            self.lo = 0xFFFF_FFFF;
        } else {
            self.hi = n % d;
            self.lo = n / d;
        }
    }

    /// MFHI: rd = HI
    pub(in crate::core::cpu) fn op_mfhi(&mut self, instr: Instruction) {
        self.set_reg(instr.rd(), self.hi);
    }

    /// MFLO: rd = LO
    pub(in crate::core::cpu) fn op_mflo(&mut self, instr: Instruction) {
        self.set_reg(instr.rd(), self.lo);
    }

    /// MTHI: HI = rs
    pub(in crate::core::cpu) fn op_mthi(&mut self, instr: Instruction) {
        self.hi = self.reg(instr.rs());
    }

    /// MTLO: LO = rs
    pub(in crate::core::cpu) fn op_mtlo(&mut self, instr: Instruction) {
        self.lo = self.reg(instr.rs());
    }
}
