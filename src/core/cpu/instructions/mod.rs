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

//! CPU instruction implementations
//!
//! Handlers are grouped by instruction type. Each takes the decoded
//! [`Instruction`] and, for memory operations, the CPU bus.

use super::decode::{Instruction, Operation};
use super::{ExceptionCause, CPU};
use crate::core::error::Result;
use crate::core::memory::Bus;

mod arithmetic;
mod branch;
mod cop0;
mod cop2;
mod exception;
mod jump;
mod load;
mod logical;
mod multiply;
mod shift;
mod store;

impl CPU {
    /// Dispatch a decoded instruction
    ///
    /// Unknown encodings raise ReservedInstruction.
    pub(super) fn execute_instruction(&mut self, instr: Instruction, bus: &Bus) -> Result<()> {
        let Some(operation) = instr.operation() else {
            log::debug!(
                "CPU: reserved instruction 0x{:08X} at 0x{:08X}",
                instr.0,
                self.current_pc
            );
            self.exception(ExceptionCause::ReservedInstruction);
            return Ok(());
        };

        match operation {
            Operation::Sll => self.op_sll(instr),
            Operation::Srl => self.op_srl(instr),
            Operation::Sra => self.op_sra(instr),
            Operation::Sllv => self.op_sllv(instr),
            Operation::Srlv => self.op_srlv(instr),
            Operation::Srav => self.op_srav(instr),
            Operation::Jr => self.op_jr(instr),
            Operation::Jalr => self.op_jalr(instr),
            Operation::Syscall => self.op_syscall(),
            Operation::Break => self.op_break(),
            Operation::Mfhi => self.op_mfhi(instr),
            Operation::Mthi => self.op_mthi(instr),
            Operation::Mflo => self.op_mflo(instr),
            Operation::Mtlo => self.op_mtlo(instr),
            Operation::Mult => self.op_mult(instr),
            Operation::Multu => self.op_multu(instr),
            Operation::Div => self.op_div(instr),
            Operation::Divu => self.op_divu(instr),
            Operation::Add => self.op_add(instr),
            Operation::Addu => self.op_addu(instr),
            Operation::Sub => self.op_sub(instr),
            Operation::Subu => self.op_subu(instr),
            Operation::And => self.op_and(instr),
            Operation::Or => self.op_or(instr),
            Operation::Xor => self.op_xor(instr),
            Operation::Nor => self.op_nor(instr),
            Operation::Slt => self.op_slt(instr),
            Operation::Sltu => self.op_sltu(instr),
            Operation::Bcond => self.op_bcond(instr),
            Operation::J => self.op_j(instr),
            Operation::Jal => self.op_jal(instr),
            Operation::Beq => self.op_beq(instr),
            Operation::Bne => self.op_bne(instr),
            Operation::Blez => self.op_blez(instr),
            Operation::Bgtz => self.op_bgtz(instr),
            Operation::Addi => self.op_addi(instr),
            Operation::Addiu => self.op_addiu(instr),
            Operation::Slti => self.op_slti(instr),
            Operation::Sltiu => self.op_sltiu(instr),
            Operation::Andi => self.op_andi(instr),
            Operation::Ori => self.op_ori(instr),
            Operation::Xori => self.op_xori(instr),
            Operation::Lui => self.op_lui(instr),
            Operation::Mfc0 => self.op_mfc0(instr),
            Operation::Mtc0 => self.op_mtc0(instr),
            Operation::Rfe => self.op_rfe(),
            Operation::Mfc2 => self.op_mfc2(instr),
            Operation::Cfc2 => self.op_cfc2(instr),
            Operation::Mtc2 => self.op_mtc2(instr),
            Operation::Ctc2 => self.op_ctc2(instr),
            Operation::Gte => self.op_gte_command(instr),
            Operation::Lwc2 => return self.op_lwc2(instr, bus),
            Operation::Swc2 => return self.op_swc2(instr, bus),
            Operation::CopUnusable => self.op_cop_unusable(instr),
            Operation::Lb => return self.op_lb(instr, bus),
            Operation::Lh => return self.op_lh(instr, bus),
            Operation::Lwl => return self.op_lwl(instr, bus),
            Operation::Lw => return self.op_lw(instr, bus),
            Operation::Lbu => return self.op_lbu(instr, bus),
            Operation::Lhu => return self.op_lhu(instr, bus),
            Operation::Lwr => return self.op_lwr(instr, bus),
            Operation::Sb => return self.op_sb(instr, bus),
            Operation::Sh => return self.op_sh(instr, bus),
            Operation::Swl => return self.op_swl(instr, bus),
            Operation::Sw => return self.op_sw(instr, bus),
            Operation::Swr => return self.op_swr(instr, bus),
        }
        Ok(())
    }
}
