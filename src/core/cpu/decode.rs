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

//! Instruction decoding
//!
//! A fetched word is wrapped in [`Instruction`], which exposes the operand
//! fields, and classified into an [`Operation`] tag. Words that match no
//! operation decode to `None` and raise ReservedInstruction.
//!
//! ```text
//! R-type: | op (6) | rs (5) | rt (5) | rd (5) | shamt (5) | funct (6) |
//! I-type: | op (6) | rs (5) | rt (5) |        immediate (16)         |
//! J-type: | op (6) |                 target (26)                     |
//! ```

/// Raw 32-bit instruction word with field accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction(pub u32);

impl Instruction {
    /// Primary opcode (bits 31-26)
    #[inline(always)]
    pub fn op(self) -> u8 {
        (self.0 >> 26) as u8
    }

    #[inline(always)]
    pub fn rs(self) -> u8 {
        ((self.0 >> 21) & 0x1F) as u8
    }

    #[inline(always)]
    pub fn rt(self) -> u8 {
        ((self.0 >> 16) & 0x1F) as u8
    }

    #[inline(always)]
    pub fn rd(self) -> u8 {
        ((self.0 >> 11) & 0x1F) as u8
    }

    #[inline(always)]
    pub fn shamt(self) -> u32 {
        (self.0 >> 6) & 0x1F
    }

    /// Function code of SPECIAL instructions (bits 5-0)
    #[inline(always)]
    pub fn funct(self) -> u8 {
        (self.0 & 0x3F) as u8
    }

    /// Zero-extended 16-bit immediate
    #[inline(always)]
    pub fn imm(self) -> u32 {
        self.0 & 0xFFFF
    }

    /// Sign-extended 16-bit immediate
    #[inline(always)]
    pub fn imm_se(self) -> u32 {
        self.0 as u16 as i16 as i32 as u32
    }

    /// 26-bit jump pseudo-address
    #[inline(always)]
    pub fn target(self) -> u32 {
        self.0 & 0x03FF_FFFF
    }

    /// Coprocessor number encoded in COPz/LWCz/SWCz opcodes
    #[inline(always)]
    pub fn cop(self) -> u8 {
        self.op() & 0x3
    }

    /// Coprocessor command word (bits 24-0) for COPz with bit 25 set
    #[inline(always)]
    pub fn cop_command(self) -> u32 {
        self.0 & 0x01FF_FFFF
    }

    /// Classify the instruction
    pub fn operation(self) -> Option<Operation> {
        use Operation::*;

        let op = match self.op() {
            0x00 => match self.funct() {
                0x00 => Sll,
                0x02 => Srl,
                0x03 => Sra,
                0x04 => Sllv,
                0x06 => Srlv,
                0x07 => Srav,
                0x08 => Jr,
                0x09 => Jalr,
                0x0C => Syscall,
                0x0D => Break,
                0x10 => Mfhi,
                0x11 => Mthi,
                0x12 => Mflo,
                0x13 => Mtlo,
                0x18 => Mult,
                0x19 => Multu,
                0x1A => Div,
                0x1B => Divu,
                0x20 => Add,
                0x21 => Addu,
                0x22 => Sub,
                0x23 => Subu,
                0x24 => And,
                0x25 => Or,
                0x26 => Xor,
                0x27 => Nor,
                0x2A => Slt,
                0x2B => Sltu,
                _ => return None,
            },
            0x01 => Bcond,
            0x02 => J,
            0x03 => Jal,
            0x04 => Beq,
            0x05 => Bne,
            0x06 => Blez,
            0x07 => Bgtz,
            0x08 => Addi,
            0x09 => Addiu,
            0x0A => Slti,
            0x0B => Sltiu,
            0x0C => Andi,
            0x0D => Ori,
            0x0E => Xori,
            0x0F => Lui,
            0x10 => match self.rs() {
                0x00 => Mfc0,
                0x04 => Mtc0,
                0x10 if self.funct() == 0x10 => Rfe,
                _ => return None,
            },
            0x12 => {
                if self.0 & (1 << 25) != 0 {
                    Gte
                } else {
                    match self.rs() {
                        0x00 => Mfc2,
                        0x02 => Cfc2,
                        0x04 => Mtc2,
                        0x06 => Ctc2,
                        _ => return None,
                    }
                }
            }
            0x11 | 0x13 => CopUnusable,
            0x20 => Lb,
            0x21 => Lh,
            0x22 => Lwl,
            0x23 => Lw,
            0x24 => Lbu,
            0x25 => Lhu,
            0x26 => Lwr,
            0x28 => Sb,
            0x29 => Sh,
            0x2A => Swl,
            0x2B => Sw,
            0x2E => Swr,
            0x32 => Lwc2,
            0x3A => Swc2,
            0x30 | 0x31 | 0x33 | 0x38 | 0x39 | 0x3B => CopUnusable,
            _ => return None,
        };
        Some(op)
    }
}

/// Decoded operation tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    // Shifts
    Sll,
    Srl,
    Sra,
    Sllv,
    Srlv,
    Srav,

    // Register jumps and traps
    Jr,
    Jalr,
    Syscall,
    Break,

    // HI/LO
    Mfhi,
    Mthi,
    Mflo,
    Mtlo,
    Mult,
    Multu,
    Div,
    Divu,

    // ALU
    Add,
    Addu,
    Sub,
    Subu,
    And,
    Or,
    Xor,
    Nor,
    Slt,
    Sltu,

    /// BLTZ, BGEZ, BLTZAL, BGEZAL (selected by rt)
    Bcond,
    J,
    Jal,
    Beq,
    Bne,
    Blez,
    Bgtz,

    // Immediate ALU
    Addi,
    Addiu,
    Slti,
    Sltiu,
    Andi,
    Ori,
    Xori,
    Lui,

    // Coprocessor 0
    Mfc0,
    Mtc0,
    Rfe,

    // Coprocessor 2
    Mfc2,
    Cfc2,
    Mtc2,
    Ctc2,
    /// GTE command (COP2 with bit 25 set)
    Gte,
    Lwc2,
    Swc2,

    /// COP1/COP3 and their load/store forms
    CopUnusable,

    // Loads
    Lb,
    Lh,
    Lwl,
    Lw,
    Lbu,
    Lhu,
    Lwr,

    // Stores
    Sb,
    Sh,
    Swl,
    Sw,
    Swr,
}
