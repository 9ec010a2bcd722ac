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

//! Test rig: a CPU on a bus with main RAM, plus instruction encoders

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::cpu::CPU;
use crate::core::memory::{Bus, Ram, CPU_BUS};

/// Where test programs are placed
pub const PROGRAM: u32 = 0x8000_1000;

/// Scratch data area
pub const DATA: u32 = 0x8000_2000;

pub struct Rig {
    pub cpu: CPU,
    pub bus: Bus,
}

impl Rig {
    pub fn new() -> Self {
        let mut bus = Bus::new(CPU_BUS);
        bus.attach(Rc::new(RefCell::new(Ram::main())));
        let mut cpu = CPU::new();
        cpu.set_pc(PROGRAM);
        Self { cpu, bus }
    }

    /// Rig with `program` loaded at [`PROGRAM`]
    pub fn with_program(program: &[u32]) -> Self {
        let rig = Self::new();
        rig.load(PROGRAM, program);
        rig
    }

    pub fn load(&self, addr: u32, words: &[u32]) {
        for (i, word) in words.iter().enumerate() {
            self.bus.write32(addr + 4 * i as u32, *word).unwrap();
        }
    }

    pub fn step(&mut self) -> u32 {
        self.cpu.step(&self.bus, false).unwrap()
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    pub fn read32(&self, addr: u32) -> u32 {
        self.bus.read32(addr).unwrap()
    }

    /// COP0 CAUSE exception code
    pub fn cause_code(&self) -> u32 {
        (self.cpu.cop0_reg(13) >> 2) & 0x1F
    }

    pub fn epc(&self) -> u32 {
        self.cpu.cop0_reg(14)
    }
}

// Encoders

pub fn special(funct: u32, rs: u32, rt: u32, rd: u32, shamt: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | (shamt << 6) | funct
}

pub fn imm(op: u32, rs: u32, rt: u32, value: u16) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | value as u32
}

pub const NOP: u32 = 0;
pub const SYSCALL: u32 = 0x0000_000C;
pub const RFE: u32 = 0x4200_0010;

pub fn addu(rd: u32, rs: u32, rt: u32) -> u32 {
    special(0x21, rs, rt, rd, 0)
}

pub fn add(rd: u32, rs: u32, rt: u32) -> u32 {
    special(0x20, rs, rt, rd, 0)
}

pub fn addiu(rt: u32, rs: u32, value: i16) -> u32 {
    imm(0x09, rs, rt, value as u16)
}

pub fn lui(rt: u32, value: u16) -> u32 {
    imm(0x0F, 0, rt, value)
}

pub fn ori(rt: u32, rs: u32, value: u16) -> u32 {
    imm(0x0D, rs, rt, value)
}

pub fn lw(rt: u32, base: u32, offset: i16) -> u32 {
    imm(0x23, base, rt, offset as u16)
}

pub fn sw(rt: u32, base: u32, offset: i16) -> u32 {
    imm(0x2B, base, rt, offset as u16)
}

pub fn beq(rs: u32, rt: u32, offset: i16) -> u32 {
    imm(0x04, rs, rt, offset as u16)
}

pub fn bne(rs: u32, rt: u32, offset: i16) -> u32 {
    imm(0x05, rs, rt, offset as u16)
}

pub fn jr(rs: u32) -> u32 {
    special(0x08, rs, 0, 0, 0)
}

pub fn mtc0(rt: u32, rd: u32) -> u32 {
    (0x10 << 26) | (0x04 << 21) | (rt << 16) | (rd << 11)
}

pub fn mfc0(rt: u32, rd: u32) -> u32 {
    (0x10 << 26) | (rt << 16) | (rd << 11)
}

/// `lui` + `ori` pair loading a 32-bit constant
pub fn li(rt: u32, value: u32) -> [u32; 2] {
    [lui(rt, (value >> 16) as u16), ori(rt, rt, value as u16)]
}
