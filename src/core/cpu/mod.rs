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

//! CPU (MIPS R3000A)
//!
//! Fetch, decode and execute one instruction per [`CPU::step`], with a
//! branch delay slot, a one-instruction load delay and synchronous exception
//! entry. COP0 handles status and exceptions; COP2 is the [`GTE`].
//!
//! # Load delay
//!
//! A load queues its result. The queue advances at the end of every
//! instruction, so the instruction right after a load still reads the old
//! register value and the one after that sees the loaded value. A direct
//! write to the same register in the delay slot cancels the load, as does a
//! second load to the same register.

use crate::core::error::Result;
use crate::core::gte::GTE;
use crate::core::memory::Bus;

mod cop0;
mod decode;
mod instructions;
#[cfg(test)]
mod tests;

pub use cop0::ExceptionCause;
use cop0::COP0;
pub use decode::{Instruction, Operation};

/// Reset vector
pub const RESET_VECTOR: u32 = 0xBFC0_0000;

/// Exception vector with SR.BEV set
const BOOT_EXCEPTION_VECTOR: u32 = 0xBFC0_0180;

/// Exception vector with SR.BEV clear
const RAM_EXCEPTION_VECTOR: u32 = 0x8000_0080;

/// CPU (MIPS R3000A) emulation implementation
///
/// # Example
/// ```
/// use psx_engine::core::cpu::CPU;
///
/// let mut cpu = CPU::new();
/// cpu.set_reg(1, 0x1234);
/// assert_eq!(cpu.reg(1), 0x1234);
/// assert_eq!(cpu.reg(0), 0); // r0 is always 0
/// ```
pub struct CPU {
    /// General purpose registers (r0-r31)
    regs: [u32; 32],

    /// Address of the next instruction to fetch
    pc: u32,

    /// Address after `pc`; branches write here so the delay slot still runs
    next_pc: u32,

    /// Address of the instruction being executed
    current_pc: u32,

    hi: u32,
    lo: u32,

    cop0: COP0,

    /// Coprocessor 2
    gte: GTE,

    /// Load issued by the current instruction
    load: Option<LoadDelay>,

    /// Load issued by the previous instruction, committed after this one
    in_flight: Option<LoadDelay>,

    /// Set by branch and jump instructions; makes the next one a delay slot
    branched: bool,

    /// The current instruction sits in a branch delay slot
    delay_slot: bool,

    /// Cycles beyond the base cost of the current instruction
    extra_cycles: u32,

    /// Current instruction word (for diagnostics)
    current_instruction: u32,
}

/// Pending register write from a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadDelay {
    reg: u8,
    value: u32,
}

impl CPU {
    /// Create a CPU in its reset state
    ///
    /// - PC: 0xBFC00000 (BIOS entry point)
    /// - COP0 SR: 0x10900000, PRID: 0x00000002
    pub fn new() -> Self {
        Self {
            regs: [0; 32],
            pc: RESET_VECTOR,
            next_pc: RESET_VECTOR.wrapping_add(4),
            current_pc: RESET_VECTOR,
            hi: 0,
            lo: 0,
            cop0: COP0::new(),
            gte: GTE::new(),
            load: None,
            in_flight: None,
            branched: false,
            delay_slot: false,
            extra_cycles: 0,
            current_instruction: 0,
        }
    }

    /// Return to the power-on state
    pub fn reset(&mut self) {
        self.regs = [0; 32];
        self.pc = RESET_VECTOR;
        self.next_pc = RESET_VECTOR.wrapping_add(4);
        self.current_pc = RESET_VECTOR;
        self.hi = 0;
        self.lo = 0;
        self.cop0.reset();
        self.gte.reset();
        self.load = None;
        self.in_flight = None;
        self.branched = false;
        self.delay_slot = false;
        self.extra_cycles = 0;
        self.current_instruction = 0;
    }

    /// Read a general purpose register (r0 always reads 0)
    #[inline(always)]
    pub fn reg(&self, index: u8) -> u32 {
        self.regs[(index & 0x1F) as usize]
    }

    /// Write a general purpose register
    ///
    /// Writes to r0 are ignored. A load in flight to the same register is
    /// cancelled.
    #[inline(always)]
    pub fn set_reg(&mut self, index: u8, value: u32) {
        let index = index & 0x1F;
        if index == 0 {
            return;
        }
        self.regs[index as usize] = value;
        if self.in_flight.is_some_and(|load| load.reg == index) {
            self.in_flight = None;
        }
    }

    /// Queue a register write behind the load delay slot
    ///
    /// # Example
    /// ```
    /// use psx_engine::core::cpu::CPU;
    ///
    /// let mut cpu = CPU::new();
    /// cpu.set_reg_delayed(3, 100);
    /// assert_eq!(cpu.reg(3), 0);
    ///
    /// // Delay slot instruction runs, then the load lands
    /// cpu.advance_load_delay();
    /// assert_eq!(cpu.reg(3), 0);
    /// cpu.advance_load_delay();
    /// assert_eq!(cpu.reg(3), 100);
    /// ```
    pub fn set_reg_delayed(&mut self, index: u8, value: u32) {
        let index = index & 0x1F;
        if self.in_flight.is_some_and(|load| load.reg == index) {
            self.in_flight = None;
        }
        self.load = (index != 0).then_some(LoadDelay { reg: index, value });
    }

    /// Commit the load in flight and move the current load behind it
    ///
    /// Runs at the end of every instruction.
    pub fn advance_load_delay(&mut self) {
        if let Some(load) = self.in_flight.take() {
            self.regs[load.reg as usize] = load.value;
        }
        self.in_flight = self.load.take();
    }

    /// Register value as seen by LWL/LWR, which merge with a load in flight
    fn reg_for_merge(&self, index: u8) -> u32 {
        match self.in_flight {
            Some(load) if load.reg == index => load.value,
            _ => self.reg(index),
        }
    }

    /// Execute one instruction
    ///
    /// # Arguments
    ///
    /// * `bus` - CPU bus used for fetches and data accesses
    /// * `irq_pending` - Interrupt controller output, mirrored into CAUSE bit 10
    ///
    /// # Returns
    ///
    /// Cycles consumed: 1, plus the GTE command cost for COP2 commands.
    /// Guest faults are taken as exceptions and still return `Ok`; only bus
    /// mapping errors surface as `Err`.
    pub fn step(&mut self, bus: &Bus, irq_pending: bool) -> Result<u32> {
        self.current_pc = self.pc;
        self.delay_slot = self.branched;
        self.branched = false;
        self.extra_cycles = 0;

        self.cop0.set_hardware_interrupt(irq_pending);
        if self.cop0.interrupt_active() {
            self.exception(ExceptionCause::Interrupt);
            self.advance_load_delay();
            return Ok(1);
        }

        if self.pc & 0x3 != 0 {
            self.address_error(ExceptionCause::AddressErrorLoad, self.pc);
            self.advance_load_delay();
            return Ok(1);
        }

        let word = bus.read32(self.pc)?;
        self.current_instruction = word;
        self.pc = self.next_pc;
        self.next_pc = self.next_pc.wrapping_add(4);

        self.execute_instruction(Instruction(word), bus)?;
        self.advance_load_delay();

        Ok(1 + self.extra_cycles)
    }

    /// Enter the exception handler
    ///
    /// Pushes the SR mode stack, records the cause code and EPC (the branch
    /// address with CAUSE.BD set when the faulting instruction is in a delay
    /// slot) and jumps to the vector selected by SR.BEV.
    pub fn exception(&mut self, cause: ExceptionCause) {
        self.cop0.enter_exception();

        let mut cause_reg = self.cop0.regs[COP0::CAUSE];
        cause_reg &= !(0x7C | (1 << 31) | (0x3 << 28));
        cause_reg |= (cause as u32) << 2;

        let epc = if self.delay_slot {
            cause_reg |= 1 << 31;
            self.current_pc.wrapping_sub(4)
        } else {
            self.current_pc
        };
        self.cop0.regs[COP0::CAUSE] = cause_reg;
        self.cop0.regs[COP0::EPC] = epc;

        let handler = if self.cop0.boot_vectors() {
            BOOT_EXCEPTION_VECTOR
        } else {
            RAM_EXCEPTION_VECTOR
        };

        log::debug!(
            "CPU: exception {:?} at 0x{:08X} (EPC=0x{:08X}, BD={}) -> 0x{:08X}",
            cause,
            self.current_pc,
            epc,
            self.delay_slot,
            handler
        );

        self.pc = handler;
        self.next_pc = handler.wrapping_add(4);
        self.branched = false;
    }

    /// Address error with BadVaddr
    pub(crate) fn address_error(&mut self, cause: ExceptionCause, addr: u32) {
        self.cop0.regs[COP0::BADA] = addr;
        self.exception(cause);
    }

    /// Coprocessor unusable, with the coprocessor number in CAUSE.CE
    pub(crate) fn coprocessor_unusable(&mut self, cop: u8) {
        self.exception(ExceptionCause::CoprocessorUnusable);
        self.cop0.regs[COP0::CAUSE] |= ((cop & 0x3) as u32) << 28;
    }

    /// Take a branch relative to the delay slot address
    #[inline(always)]
    pub(crate) fn branch(&mut self, offset: u32) {
        self.next_pc = self.pc.wrapping_add(offset);
    }

    /// Address of the next instruction to fetch
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Address fetched after `pc` (the branch target inside a delay slot)
    pub fn next_pc(&self) -> u32 {
        self.next_pc
    }

    /// Address of the most recently executed instruction
    pub fn current_pc(&self) -> u32 {
        self.current_pc
    }

    /// Redirect execution (side-loading, tests)
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
        self.next_pc = pc.wrapping_add(4);
        self.branched = false;
    }

    /// HI register (remainder or high product word)
    pub fn hi(&self) -> u32 {
        self.hi
    }

    /// LO register (quotient or low product word)
    pub fn lo(&self) -> u32 {
        self.lo
    }

    /// All 32 general purpose registers
    pub fn regs(&self) -> &[u32; 32] {
        &self.regs
    }

    /// Read a COP0 register
    pub fn cop0_reg(&self, index: u8) -> u32 {
        self.cop0.read(index)
    }

    /// Write a COP0 register with MTC0 semantics
    pub fn set_cop0_reg(&mut self, index: u8, value: u32) {
        self.cop0.write(index, value);
    }

    /// COP0 status register
    pub fn sr(&self) -> u32 {
        self.cop0.regs[COP0::SR]
    }

    /// COP0 cause register
    pub fn cause(&self) -> u32 {
        self.cop0.regs[COP0::CAUSE]
    }

    /// COP0 exception return address
    pub fn epc(&self) -> u32 {
        self.cop0.regs[COP0::EPC]
    }

    /// Geometry coprocessor (COP2)
    pub fn gte(&self) -> &GTE {
        &self.gte
    }

    /// Mutable access to the geometry coprocessor
    pub fn gte_mut(&mut self) -> &mut GTE {
        &mut self.gte
    }

    /// True when the last executed instruction sat in a delay slot
    pub fn in_delay_slot(&self) -> bool {
        self.delay_slot
    }

    /// Formatted register dump for diagnostics
    pub fn dump_registers(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "PC: 0x{:08X}  Next PC: 0x{:08X}  Instr: 0x{:08X}",
            self.current_pc, self.next_pc, self.current_instruction
        );
        let _ = writeln!(out, "HI: 0x{:08X}  LO: 0x{:08X}", self.hi, self.lo);
        for row in self.regs.chunks(4).enumerate() {
            let (n, values) = row;
            for (i, value) in values.iter().enumerate() {
                let _ = write!(out, "r{:<2}: 0x{:08X}  ", n * 4 + i, value);
            }
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "SR: 0x{:08X}  CAUSE: 0x{:08X}  EPC: 0x{:08X}  BADA: 0x{:08X}",
            self.cop0.regs[COP0::SR],
            self.cop0.regs[COP0::CAUSE],
            self.cop0.regs[COP0::EPC],
            self.cop0.regs[COP0::BADA]
        );
        out
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}
