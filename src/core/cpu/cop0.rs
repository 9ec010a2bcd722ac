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

/// Coprocessor 0 (System Control)
///
/// Holds the status, cause and exception registers. Everything other than
/// SR and CAUSE is opaque 32-bit storage as far as the pipeline is concerned.
#[derive(Debug, Clone)]
pub(super) struct COP0 {
    pub(super) regs: [u32; 32],
}

impl COP0 {
    /// Breakpoint PC
    pub const BPC: usize = 3;
    /// Breakpoint Data Address
    pub const BDA: usize = 5;
    /// Jump target of the last exception
    pub const TAR: usize = 6;
    /// Debug and cache invalidate control
    pub const DCIC: usize = 7;
    /// Bad Virtual Address
    pub const BADA: usize = 8;
    /// Data Address Mask
    pub const BDAM: usize = 9;
    /// PC Mask
    pub const BPCM: usize = 11;
    /// Status Register
    pub const SR: usize = 12;
    /// Cause Register
    pub const CAUSE: usize = 13;
    /// Exception PC
    pub const EPC: usize = 14;
    /// Processor ID
    pub const PRID: usize = 15;

    const SR_RESET: u32 = 0x1090_0000;
    const PRID_VALUE: u32 = 0x0000_0002;

    /// Software-writable CAUSE bits (IP0-IP1)
    const CAUSE_WRITABLE: u32 = 0x0000_0300;

    pub(super) fn new() -> Self {
        let mut cop0 = Self { regs: [0; 32] };
        cop0.reset();
        cop0
    }

    pub(super) fn reset(&mut self) {
        self.regs = [0; 32];
        self.regs[Self::SR] = Self::SR_RESET;
        self.regs[Self::PRID] = Self::PRID_VALUE;
    }

    /// MFC0 view of a register
    pub(super) fn read(&self, index: u8) -> u32 {
        self.regs[(index & 0x1F) as usize]
    }

    /// MTC0 store
    ///
    /// CAUSE only takes the two software interrupt bits; BadVaddr and
    /// PRID are read-only.
    pub(super) fn write(&mut self, index: u8, value: u32) {
        match (index & 0x1F) as usize {
            Self::CAUSE => {
                let cause = self.regs[Self::CAUSE];
                self.regs[Self::CAUSE] =
                    (cause & !Self::CAUSE_WRITABLE) | (value & Self::CAUSE_WRITABLE);
            }
            Self::BADA | Self::PRID => {
                log::trace!("COP0: ignoring write to read-only register {}", index);
            }
            i => self.regs[i] = value,
        }
    }

    #[inline(always)]
    pub(super) fn sr(&self) -> u32 {
        self.regs[Self::SR]
    }

    /// SR bit 16: stores go to the cache only
    #[inline(always)]
    pub(super) fn cache_isolated(&self) -> bool {
        self.sr() & (1 << 16) != 0
    }

    /// SR bit 30: COP2 enabled
    #[inline(always)]
    pub(super) fn cop2_enabled(&self) -> bool {
        self.sr() & (1 << 30) != 0
    }

    /// SR bit 22: exception vectors in ROM
    #[inline(always)]
    pub(super) fn boot_vectors(&self) -> bool {
        self.sr() & (1 << 22) != 0
    }

    /// Mirror the hardware interrupt line into CAUSE bit 10
    pub(super) fn set_hardware_interrupt(&mut self, pending: bool) {
        if pending {
            self.regs[Self::CAUSE] |= 1 << 10;
        } else {
            self.regs[Self::CAUSE] &= !(1 << 10);
        }
    }

    /// IEc set and some pending cause bit unmasked by SR.IM
    pub(super) fn interrupt_active(&self) -> bool {
        let sr = self.sr();
        let pending = (self.regs[Self::CAUSE] >> 8) & (sr >> 8) & 0xFF;
        sr & 1 != 0 && pending != 0
    }

    /// Push the KU/IE mode stack and enter kernel mode with interrupts off
    pub(super) fn enter_exception(&mut self) {
        let sr = self.sr();
        let mode = sr & 0x3F;
        self.regs[Self::SR] = (sr & !0x3F) | ((mode << 2) & 0x3F);
    }

    /// Pop the KU/IE mode stack (RFE)
    ///
    /// The old pair (bits 5-4) is kept as is.
    pub(super) fn return_from_exception(&mut self) {
        let sr = self.sr();
        let mode = sr & 0x3F;
        self.regs[Self::SR] = (sr & !0x0F) | (mode >> 2);
    }
}

/// Exception cause codes for MIPS R3000A
///
/// These correspond to the exception codes stored in the CAUSE register
/// when a CPU exception occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ExceptionCause {
    /// Interrupt (external or internal)
    Interrupt = 0,
    /// Address error on load or instruction fetch
    AddressErrorLoad = 4,
    /// Address error on store
    AddressErrorStore = 5,
    /// Bus error on instruction fetch
    BusErrorInstruction = 6,
    /// Bus error on data access
    BusErrorData = 7,
    /// Syscall instruction executed
    Syscall = 8,
    /// Breakpoint instruction executed
    Breakpoint = 9,
    /// Reserved or illegal instruction
    ReservedInstruction = 10,
    /// Coprocessor unusable
    CoprocessorUnusable = 11,
    /// Arithmetic overflow
    ArithmeticOverflow = 12,
}
