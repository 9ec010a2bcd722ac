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

//! GTE (Geometry Transformation Engine)
//!
//! Coprocessor 2: a fixed-point vector unit used for 3D transforms,
//! perspective projection and lighting. The CPU reaches it through
//! MFC2/MTC2/CFC2/CTC2/LWC2/SWC2 and issues commands with COP2.
//!
//! # Registers
//!
//! 32 data registers (vectors, screen/Z/color FIFOs, accumulators) and 32
//! control registers (matrices, translation vectors, projection setup and
//! FLAG). They live in one 64-word array; see `registers.rs` for the
//! per-index store rules.
//!
//! # Arithmetic
//!
//! MAC1-3 behave as 44-bit accumulators, MAC0 as 32-bit. Results are
//! saturated into IR0-3, the FIFOs and OTZ, and every saturation or
//! overflow sets its own FLAG bit. Bit 31 of FLAG summarizes the error bits.
//!
//! # Example
//!
//! ```
//! use psx_engine::core::gte::GTE;
//!
//! let mut gte = GTE::new();
//! gte.write_data(GTE::SXYP, 0);
//! gte.write_data(GTE::SXYP, 10);
//! gte.write_data(GTE::SXYP, (10 << 16) | 5);
//!
//! // NCLIP
//! let cycles = gte.execute(0x0140_0006);
//! assert_eq!(cycles, 8);
//! assert!(gte.read_data(GTE::MAC0) > 0);
//! ```

mod command;
mod math;
mod ops;
mod registers;

#[cfg(test)]
mod tests;

pub use command::{Command, MatrixSel, Opcode, TranslationSel};
pub use math::flag;

/// Geometry Transformation Engine
pub struct GTE {
    /// Data registers 0-31, control registers 32-63
    regs: [u32; 64],

    /// FLAG (control register 31)
    pub flags: u32,
}

impl GTE {
    /// Create a GTE with every register cleared
    pub fn new() -> Self {
        Self {
            regs: [0; 64],
            flags: 0,
        }
    }

    /// Execute a command word
    ///
    /// # Arguments
    ///
    /// * `command` - Low 25 bits of the COP2 instruction
    ///
    /// # Returns
    ///
    /// Cycle cost of the command (0 for unknown opcodes)
    pub fn execute(&mut self, command: u32) -> u32 {
        let cmd = Command::decode(command);
        let Some(opcode) = Opcode::from_bits(cmd.opcode) else {
            log::warn!(
                "GTE: command 0x{:02X} not implemented (word 0x{:07X})",
                cmd.opcode,
                command & 0x01FF_FFFF
            );
            return 0;
        };

        log::trace!("GTE: {:?} {:?}", opcode, cmd);
        self.flags = 0;

        match opcode {
            Opcode::Rtps => self.rtps(&cmd),
            Opcode::Rtpt => self.rtpt(&cmd),
            Opcode::Nclip => self.nclip(),
            Opcode::Op => self.op(&cmd),
            Opcode::Dpcs => self.dpcs(&cmd),
            Opcode::Dpct => self.dpct(&cmd),
            Opcode::Intpl => self.intpl(&cmd),
            Opcode::Mvmva => self.mvmva(&cmd),
            Opcode::Ncds => self.ncds(&cmd, 0),
            Opcode::Ncdt => self.ncdt(&cmd),
            Opcode::Cdp => self.cdp(&cmd),
            Opcode::Nccs => self.nccs(&cmd, 0),
            Opcode::Ncct => self.ncct(&cmd),
            Opcode::Cc => self.cc(&cmd),
            Opcode::Ncs => self.ncs(&cmd, 0),
            Opcode::Nct => self.nct(&cmd),
            Opcode::Sqr => self.sqr(&cmd),
            Opcode::Dcpl => self.dcpl(&cmd),
            Opcode::Avsz3 => self.avsz3(),
            Opcode::Avsz4 => self.avsz4(),
            Opcode::Gpf => self.gpf(&cmd),
            Opcode::Gpl => self.gpl(&cmd),
        }

        self.update_error_flag();
        opcode.cycles()
    }

    /// Clear every register
    pub fn reset(&mut self) {
        self.regs = [0; 64];
        self.flags = 0;
    }
}

impl Default for GTE {
    fn default() -> Self {
        Self::new()
    }
}
