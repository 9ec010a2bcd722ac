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

//! GTE command word decoding
//!
//! ```text
//! 31-25  Ignored (COP2 opcode in the CPU instruction)
//! 24-20  Ignored
//! 19     sf  Shift fraction (0 = no shift, 1 = shift right by 12)
//! 17-18  mx  Multiply matrix (0 rotation, 1 light, 2 light color, 3 reserved)
//! 15-16  v   Multiply vector (0 V0, 1 V1, 2 V2, 3 IR long vector)
//! 13-14  cv  Translation vector (0 TR, 1 BK, 2 FC, 3 none)
//! 10     lm  Saturate IR1-3 to 0..7FFF instead of -8000..7FFF
//! 0-5        Real opcode
//! ```

/// Matrix selected by `mx`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSel {
    Rotation,
    Light,
    LightColor,
    Reserved,
}

/// Translation vector selected by `cv`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationSel {
    Translation,
    Background,
    FarColor,
    None,
}

/// Decoded command word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub opcode: u32,
    pub sf: bool,
    pub mx: MatrixSel,
    /// Vector index (3 = IR1-3)
    pub v: usize,
    pub cv: TranslationSel,
    pub lm: bool,
}

impl Command {
    pub fn decode(word: u32) -> Self {
        Self {
            opcode: word & 0x3F,
            sf: word & (1 << 19) != 0,
            mx: match (word >> 17) & 3 {
                0 => MatrixSel::Rotation,
                1 => MatrixSel::Light,
                2 => MatrixSel::LightColor,
                _ => MatrixSel::Reserved,
            },
            v: ((word >> 15) & 3) as usize,
            cv: match (word >> 13) & 3 {
                0 => TranslationSel::Translation,
                1 => TranslationSel::Background,
                2 => TranslationSel::FarColor,
                _ => TranslationSel::None,
            },
            lm: word & (1 << 10) != 0,
        }
    }

    /// Right shift applied to MAC results
    #[inline(always)]
    pub fn shift(&self) -> u32 {
        if self.sf {
            12
        } else {
            0
        }
    }
}

/// Implemented operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Rtps,
    Nclip,
    Op,
    Dpcs,
    Intpl,
    Mvmva,
    Ncds,
    Cdp,
    Ncdt,
    Nccs,
    Cc,
    Ncs,
    Nct,
    Sqr,
    Dcpl,
    Dpct,
    Avsz3,
    Avsz4,
    Rtpt,
    Gpf,
    Gpl,
    Ncct,
}

impl Opcode {
    pub fn from_bits(opcode: u32) -> Option<Self> {
        Some(match opcode & 0x3F {
            0x01 => Opcode::Rtps,
            0x06 => Opcode::Nclip,
            0x0C => Opcode::Op,
            0x10 => Opcode::Dpcs,
            0x11 => Opcode::Intpl,
            0x12 => Opcode::Mvmva,
            0x13 => Opcode::Ncds,
            0x14 => Opcode::Cdp,
            0x16 => Opcode::Ncdt,
            0x1B => Opcode::Nccs,
            0x1C => Opcode::Cc,
            0x1E => Opcode::Ncs,
            0x20 => Opcode::Nct,
            0x28 => Opcode::Sqr,
            0x29 => Opcode::Dcpl,
            0x2A => Opcode::Dpct,
            0x2D => Opcode::Avsz3,
            0x2E => Opcode::Avsz4,
            0x30 => Opcode::Rtpt,
            0x3D => Opcode::Gpf,
            0x3E => Opcode::Gpl,
            0x3F => Opcode::Ncct,
            _ => return None,
        })
    }

    /// Cycles the command occupies the coprocessor
    pub fn cycles(self) -> u32 {
        match self {
            Opcode::Rtps => 15,
            Opcode::Nclip => 8,
            Opcode::Op => 6,
            Opcode::Dpcs => 8,
            Opcode::Intpl => 8,
            Opcode::Mvmva => 8,
            Opcode::Ncds => 19,
            Opcode::Cdp => 13,
            Opcode::Ncdt => 44,
            Opcode::Nccs => 17,
            Opcode::Cc => 11,
            Opcode::Ncs => 14,
            Opcode::Nct => 30,
            Opcode::Sqr => 5,
            Opcode::Dcpl => 8,
            Opcode::Dpct => 17,
            Opcode::Avsz3 => 5,
            Opcode::Avsz4 => 6,
            Opcode::Rtpt => 23,
            Opcode::Gpf => 5,
            Opcode::Gpl => 5,
            Opcode::Ncct => 39,
        }
    }
}
