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

//! GTE register file
//!
//! 64 words: data registers 0-31 followed by control registers 32-63.
//! Values are normalized on store (sign or zero extension per register), so
//! the field accessors below read the flat array directly.

use super::command::{MatrixSel, TranslationSel};
use super::GTE;

/// Control registers start here in the flat array
const CTRL: usize = 32;

impl GTE {
    // Data registers (MFC2/MTC2/LWC2/SWC2)
    pub const VXY0: usize = 0;
    pub const VZ0: usize = 1;
    pub const VXY1: usize = 2;
    pub const VZ1: usize = 3;
    pub const VXY2: usize = 4;
    pub const VZ2: usize = 5;
    pub const RGBC: usize = 6;
    pub const OTZ: usize = 7;
    pub const IR0: usize = 8;
    pub const IR1: usize = 9;
    pub const IR2: usize = 10;
    pub const IR3: usize = 11;
    pub const SXY0: usize = 12;
    pub const SXY1: usize = 13;
    pub const SXY2: usize = 14;
    pub const SXYP: usize = 15;
    pub const SZ0: usize = 16;
    pub const SZ1: usize = 17;
    pub const SZ2: usize = 18;
    pub const SZ3: usize = 19;
    pub const RGB0: usize = 20;
    pub const RGB1: usize = 21;
    pub const RGB2: usize = 22;
    pub const RES1: usize = 23;
    pub const MAC0: usize = 24;
    pub const MAC1: usize = 25;
    pub const MAC2: usize = 26;
    pub const MAC3: usize = 27;
    pub const IRGB: usize = 28;
    pub const ORGB: usize = 29;
    pub const LZCS: usize = 30;
    pub const LZCR: usize = 31;

    // Control registers (CFC2/CTC2)
    pub const RT11_RT12: usize = 0;
    pub const RT13_RT21: usize = 1;
    pub const RT22_RT23: usize = 2;
    pub const RT31_RT32: usize = 3;
    pub const RT33: usize = 4;
    pub const TRX: usize = 5;
    pub const TRY: usize = 6;
    pub const TRZ: usize = 7;
    pub const L11_L12: usize = 8;
    pub const L13_L21: usize = 9;
    pub const L22_L23: usize = 10;
    pub const L31_L32: usize = 11;
    pub const L33: usize = 12;
    pub const RBK: usize = 13;
    pub const GBK: usize = 14;
    pub const BBK: usize = 15;
    pub const LR1_LR2: usize = 16;
    pub const LR3_LG1: usize = 17;
    pub const LG2_LG3: usize = 18;
    pub const LB1_LB2: usize = 19;
    pub const LB3: usize = 20;
    pub const RFC: usize = 21;
    pub const GFC: usize = 22;
    pub const BFC: usize = 23;
    pub const OFX: usize = 24;
    pub const OFY: usize = 25;
    pub const H: usize = 26;
    pub const DQA: usize = 27;
    pub const DQB: usize = 28;
    pub const ZSF3: usize = 29;
    pub const ZSF4: usize = 30;
    pub const FLAG: usize = 31;

    /// Read a data register
    ///
    /// # Arguments
    ///
    /// * `index` - Data register number (0-31)
    pub fn read_data(&self, index: usize) -> i32 {
        match index & 0x1F {
            Self::SXYP => self.regs[Self::SXY2] as i32,
            Self::IRGB | Self::ORGB => self.orgb() as i32,
            i => self.regs[i] as i32,
        }
    }

    /// Write a data register
    ///
    /// - VZn, IR0-3: sign-extended from 16 bits
    /// - OTZ, SZ0-3: zero-extended from 16 bits
    /// - SXYP: pushes the screen XY FIFO
    /// - IRGB: expands 5-5-5 color into IR1-3
    /// - LZCS: also sets LZCR
    /// - ORGB, LZCR: read-only
    pub fn write_data(&mut self, index: usize, value: i32) {
        let raw = value as u32;
        match index & 0x1F {
            i @ (Self::VZ0 | Self::VZ1 | Self::VZ2 | Self::IR0..=Self::IR3) => {
                self.regs[i] = sign_extend16(raw);
            }
            i @ (Self::OTZ | Self::SZ0..=Self::SZ3) => self.regs[i] = raw & 0xFFFF,
            Self::SXYP => {
                self.regs[Self::SXY0] = self.regs[Self::SXY1];
                self.regs[Self::SXY1] = self.regs[Self::SXY2];
                self.regs[Self::SXY2] = raw;
            }
            Self::IRGB => {
                self.regs[Self::IRGB] = raw & 0x7FFF;
                self.regs[Self::IR1] = (raw & 0x1F) << 7;
                self.regs[Self::IR2] = ((raw >> 5) & 0x1F) << 7;
                self.regs[Self::IR3] = ((raw >> 10) & 0x1F) << 7;
            }
            Self::ORGB | Self::LZCR => {
                log::trace!("GTE: ignoring write to read-only data register {}", index);
            }
            Self::LZCS => {
                self.regs[Self::LZCS] = raw;
                self.regs[Self::LZCR] = leading_sign_bits(raw);
            }
            i => self.regs[i] = raw,
        }
    }

    /// Read a control register
    ///
    /// H reads back sign-extended although it is an unsigned field.
    pub fn read_control(&self, index: usize) -> i32 {
        match index & 0x1F {
            Self::H => self.regs[CTRL + Self::H] as u16 as i16 as i32,
            Self::FLAG => self.flags as i32,
            i => self.regs[CTRL + i] as i32,
        }
    }

    /// Write a control register
    pub fn write_control(&mut self, index: usize, value: i32) {
        let raw = value as u32;
        match index & 0x1F {
            i @ (Self::RT33 | Self::L33 | Self::LB3 | Self::DQA | Self::ZSF3 | Self::ZSF4) => {
                self.regs[CTRL + i] = sign_extend16(raw);
            }
            Self::H => self.regs[CTRL + Self::H] = raw & 0xFFFF,
            Self::FLAG => {
                self.flags = raw & 0x7FFF_F000;
                self.update_error_flag();
            }
            i => self.regs[CTRL + i] = raw,
        }
    }

    /// IR1-3 packed as 5-5-5 color, each lane saturated to 0..0x1F
    pub(super) fn orgb(&self) -> u32 {
        let lane = |i: usize| ((self.ir(i) >> 7).clamp(0, 0x1F)) as u32;
        lane(1) | (lane(2) << 5) | (lane(3) << 10)
    }

    // Field accessors

    #[inline(always)]
    pub(super) fn ir(&self, i: usize) -> i64 {
        self.regs[Self::IR0 + i] as i32 as i64
    }

    #[inline(always)]
    pub(super) fn mac(&self, i: usize) -> i64 {
        self.regs[Self::MAC0 + i] as i32 as i64
    }

    /// Input vector Vn, or the IR1-3 long vector for n = 3
    pub(super) fn vector(&self, n: usize) -> [i64; 3] {
        if n == 3 {
            return [self.ir(1), self.ir(2), self.ir(3)];
        }
        let xy = self.regs[Self::VXY0 + n * 2];
        let z = self.regs[Self::VZ0 + n * 2];
        [
            xy as i16 as i64,
            (xy >> 16) as i16 as i64,
            z as i32 as i64,
        ]
    }

    /// Screen coordinates of FIFO slot n (0-2)
    pub(super) fn sxy(&self, n: usize) -> (i64, i64) {
        let v = self.regs[Self::SXY0 + n];
        (v as i16 as i64, (v >> 16) as i16 as i64)
    }

    /// Z FIFO slot n (0-3)
    #[inline(always)]
    pub(super) fn sz(&self, n: usize) -> i64 {
        self.regs[Self::SZ0 + n] as i64
    }

    /// Color bytes of RGBC: (r, g, b, code)
    pub(super) fn rgbc(&self) -> [u8; 4] {
        self.regs[Self::RGBC].to_le_bytes()
    }

    /// Oldest entry of the color FIFO
    pub(super) fn rgb0(&self) -> [u8; 4] {
        self.regs[Self::RGB0].to_le_bytes()
    }

    /// 3x3 matrix with 16-bit signed elements
    pub(super) fn matrix(&self, sel: MatrixSel) -> [[i64; 3]; 3] {
        let base = match sel {
            MatrixSel::Rotation | MatrixSel::Reserved => CTRL + Self::RT11_RT12,
            MatrixSel::Light => CTRL + Self::L11_L12,
            MatrixSel::LightColor => CTRL + Self::LR1_LR2,
        };
        let element = |k: usize| {
            let word = self.regs[base + k / 2];
            (if k % 2 == 0 { word } else { word >> 16 }) as i16 as i64
        };

        if sel == MatrixSel::Reserved {
            // Hardware garbage: built from RGBC red, IR0 and two rotation elements
            let r = self.rgbc()[0] as i64;
            let (rt13, rt22) = (element(2), element(4));
            return [
                [-(r << 4), r << 4, self.ir(0)],
                [rt13, rt13, rt13],
                [rt22, rt22, rt22],
            ];
        }

        [
            [element(0), element(1), element(2)],
            [element(3), element(4), element(5)],
            [element(6), element(7), element(8)],
        ]
    }

    /// Translation vector (32-bit signed lanes)
    pub(super) fn translation(&self, sel: TranslationSel) -> [i64; 3] {
        let base = match sel {
            TranslationSel::Translation => CTRL + Self::TRX,
            TranslationSel::Background => CTRL + Self::RBK,
            TranslationSel::FarColor => CTRL + Self::RFC,
            TranslationSel::None => return [0; 3],
        };
        [
            self.regs[base] as i32 as i64,
            self.regs[base + 1] as i32 as i64,
            self.regs[base + 2] as i32 as i64,
        ]
    }

    /// Control register as a signed value
    #[inline(always)]
    pub(super) fn control(&self, index: usize) -> i64 {
        self.regs[CTRL + index] as i32 as i64
    }

    /// Projection plane distance (unsigned)
    #[inline(always)]
    pub(super) fn h(&self) -> u32 {
        self.regs[CTRL + Self::H] & 0xFFFF
    }
}

#[inline(always)]
fn sign_extend16(value: u32) -> u32 {
    value as u16 as i16 as i32 as u32
}

/// Count of leading bits equal to the sign bit
fn leading_sign_bits(value: u32) -> u32 {
    if value as i32 >= 0 {
        value.leading_zeros()
    } else {
        value.leading_ones()
    }
}
