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

//! Saturating fixed-point primitives shared by every GTE command

use super::GTE;

/// FLAG register bits
pub mod flag {
    pub const ERROR: u32 = 1 << 31;
    pub const MAC1_POS: u32 = 1 << 30;
    pub const MAC2_POS: u32 = 1 << 29;
    pub const MAC3_POS: u32 = 1 << 28;
    pub const MAC1_NEG: u32 = 1 << 27;
    pub const MAC2_NEG: u32 = 1 << 26;
    pub const MAC3_NEG: u32 = 1 << 25;
    pub const IR1_SAT: u32 = 1 << 24;
    pub const IR2_SAT: u32 = 1 << 23;
    pub const IR3_SAT: u32 = 1 << 22;
    pub const COLOR_R_SAT: u32 = 1 << 21;
    pub const COLOR_G_SAT: u32 = 1 << 20;
    pub const COLOR_B_SAT: u32 = 1 << 19;
    pub const SZ_OTZ_SAT: u32 = 1 << 18;
    pub const DIVIDE_OVERFLOW: u32 = 1 << 17;
    pub const MAC0_POS: u32 = 1 << 16;
    pub const MAC0_NEG: u32 = 1 << 15;
    pub const SX2_SAT: u32 = 1 << 14;
    pub const SY2_SAT: u32 = 1 << 13;
    pub const IR0_SAT: u32 = 1 << 12;

    /// Bits that feed the ERROR summary bit
    pub const ERROR_MASK: u32 = 0x7F87_E000;
}

/// Largest value a MAC1-3 accumulator holds (44-bit signed)
const MAC_MAX: i64 = (1 << 43) - 1;
const MAC_MIN: i64 = -(1 << 43);

/// Unsigned Newton-Raphson reciprocal seed table
pub(super) const UNR_TABLE: [u8; 0x101] = build_unr_table();

const fn build_unr_table() -> [u8; 0x101] {
    let mut table = [0u8; 0x101];
    let mut i = 0;
    while i < 0x101 {
        let v = (0x40000 / (i as i32 + 0x100) + 1) / 2 - 0x101;
        table[i] = if v < 0 { 0 } else { v as u8 };
        i += 1;
    }
    table
}

impl GTE {
    /// Record a 44-bit overflow for lane 1-3 and wrap the value to 44 bits
    #[inline(always)]
    pub(super) fn check_mac(&mut self, lane: usize, value: i64) -> i64 {
        if value > MAC_MAX {
            self.flags |= flag::MAC1_POS >> (lane - 1);
        } else if value < MAC_MIN {
            self.flags |= flag::MAC1_NEG >> (lane - 1);
        }
        (value << 20) >> 20
    }

    /// Store MAC1-3 from a 44-bit intermediate
    ///
    /// # Returns
    ///
    /// The shifted value as stored (truncated to 32 bits)
    pub(super) fn set_mac(&mut self, lane: usize, value: i64, shift: u32) -> i64 {
        let value = (self.check_mac(lane, value) >> shift) as i32;
        self.regs[Self::MAC0 + lane] = value as u32;
        value as i64
    }

    /// Saturate into IR1-3
    ///
    /// Range is -0x8000..0x7FFF, or 0..0x7FFF with `lm`.
    pub(super) fn set_ir(&mut self, lane: usize, value: i64, lm: bool) {
        let min = if lm { 0 } else { -0x8000 };
        let clamped = value.clamp(min, 0x7FFF);
        if clamped != value {
            self.flags |= flag::IR1_SAT >> (lane - 1);
        }
        self.regs[Self::IR0 + lane] = clamped as i32 as u32;
    }

    pub(super) fn set_mac_ir(&mut self, lane: usize, value: i64, shift: u32, lm: bool) -> i64 {
        let mac = self.set_mac(lane, value, shift);
        self.set_ir(lane, mac, lm);
        mac
    }

    /// Record a 32-bit overflow of a MAC0 intermediate
    #[inline(always)]
    pub(super) fn check_mac0(&mut self, value: i64) {
        if value > i32::MAX as i64 {
            self.flags |= flag::MAC0_POS;
        } else if value < i32::MIN as i64 {
            self.flags |= flag::MAC0_NEG;
        }
    }

    pub(super) fn set_mac0(&mut self, value: i64) {
        self.check_mac0(value);
        self.regs[Self::MAC0] = value as i32 as u32;
    }

    /// Saturate into IR0 (0..0x1000)
    pub(super) fn set_ir0(&mut self, value: i64) {
        let clamped = value.clamp(0, 0x1000);
        if clamped != value {
            self.flags |= flag::IR0_SAT;
        }
        self.regs[Self::IR0] = clamped as u32;
    }

    /// Saturate into OTZ (0..0xFFFF)
    pub(super) fn set_otz(&mut self, value: i64) {
        let clamped = value.clamp(0, 0xFFFF);
        if clamped != value {
            self.flags |= flag::SZ_OTZ_SAT;
        }
        self.regs[Self::OTZ] = clamped as u32;
    }

    /// Push the Z FIFO, saturating to 0..0xFFFF
    pub(super) fn push_sz(&mut self, value: i64) {
        let clamped = value.clamp(0, 0xFFFF);
        if clamped != value {
            self.flags |= flag::SZ_OTZ_SAT;
        }
        self.regs[Self::SZ0] = self.regs[Self::SZ1];
        self.regs[Self::SZ1] = self.regs[Self::SZ2];
        self.regs[Self::SZ2] = self.regs[Self::SZ3];
        self.regs[Self::SZ3] = clamped as u32;
    }

    /// Push the screen XY FIFO, saturating each axis to -0x400..0x3FF
    pub(super) fn push_sxy(&mut self, x: i64, y: i64) {
        let sx = x.clamp(-0x400, 0x3FF);
        if sx != x {
            self.flags |= flag::SX2_SAT;
        }
        let sy = y.clamp(-0x400, 0x3FF);
        if sy != y {
            self.flags |= flag::SY2_SAT;
        }
        self.regs[Self::SXY0] = self.regs[Self::SXY1];
        self.regs[Self::SXY1] = self.regs[Self::SXY2];
        self.regs[Self::SXY2] = (sx as u16 as u32) | ((sy as u16 as u32) << 16);
    }

    /// Push MAC1-3 / 16 into the color FIFO with the RGBC code byte
    pub(super) fn push_color(&mut self) {
        let mut rgb = [0u8; 4];
        for lane in 1..=3 {
            let value = self.mac(lane) >> 4;
            let clamped = value.clamp(0, 0xFF);
            if clamped != value {
                self.flags |= flag::COLOR_R_SAT >> (lane - 1);
            }
            rgb[lane - 1] = clamped as u8;
        }
        rgb[3] = self.rgbc()[3];

        self.regs[Self::RGB0] = self.regs[Self::RGB1];
        self.regs[Self::RGB1] = self.regs[Self::RGB2];
        self.regs[Self::RGB2] = u32::from_le_bytes(rgb);
    }

    /// Perspective divide: (H * 0x20000 / SZ3 + 1) / 2, saturated to 0x1FFFF
    pub(super) fn divide(&mut self) -> u32 {
        let h = self.h();
        let sz3 = self.sz(3) as u32;

        if h >= sz3 * 2 {
            self.flags |= flag::DIVIDE_OVERFLOW;
            return 0x1FFFF;
        }

        // Normalize so the divisor has bit 15 set
        let z = sz3.leading_zeros() - 16;
        let n = (h << z) as u64;
        let d = sz3 << z;

        let u = UNR_TABLE[((d - 0x7FC0) >> 7) as usize] as u32 + 0x101;
        let d = (0x0200_0080 - d * u) >> 8;
        let d = (0x0000_0080 + d * u) >> 8;

        (((n * d as u64) + 0x8000) >> 16).min(0x1FFFF) as u32
    }

    /// Matrix-vector multiply-accumulate into 44-bit lanes
    ///
    /// Each partial sum is checked, so an intermediate overflow is flagged
    /// even if the final sum fits.
    pub(super) fn accumulate(
        &mut self,
        translation: [i64; 3],
        matrix: [[i64; 3]; 3],
        vector: [i64; 3],
    ) -> [i64; 3] {
        let mut out = [0; 3];
        for (lane, row) in matrix.iter().enumerate() {
            let mut acc = self.check_mac(lane + 1, translation[lane] << 12);
            for (m, v) in row.iter().zip(vector.iter()) {
                acc = self.check_mac(lane + 1, acc + m * v);
            }
            out[lane] = acc;
        }
        out
    }

    /// `[MAC1-3] = (T * 0x1000 + M * V) >> shift`, then `[IR1-3] = MAC`
    pub(super) fn transform(
        &mut self,
        translation: [i64; 3],
        matrix: [[i64; 3]; 3],
        vector: [i64; 3],
        shift: u32,
        lm: bool,
    ) {
        let raw = self.accumulate(translation, matrix, vector);
        for (lane, value) in raw.into_iter().enumerate() {
            self.set_mac_ir(lane + 1, value, shift, lm);
        }
    }

    /// Recompute FLAG bit 31 from the error mask
    pub(super) fn update_error_flag(&mut self) {
        if self.flags & flag::ERROR_MASK != 0 {
            self.flags |= flag::ERROR;
        } else {
            self.flags &= !flag::ERROR;
        }
    }
}
