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

//! GTE command implementations
//!
//! Notation follows the usual GTE documentation: `sf` selects a 12-bit
//! post-shift, `lm` clamps IR1-3 at zero, and every command pushes its
//! results through the saturating primitives in `math.rs`.

use super::command::{Command, MatrixSel, TranslationSel};
use super::math::flag;
use super::GTE;

impl GTE {
    /// RTPS: Rotate, Translate, Perspective transform (single)
    ///
    /// Operation:
    /// ```text
    /// [MAC1,MAC2,MAC3] = (TR * 0x1000 + RT * V0) SAR (sf*12)
    /// [IR1,IR2,IR3]    = [MAC1,MAC2,MAC3]
    /// SZ3              = MAC3 SAR ((1-sf)*12)
    /// SX2, SY2         = OF + IR1/IR2 * (H / SZ3)
    /// MAC0, IR0        = DQB + DQA * (H / SZ3)
    /// ```
    pub fn rtps(&mut self, cmd: &Command) {
        self.rtps_vertex(0, cmd, true);
    }

    /// RTPT: RTPS on V0, V1 and V2; depth cue only from the last vertex
    pub fn rtpt(&mut self, cmd: &Command) {
        self.rtps_vertex(0, cmd, false);
        self.rtps_vertex(1, cmd, false);
        self.rtps_vertex(2, cmd, true);
    }

    fn rtps_vertex(&mut self, n: usize, cmd: &Command, last: bool) {
        let shift = cmd.shift();
        let raw = self.accumulate(
            self.translation(TranslationSel::Translation),
            self.matrix(MatrixSel::Rotation),
            self.vector(n),
        );

        let mac1 = self.set_mac(1, raw[0], shift);
        let mac2 = self.set_mac(2, raw[1], shift);
        let mac3 = self.set_mac(3, raw[2], shift);
        self.set_ir(1, mac1, cmd.lm);
        self.set_ir(2, mac2, cmd.lm);

        // IR3 saturation is flagged from the 12-bit shifted value even when
        // sf is clear, while the stored IR3 comes from MAC3.
        let z = raw[2] >> 12;
        if !(-0x8000..=0x7FFF).contains(&z) {
            self.flags |= flag::IR3_SAT;
        }
        let min = if cmd.lm { 0 } else { -0x8000 };
        self.regs[Self::IR3] = mac3.clamp(min, 0x7FFF) as i32 as u32;

        self.push_sz(z);

        let ratio = self.divide() as i64;
        let x = ratio * self.ir(1) + self.control(Self::OFX);
        let y = ratio * self.ir(2) + self.control(Self::OFY);
        self.check_mac0(x);
        self.check_mac0(y);
        self.push_sxy(x >> 16, y >> 16);

        if last {
            let depth = ratio * self.control(Self::DQA) + self.control(Self::DQB);
            self.set_mac0(depth);
            self.set_ir0(depth >> 12);
        }
    }

    /// NCLIP: Normal clipping
    ///
    /// MAC0 = signed area of the SXY0/SXY1/SXY2 triangle (times two).
    /// Positive for clockwise winding in screen space.
    pub fn nclip(&mut self) {
        let (x0, y0) = self.sxy(0);
        let (x1, y1) = self.sxy(1);
        let (x2, y2) = self.sxy(2);
        self.set_mac0(x0 * y1 + x1 * y2 + x2 * y0 - x0 * y2 - x1 * y0 - x2 * y1);
    }

    /// OP: Outer product of IR1-3 and the rotation matrix diagonal
    pub fn op(&mut self, cmd: &Command) {
        let shift = cmd.shift();
        let rt = self.matrix(MatrixSel::Rotation);
        let (d1, d2, d3) = (rt[0][0], rt[1][1], rt[2][2]);
        let (ir1, ir2, ir3) = (self.ir(1), self.ir(2), self.ir(3));

        self.set_mac_ir(1, ir3 * d2 - ir2 * d3, shift, cmd.lm);
        self.set_mac_ir(2, ir1 * d3 - ir3 * d1, shift, cmd.lm);
        self.set_mac_ir(3, ir2 * d1 - ir1 * d2, shift, cmd.lm);
    }

    /// SQR: Square of IR1-3
    pub fn sqr(&mut self, cmd: &Command) {
        for lane in 1..=3 {
            let ir = self.ir(lane);
            self.set_mac_ir(lane, ir * ir, cmd.shift(), cmd.lm);
        }
    }

    /// MVMVA: Multiply vector by matrix and add vector
    ///
    /// With the far-color translation the hardware only keeps the last two
    /// matrix columns; the first column contributes flags but no value.
    pub fn mvmva(&mut self, cmd: &Command) {
        let shift = cmd.shift();
        let translation = self.translation(cmd.cv);
        let matrix = self.matrix(cmd.mx);
        let vector = self.vector(cmd.v);

        if cmd.cv != TranslationSel::FarColor {
            self.transform(translation, matrix, vector, shift, cmd.lm);
            return;
        }

        for lane in 0..3 {
            let partial = self.check_mac(lane + 1, translation[lane] << 12);
            let partial = self.check_mac(lane + 1, partial + matrix[lane][0] * vector[0]);
            self.set_ir(lane + 1, (partial >> shift) as i32 as i64, false);
        }
        self.transform([0; 3], zero_first_column(matrix), vector, shift, cmd.lm);
    }

    /// AVSZ3: OTZ = ZSF3 * (SZ1 + SZ2 + SZ3) / 0x1000
    pub fn avsz3(&mut self) {
        let sum = self.sz(1) + self.sz(2) + self.sz(3);
        let mac0 = self.control(Self::ZSF3) * sum;
        self.set_mac0(mac0);
        self.set_otz(mac0 >> 12);
    }

    /// AVSZ4: OTZ = ZSF4 * (SZ0 + SZ1 + SZ2 + SZ3) / 0x1000
    pub fn avsz4(&mut self) {
        let sum = self.sz(0) + self.sz(1) + self.sz(2) + self.sz(3);
        let mac0 = self.control(Self::ZSF4) * sum;
        self.set_mac0(mac0);
        self.set_otz(mac0 >> 12);
    }

    /// NCS: Normal color (single)
    pub fn ncs(&mut self, cmd: &Command, n: usize) {
        self.normal_light(n, cmd);
        self.push_color();
    }

    /// NCT: NCS on V0, V1 and V2
    pub fn nct(&mut self, cmd: &Command) {
        for n in 0..3 {
            self.ncs(cmd, n);
        }
    }

    /// NCCS: Normal color color (single)
    pub fn nccs(&mut self, cmd: &Command, n: usize) {
        self.normal_light(n, cmd);
        self.color_multiply(cmd);
    }

    /// NCCT: NCCS on V0, V1 and V2
    pub fn ncct(&mut self, cmd: &Command) {
        for n in 0..3 {
            self.nccs(cmd, n);
        }
    }

    /// NCDS: Normal color depth cue (single)
    pub fn ncds(&mut self, cmd: &Command, n: usize) {
        self.normal_light(n, cmd);
        let mac = self.color_scaled();
        self.depth_cue(mac, cmd);
    }

    /// NCDT: NCDS on V0, V1 and V2
    pub fn ncdt(&mut self, cmd: &Command) {
        for n in 0..3 {
            self.ncds(cmd, n);
        }
    }

    /// CC: Color color
    pub fn cc(&mut self, cmd: &Command) {
        self.background_light(cmd);
        self.color_multiply(cmd);
    }

    /// CDP: Color depth cue
    pub fn cdp(&mut self, cmd: &Command) {
        self.background_light(cmd);
        let mac = self.color_scaled();
        self.depth_cue(mac, cmd);
    }

    /// DCPL: Depth cue light color
    pub fn dcpl(&mut self, cmd: &Command) {
        let mac = self.color_scaled();
        self.depth_cue(mac, cmd);
    }

    /// DPCS: Depth cue RGBC toward the far color
    pub fn dpcs(&mut self, cmd: &Command) {
        let [r, g, b, _] = self.rgbc();
        self.depth_cue(
            [(r as i64) << 16, (g as i64) << 16, (b as i64) << 16],
            cmd,
        );
    }

    /// DPCT: DPCS three times on the head of the color FIFO
    pub fn dpct(&mut self, cmd: &Command) {
        for _ in 0..3 {
            let [r, g, b, _] = self.rgb0();
            self.depth_cue(
                [(r as i64) << 16, (g as i64) << 16, (b as i64) << 16],
                cmd,
            );
        }
    }

    /// INTPL: Interpolate IR1-3 toward the far color
    pub fn intpl(&mut self, cmd: &Command) {
        let mac = [self.ir(1) << 12, self.ir(2) << 12, self.ir(3) << 12];
        self.depth_cue(mac, cmd);
    }

    /// GPF: General purpose interpolation, MAC = IR0 * IR
    pub fn gpf(&mut self, cmd: &Command) {
        let ir0 = self.ir(0);
        for lane in 1..=3 {
            let ir = self.ir(lane);
            self.set_mac_ir(lane, ir0 * ir, cmd.shift(), cmd.lm);
        }
        self.push_color();
    }

    /// GPL: General purpose interpolation with base, MAC = MAC + IR0 * IR
    pub fn gpl(&mut self, cmd: &Command) {
        let shift = cmd.shift();
        let ir0 = self.ir(0);
        for lane in 1..=3 {
            let base = self.mac(lane) << shift;
            let ir = self.ir(lane);
            self.set_mac_ir(lane, base + ir0 * ir, shift, cmd.lm);
        }
        self.push_color();
    }

    // Lighting stages

    /// IR = LLM * Vn, then IR = BK + LCM * IR
    fn normal_light(&mut self, n: usize, cmd: &Command) {
        let llm = self.matrix(MatrixSel::Light);
        let v = self.vector(n);
        self.transform([0; 3], llm, v, cmd.shift(), cmd.lm);
        self.background_light(cmd);
    }

    /// IR = BK + LCM * IR
    fn background_light(&mut self, cmd: &Command) {
        let bk = self.translation(TranslationSel::Background);
        let lcm = self.matrix(MatrixSel::LightColor);
        let ir = self.vector(3);
        self.transform(bk, lcm, ir, cmd.shift(), cmd.lm);
    }

    /// (RGBC * 0x10) * IR, unshifted
    fn color_scaled(&self) -> [i64; 3] {
        let [r, g, b, _] = self.rgbc();
        [
            ((r as i64) << 4) * self.ir(1),
            ((g as i64) << 4) * self.ir(2),
            ((b as i64) << 4) * self.ir(3),
        ]
    }

    /// MAC = (RGBC * 0x10) * IR, then push the color FIFO
    fn color_multiply(&mut self, cmd: &Command) {
        let mac = self.color_scaled();
        for (lane, value) in mac.into_iter().enumerate() {
            self.set_mac_ir(lane + 1, value, cmd.shift(), cmd.lm);
        }
        self.push_color();
    }

    /// MAC = MAC + (FC - MAC) * IR0, then push the color FIFO
    fn depth_cue(&mut self, mac: [i64; 3], cmd: &Command) {
        let shift = cmd.shift();
        let fc = self.translation(TranslationSel::FarColor);

        for lane in 0..3 {
            let delta = self.set_mac(lane + 1, (fc[lane] << 12) - mac[lane], shift);
            self.set_ir(lane + 1, delta, false);
        }

        let ir0 = self.ir(0);
        for (lane, base) in mac.into_iter().enumerate() {
            let ir = self.ir(lane + 1);
            self.set_mac_ir(lane + 1, ir * ir0 + base, shift, cmd.lm);
        }
        self.push_color();
    }
}

fn zero_first_column(mut matrix: [[i64; 3]; 3]) -> [[i64; 3]; 3] {
    for row in matrix.iter_mut() {
        row[0] = 0;
    }
    matrix
}
