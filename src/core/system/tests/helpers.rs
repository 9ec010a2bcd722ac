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

use crate::core::config::EmulatorConfig;
use crate::core::memory::region::BIOS_SIZE;
use crate::core::system::System;

// Instruction encoders for hand-written BIOS programs

pub const NOP: u32 = 0;

pub fn lui(rt: u32, imm: u16) -> u32 {
    (0x0F << 26) | (rt << 16) | imm as u32
}

pub fn ori(rt: u32, rs: u32, imm: u16) -> u32 {
    (0x0D << 26) | (rs << 21) | (rt << 16) | imm as u32
}

pub fn addiu(rt: u32, rs: u32, imm: i16) -> u32 {
    (0x09 << 26) | (rs << 21) | (rt << 16) | imm as u16 as u32
}

pub fn sw(rt: u32, base: u32, offset: i16) -> u32 {
    (0x2B << 26) | (base << 21) | (rt << 16) | offset as u16 as u32
}

pub fn lw(rt: u32, base: u32, offset: i16) -> u32 {
    (0x23 << 26) | (base << 21) | (rt << 16) | offset as u16 as u32
}

pub fn beq(rs: u32, rt: u32, offset: i16) -> u32 {
    (0x04 << 26) | (rs << 21) | (rt << 16) | offset as u16 as u32
}

pub fn mtc0(rt: u32, rd: u32) -> u32 {
    (0x10 << 26) | (0x04 << 21) | (rt << 16) | (rd << 11)
}

/// A 512KB BIOS image with `program` at the reset vector
pub fn bios_image(program: &[u32]) -> Vec<u8> {
    let mut image = vec![0; BIOS_SIZE];
    for (i, word) in program.iter().enumerate() {
        image[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
    image
}

/// A system running `program` from the reset vector
pub fn system_with(config: &EmulatorConfig, program: &[u32]) -> System {
    let mut system = System::new(config);
    system.load_bios_bytes(bios_image(program)).unwrap();
    system
}

/// Step until `done` holds, failing after `limit` instructions
pub fn step_until<F>(system: &mut System, limit: usize, mut done: F)
where
    F: FnMut(&System) -> bool,
{
    for _ in 0..limit {
        if done(system) {
            return;
        }
        system.step().unwrap();
    }
    panic!("condition not reached within {} instructions", limit);
}

#[test]
fn test_bios_image_layout() {
    let image = bios_image(&[0x1234_5678, NOP, 0xAABB_CCDD]);
    assert_eq!(image.len(), BIOS_SIZE);
    assert_eq!(&image[0..4], &[0x78, 0x56, 0x34, 0x12]);
    assert_eq!(&image[8..12], &[0xDD, 0xCC, 0xBB, 0xAA]);
}
