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

use super::helpers::*;
use crate::core::cpu::ExceptionCause;
use crate::core::gte::GTE;

const CU2: u32 = 1 << 30;

fn mtc2(rt: u32, rd: u32) -> u32 {
    0x4880_0000 | (rt << 16) | (rd << 11)
}

fn mfc2(rt: u32, rd: u32) -> u32 {
    0x4800_0000 | (rt << 16) | (rd << 11)
}

fn ctc2(rt: u32, rd: u32) -> u32 {
    0x48C0_0000 | (rt << 16) | (rd << 11)
}

fn cfc2(rt: u32, rd: u32) -> u32 {
    0x4840_0000 | (rt << 16) | (rd << 11)
}

/// NCLIP
const NCLIP: u32 = 0x4B40_0006;

fn cop2_rig(program: &[u32]) -> Rig {
    let mut rig = Rig::with_program(program);
    rig.cpu.set_cop0_reg(12, CU2);
    rig
}

#[test]
fn test_cop2_disabled_raises_unusable() {
    let mut rig = Rig::with_program(&[mtc2(1, 9)]);
    rig.run(1);

    assert_eq!(rig.cause_code(), ExceptionCause::CoprocessorUnusable as u32);
    assert_eq!((rig.cpu.cop0_reg(13) >> 28) & 0x3, 2);
}

#[test]
fn test_gte_command_disabled_leaves_gte_alone() {
    let mut rig = Rig::with_program(&[NCLIP]);
    rig.cpu.gte_mut().write_data(GTE::SXY0, 0);
    rig.cpu.gte_mut().write_data(GTE::SXY1, 10);
    rig.cpu.gte_mut().write_data(GTE::SXY2, 10 << 16);

    assert_eq!(rig.step(), 1);
    assert_eq!(rig.cpu.gte().read_data(GTE::MAC0), 0);
}

#[test]
fn test_mtc2_mfc2() {
    let mut rig = cop2_rig(&[
        addiu(1, 0, 0x123),
        mtc2(1, GTE::IR1 as u32),
        mfc2(2, GTE::IR1 as u32),
        addu(3, 2, 0),
        addu(4, 2, 0),
    ]);
    rig.run(5);

    assert_eq!(rig.cpu.gte().read_data(GTE::IR1), 0x123);
    assert_eq!(rig.cpu.reg(3), 0);
    assert_eq!(rig.cpu.reg(4), 0x123);
}

#[test]
fn test_ctc2_cfc2() {
    let mut rig = cop2_rig(&[
        ori(1, 0, 0xFFFF),
        ctc2(1, GTE::H as u32),
        cfc2(2, GTE::H as u32),
        NOP,
    ]);
    rig.run(4);

    // H reads back sign-extended
    assert_eq!(rig.cpu.reg(2), 0xFFFF_FFFF);
}

#[test]
fn test_lwc2_swc2() {
    let mut program = li(1, DATA).to_vec();
    program.push(imm(0x32, 1, GTE::VXY0 as u32, 0)); // lwc2 VXY0, 0(r1)
    program.push(imm(0x3A, 1, GTE::VXY0 as u32, 8)); // swc2 VXY0, 8(r1)
    let mut rig = cop2_rig(&program);
    rig.load(DATA, &[0x0020_0010]);

    rig.run(4);

    assert_eq!(rig.cpu.gte().read_data(GTE::VXY0), 0x0020_0010);
    assert_eq!(rig.read32(DATA + 8), 0x0020_0010);
}

#[test]
fn test_lwc2_misaligned() {
    let mut program = li(1, DATA + 2).to_vec();
    program.push(imm(0x32, 1, 0, 0));
    let mut rig = cop2_rig(&program);

    rig.run(3);

    assert_eq!(rig.cause_code(), ExceptionCause::AddressErrorLoad as u32);
}

#[test]
fn test_gte_command_adds_cycles() {
    let mut rig = cop2_rig(&[NCLIP, NOP]);
    rig.cpu.gte_mut().write_data(GTE::SXYP, 0);
    rig.cpu.gte_mut().write_data(GTE::SXYP, 10);
    rig.cpu.gte_mut().write_data(GTE::SXYP, (10 << 16) | 5);

    assert_eq!(rig.step(), 1 + 8);
    assert!(rig.cpu.gte().read_data(GTE::MAC0) > 0);

    assert_eq!(rig.step(), 1);
}

#[test]
fn test_unknown_gte_opcode_costs_nothing_extra() {
    let mut rig = cop2_rig(&[0x4A00_0000]);
    assert_eq!(rig.step(), 1);
}
