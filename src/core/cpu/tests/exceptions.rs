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

const SR: u32 = 12;
const CAUSE: u8 = 13;
const BADA: u8 = 8;

/// Program prologue: SR = value
fn set_sr(value: u32) -> Vec<u32> {
    let mut program = li(1, value).to_vec();
    program.push(mtc0(1, SR));
    program
}

#[test]
fn test_syscall_enters_handler() {
    let mut program = set_sr(0x0000_0003);
    program.push(SYSCALL);
    let mut rig = Rig::with_program(&program);

    rig.run(4);

    assert_eq!(rig.cause_code(), ExceptionCause::Syscall as u32);
    assert_eq!(rig.epc(), PROGRAM + 12);
    assert_eq!(rig.cpu.pc(), 0x80000080);
    assert_eq!(rig.cpu.next_pc(), 0x80000084);
    // KUc/IEc pushed into KUp/IEp, current pair cleared
    assert_eq!(rig.cpu.cop0_reg(12) & 0x3F, 0x0C);
    assert_eq!(rig.cpu.cop0_reg(CAUSE) & (1 << 31), 0);
}

#[test]
fn test_exception_vector_bev1() {
    let mut program = set_sr(1 << 22);
    program.push(SYSCALL);
    let mut rig = Rig::with_program(&program);

    rig.run(4);

    assert_eq!(rig.cpu.pc(), 0xBFC00180);
}

#[test]
fn test_break() {
    let mut rig = Rig::with_program(&[0x0000_000D]);
    rig.run(1);
    assert_eq!(rig.cause_code(), ExceptionCause::Breakpoint as u32);
    assert_eq!(rig.epc(), PROGRAM);
}

#[test]
fn test_exception_in_taken_branch_delay_slot() {
    let mut rig = Rig::with_program(&[beq(0, 0, 8), SYSCALL]);
    rig.run(2);

    assert_eq!(rig.epc(), PROGRAM);
    assert_ne!(rig.cpu.cop0_reg(CAUSE) & (1 << 31), 0);
    assert!(rig.cpu.in_delay_slot());
}

#[test]
fn test_exception_in_untaken_branch_delay_slot() {
    let mut rig = Rig::with_program(&[bne(0, 0, 8), SYSCALL]);
    rig.run(2);

    assert_eq!(rig.epc(), PROGRAM);
    assert_ne!(rig.cpu.cop0_reg(CAUSE) & (1 << 31), 0);
}

#[test]
fn test_handler_first_instruction_is_not_in_delay_slot() {
    let mut rig = Rig::with_program(&[beq(0, 0, 8), SYSCALL]);
    rig.load(0x80000080, &[0x0000_000D]);
    rig.run(3);

    // BREAK at the vector: EPC is the vector itself, BD clear
    assert_eq!(rig.epc(), 0x80000080);
    assert_eq!(rig.cpu.cop0_reg(CAUSE) & (1 << 31), 0);
}

#[test]
fn test_add_overflow_discards_result() {
    let mut program = li(1, 0x7FFF_FFFF).to_vec();
    program.push(addiu(2, 0, 1));
    program.push(addiu(3, 0, 99));
    program.push(add(3, 1, 2));
    let mut rig = Rig::with_program(&program);

    rig.run(5);

    assert_eq!(rig.cause_code(), ExceptionCause::ArithmeticOverflow as u32);
    assert_eq!(rig.cpu.reg(3), 99);
    assert_eq!(rig.epc(), PROGRAM + 16);
}

#[test]
fn test_addi_and_sub_overflow() {
    let mut program = li(1, 0x8000_0000).to_vec();
    program.push(addiu(2, 0, 1));
    program.push(special(0x22, 1, 2, 3, 0)); // sub r3, r1, r2
    let mut rig = Rig::with_program(&program);
    rig.run(4);
    assert_eq!(rig.cause_code(), ExceptionCause::ArithmeticOverflow as u32);
    assert_eq!(rig.cpu.reg(3), 0);

    let mut program = li(1, 0x7FFF_FFFF).to_vec();
    program.push(imm(0x08, 1, 3, 1)); // addi r3, r1, 1
    let mut rig = Rig::with_program(&program);
    rig.run(3);
    assert_eq!(rig.cause_code(), ExceptionCause::ArithmeticOverflow as u32);
}

#[test]
fn test_unsigned_add_never_traps() {
    let mut program = li(1, 0x7FFF_FFFF).to_vec();
    program.push(addiu(2, 0, 1));
    program.push(addu(3, 1, 2));
    program.push(addiu(4, 1, 1));
    let mut rig = Rig::with_program(&program);

    rig.run(5);

    assert_eq!(rig.cpu.reg(3), 0x8000_0000);
    assert_eq!(rig.cpu.reg(4), 0x8000_0000);
    assert_eq!(rig.cpu.pc(), PROGRAM + 20);
}

#[test]
fn test_misaligned_load() {
    let mut program = li(1, DATA + 2).to_vec();
    program.push(addiu(2, 0, 5));
    program.push(lw(2, 1, 0));
    program.push(NOP);
    let mut rig = Rig::with_program(&program);

    rig.run(4);

    assert_eq!(rig.cause_code(), ExceptionCause::AddressErrorLoad as u32);
    assert_eq!(rig.cpu.cop0_reg(BADA), DATA + 2);
    assert_eq!(rig.cpu.reg(2), 5);
}

#[test]
fn test_misaligned_store_touches_nothing() {
    let mut program = li(1, DATA + 1).to_vec();
    program.push(imm(0x29, 1, 0, 0)); // sh r0, 0(r1)
    let mut rig = Rig::with_program(&program);
    rig.load(DATA, &[0xFFFF_FFFF]);

    rig.run(3);

    assert_eq!(rig.cause_code(), ExceptionCause::AddressErrorStore as u32);
    assert_eq!(rig.cpu.cop0_reg(BADA), DATA + 1);
    assert_eq!(rig.read32(DATA), 0xFFFF_FFFF);
}

#[test]
fn test_misaligned_fetch_after_jump() {
    let mut program = li(1, PROGRAM + 0x102).to_vec();
    program.push(jr(1));
    program.push(NOP);
    let mut rig = Rig::with_program(&program);

    rig.run(5);

    assert_eq!(rig.cause_code(), ExceptionCause::AddressErrorLoad as u32);
    assert_eq!(rig.cpu.cop0_reg(BADA), PROGRAM + 0x102);
    assert_eq!(rig.epc(), PROGRAM + 0x102);
}

#[test]
fn test_reserved_instruction() {
    let mut rig = Rig::with_program(&[0xFC00_0000]);
    rig.run(1);
    assert_eq!(rig.cause_code(), ExceptionCause::ReservedInstruction as u32);
}

#[test]
fn test_cop1_unusable() {
    let mut rig = Rig::with_program(&[0x4400_0000]);
    rig.run(1);
    assert_eq!(rig.cause_code(), ExceptionCause::CoprocessorUnusable as u32);
    assert_eq!((rig.cpu.cop0_reg(CAUSE) >> 28) & 0x3, 1);
}

#[test]
fn test_lwc3_unusable() {
    let mut rig = Rig::with_program(&[0xCC00_0000]);
    rig.run(1);
    assert_eq!(rig.cause_code(), ExceptionCause::CoprocessorUnusable as u32);
    assert_eq!((rig.cpu.cop0_reg(CAUSE) >> 28) & 0x3, 3);
}

#[test]
fn test_interrupt_taken_before_fetch() {
    let program = set_sr(0x0000_0401);
    let mut rig = Rig::with_program(&program);
    rig.run(3);

    rig.cpu.step(&rig.bus, true).unwrap();

    assert_eq!(rig.cause_code(), ExceptionCause::Interrupt as u32);
    assert_ne!(rig.cpu.cop0_reg(CAUSE) & (1 << 10), 0);
    assert_eq!(rig.epc(), PROGRAM + 12);
    assert_eq!(rig.cpu.pc(), 0x80000080);
    // IEc cleared by the mode push, so the handler is not re-interrupted
    assert_eq!(rig.cpu.cop0_reg(12) & 1, 0);
}

#[test]
fn test_interrupt_masked_by_im() {
    let program = set_sr(0x0000_0001);
    let mut rig = Rig::with_program(&program);
    rig.run(3);

    rig.cpu.step(&rig.bus, true).unwrap();

    assert_eq!(rig.cpu.current_pc(), PROGRAM + 12);
    assert_eq!(rig.cpu.pc(), PROGRAM + 16);
    // The line is still visible in CAUSE
    assert_ne!(rig.cpu.cop0_reg(CAUSE) & (1 << 10), 0);
}

#[test]
fn test_interrupt_masked_by_iec() {
    let program = set_sr(0x0000_0400);
    let mut rig = Rig::with_program(&program);
    rig.run(3);

    rig.cpu.step(&rig.bus, true).unwrap();
    assert_eq!(rig.cpu.pc(), PROGRAM + 16);

    rig.cpu.step(&rig.bus, false).unwrap();
    assert_eq!(rig.cpu.cop0_reg(CAUSE) & (1 << 10), 0);
}

#[test]
fn test_software_interrupt() {
    let mut program = set_sr(0x0000_0101);
    program.push(addiu(2, 0, 0x100));
    program.push(mtc0(2, CAUSE as u32));
    let mut rig = Rig::with_program(&program);

    rig.run(6);

    assert_eq!(rig.cause_code(), ExceptionCause::Interrupt as u32);
    assert_eq!(rig.epc(), PROGRAM + 20);
}

#[test]
fn test_exception_commits_load_in_flight() {
    let mut program = li(1, DATA).to_vec();
    program.push(lw(2, 1, 0));
    program.push(SYSCALL);
    let mut rig = Rig::with_program(&program);
    rig.load(DATA, &[0x5555_AAAA]);

    rig.run(4);

    assert_eq!(rig.cause_code(), ExceptionCause::Syscall as u32);
    assert_eq!(rig.cpu.reg(2), 0x5555_AAAA);
}

#[test]
fn test_rfe_returns_to_previous_mode() {
    let mut program = set_sr(0x0000_0003);
    program.push(SYSCALL);
    let mut rig = Rig::with_program(&program);
    // Handler: jr k0 with rfe in the delay slot
    let mut handler = vec![mfc0(26, 14), NOP, addiu(26, 26, 4)];
    handler.push(jr(26));
    handler.push(RFE);
    rig.load(0x80000080, &handler);

    rig.run(4 + 5);

    assert_eq!(rig.cpu.cop0_reg(12) & 0x3F, 0x03);
    assert_eq!(rig.cpu.pc(), PROGRAM + 16);
}
