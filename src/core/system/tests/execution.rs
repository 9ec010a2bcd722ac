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
use crate::core::config::EmulatorConfig;
use crate::core::error::EmulatorError;
use crate::core::interrupt::interrupts;
use crate::core::scheduler::EventKind;
use crate::core::system::System;

/// Config with a short frame so tests reach VBlank quickly
fn short_frame(vblank_interval: u64) -> EmulatorConfig {
    let mut config = EmulatorConfig::default();
    config.timing.vblank_interval = vblank_interval;
    config
}

#[test]
fn test_step_runs_one_instruction() {
    let mut system = System::default();

    assert_eq!(system.step().unwrap(), 1);
    assert_eq!(system.pc(), 0xBFC0_0004);
    assert_eq!(system.instructions(), 1);
    // The clock is the target of the CPU event just consumed
    assert_eq!(system.cycles(), 0);

    system.run(9).unwrap();
    assert_eq!(system.pc(), 0xBFC0_0028);
    assert_eq!(system.cycles(), 9);
}

#[test]
fn test_program_stores_to_ram() {
    let mut system = system_with(
        &EmulatorConfig::default(),
        &[lui(8, 0x8000), ori(9, 0, 0x1234), sw(9, 8, 0x100), lw(10, 8, 0x100)],
    );

    system.run(3).unwrap();
    assert_eq!(system.bus().read32(0x0000_0100).unwrap(), 0x1234);

    // Load delay: r10 lands one instruction later
    system.run(1).unwrap();
    assert_eq!(system.cpu().reg(10), 0);
    system.run(1).unwrap();
    assert_eq!(system.cpu().reg(10), 0x1234);
}

#[test]
fn test_cycles_per_instruction_scales_clock() {
    let mut config = EmulatorConfig::default();
    config.timing.cpu_cycles_per_instruction = 3;
    let mut system = System::new(&config);

    system.run(4).unwrap();
    assert_eq!(system.cycles(), 9);
    let scheduler = system.shared_scheduler();
    let next = scheduler.borrow().next_event_of_kind(EventKind::CpuClock).copied();
    assert_eq!(next.map(|e| e.target), Some(12));
}

#[test]
fn test_run_until_cycle() {
    let mut system = System::default();
    system.run_until_cycle(100).unwrap();

    assert_eq!(system.cycles(), 100);
    assert_eq!(system.instructions(), 101);
    assert_eq!(system.pc(), 0xBFC0_0000 + 101 * 4);

    // Nothing due: the clock stays put
    system.run_until_cycle(100).unwrap();
    assert_eq!(system.instructions(), 101);
}

#[test]
fn test_vblank_is_periodic() {
    let mut system = System::new(&short_frame(50));
    system.run_until_cycle(120).unwrap();

    assert_eq!(system.video().borrow().frame_count(), 2);
    assert_eq!(
        system.interrupts().borrow().read_status(),
        interrupts::VBLANK as u32
    );

    let scheduler = system.shared_scheduler();
    let vblank = scheduler.borrow().next_event_of_kind(EventKind::VBlank).copied();
    assert_eq!(vblank.map(|e| e.target), Some(150));
}

#[test]
fn test_vblank_interrupt_taken() {
    let program = [
        lui(8, 0x1F80),
        ori(9, 0, 0x0001),
        sw(9, 8, 0x1074), // I_MASK |= VBLANK
        ori(10, 0, 0x0401),
        mtc0(10, 12), // SR: IM2, IEc
        beq(0, 0, -1),
        NOP,
    ];
    let mut system = system_with(&short_frame(100), &program);

    system.run_until_cycle(99).unwrap();
    assert_eq!(system.cpu().sr(), 0x0401);
    assert!(system.pc() == 0xBFC0_0014 || system.pc() == 0xBFC0_0018);

    // VBlank fires first at clock 100, then the CPU takes the interrupt
    system.step().unwrap();
    assert_eq!(system.pc(), 0x8000_0080);
    assert_eq!(system.cpu().epc(), 0xBFC0_0014);

    let cause = system.cpu().cause();
    assert_eq!((cause >> 2) & 0x1F, 0);
    assert_ne!(cause & (1 << 10), 0);
    // Interrupts disabled on entry
    assert_eq!(system.cpu().sr() & 0x3F, 0x04);

    let snapshot = system.snapshot();
    assert_eq!(snapshot.irq_status, 1);
    assert_eq!(snapshot.irq_mask, 1);
    assert_eq!(snapshot.clock, 100);
}

#[test]
fn test_masked_vblank_not_taken() {
    let program = [ori(10, 0, 0x0401), mtc0(10, 12), beq(0, 0, -1), NOP];
    let mut system = system_with(&short_frame(20), &program);

    system.run_until_cycle(60).unwrap();
    assert_ne!(system.interrupts().borrow().read_status(), 0);
    assert!(system.pc() >= 0xBFC0_0008 && system.pc() <= 0xBFC0_000C);
}

#[test]
fn test_unmapped_load_is_host_error() {
    let mut system = system_with(&EmulatorConfig::default(), &[lui(8, 0x1FA0), lw(9, 8, 0)]);

    system.step().unwrap();
    let err = system.step().unwrap_err();
    assert!(matches!(
        err,
        EmulatorError::UnmappedAddress {
            address: 0x1FA0_0000,
            ..
        }
    ));

    // The CPU clock is re-armed so the caller may resume
    let scheduler = system.shared_scheduler();
    assert!(scheduler
        .borrow()
        .next_event_of_kind(EventKind::CpuClock)
        .is_some());
}

#[test]
fn test_empty_queue_stalls() {
    let mut system = System::default();
    system.shared_scheduler().borrow_mut().reset();

    assert!(matches!(system.step(), Err(EmulatorError::SchedulerStalled)));
    assert!(matches!(
        system.run_until_cycle(10),
        Err(EmulatorError::SchedulerStalled)
    ));
}
