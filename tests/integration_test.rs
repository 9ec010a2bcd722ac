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

//! Whole-system behavior through the public API

mod common;

use common::assertions::*;
use common::fixtures::*;
use common::programs;
use psx_engine::core::cdrom::SectorImage;
use psx_engine::core::config::EmulatorConfig;
use psx_engine::core::error::{EmulatorError, Result};
use psx_engine::core::scheduler::EventKind;
use psx_engine::core::snapshot::MachineSnapshot;
use psx_engine::core::system::System;

#[test]
fn test_basic_initialization() -> Result<()> {
    let system = System::new(&EmulatorConfig::default());
    assert_eq!(system.cycles(), 0);
    assert_cpu_pc(system.cpu(), 0xBFC0_0000);
    Ok(())
}

#[test]
fn test_arithmetic_program() -> Result<()> {
    let mut system = system_with_program(&programs::basic_arithmetic());
    system.run(4)?;

    assert_cpu_reg(system.cpu(), 1, 1);
    assert_cpu_reg(system.cpu(), 2, 2);
    assert_cpu_reg(system.cpu(), 3, 3);
    assert_cpu_pc(system.cpu(), 0xBFC0_0010);
    Ok(())
}

#[test]
fn test_load_store_program() -> Result<()> {
    let mut system = system_with_program(&programs::load_store());
    system.run(6)?;

    assert_memory_word(system.bus(), 0x1F80_0000, 0xAA);
    assert_cpu_reg(system.cpu(), 3, 0xAA);
    Ok(())
}

#[test]
fn test_branch_program() -> Result<()> {
    let mut system = system_with_program(&programs::branch());
    system.run(5)?;

    assert_cpu_reg(system.cpu(), 5, 7);
    assert_cpu_reg(system.cpu(), 3, 0);
    assert_cpu_reg(system.cpu(), 4, 0x99);
    Ok(())
}

#[test]
fn test_boot_from_config_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let bios = write_bios(dir.path(), &programs::basic_arithmetic());
    let disc = dir.path().join("disc.bin");
    std::fs::write(&disc, disc_image(4))?;

    let config_path = dir.path().join("psx.toml");
    std::fs::write(
        &config_path,
        format!(
            "bios = {:?}\ndisc = {:?}\n\n[timing]\nvblank_interval = 1000\n",
            bios, disc
        ),
    )?;

    let config = EmulatorConfig::load(&config_path)?;
    let mut system = System::boot(&config)?;
    assert!(system.cdrom().borrow().has_disc());

    system.run_until_cycle(2_500)?;
    assert_eq!(system.video().borrow().frame_count(), 2);
    assert_cpu_reg(system.cpu(), 3, 3);
    Ok(())
}

#[test]
fn test_boot_without_bios() {
    let config = EmulatorConfig {
        bios: "/nonexistent/SCPH1001.BIN".into(),
        ..EmulatorConfig::default()
    };
    assert!(matches!(
        System::boot(&config),
        Err(EmulatorError::BiosNotFound(_))
    ));
}

#[test]
fn test_disc_read_events_interleave_with_cpu() -> Result<()> {
    let mut config = EmulatorConfig::default();
    config.timing.cdrom_ack_delay = 100;
    config.timing.cdrom_sector_cycles = 1000;

    let mut system = System::new(&config);
    system.insert_disc_source(Box::new(SectorImage::from_bytes(disc_image(8))?));

    // ReadN through the register interface
    let bus = system.bus();
    bus.write8(0x1F80_1800, 0)?;
    bus.write8(0x1F80_1801, 0x06)?;

    let scheduler = system.shared_scheduler();
    let tick = scheduler
        .borrow()
        .next_event_of_kind(EventKind::CdromRead)
        .copied()
        .expect("read tick scheduled");
    assert!(tick.reschedule);
    assert_eq!(tick.interval, 1000);

    system.run_until_cycle(150)?;
    assert_eq!(system.cdrom().borrow().interrupt_flag(), 3);
    assert_eq!(system.instructions(), 151);
    Ok(())
}

#[test]
fn test_snapshot_dump() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut system = system_with_program(&programs::basic_arithmetic());
    system.run(3)?;

    let path = dir.path().join("state.json");
    system.snapshot().save_json(&path)?;

    let loaded = MachineSnapshot::load_json(&path)?;
    assert_eq!(loaded.regs[3], 3);
    assert_eq!(loaded.pc, 0xBFC0_000C);
    assert!(loaded.same_state(&system.snapshot()));
    Ok(())
}
