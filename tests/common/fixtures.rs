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

//! Test fixtures for common test scenarios

use std::path::{Path, PathBuf};

use psx_engine::core::cdrom::build_sector;
use psx_engine::core::config::EmulatorConfig;
use psx_engine::core::memory::region::BIOS_SIZE;
use psx_engine::core::system::System;

/// 512KB BIOS image with `program` at the reset vector
pub fn bios_image(program: &[u32]) -> Vec<u8> {
    let mut image = vec![0; BIOS_SIZE];
    for (i, word) in program.iter().enumerate() {
        image[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
    image
}

/// Write a BIOS image for `program` into `dir`
pub fn write_bios(dir: &Path, program: &[u32]) -> PathBuf {
    let path = dir.join("bios.bin");
    std::fs::write(&path, bios_image(program)).expect("Failed to write BIOS image");
    path
}

/// Raw disc image; sector n carries payload bytes equal to n
pub fn disc_image(sectors: u32) -> Vec<u8> {
    (0..sectors)
        .flat_map(|lba| build_sector(lba, &[lba as u8; 2048]))
        .collect()
}

/// A system running `program` from the reset vector
pub fn system_with_program(program: &[u32]) -> System {
    let mut system = System::new(&EmulatorConfig::default());
    system
        .load_bios_bytes(bios_image(program))
        .expect("Failed to load BIOS image");
    system
}

/// Real BIOS path from `PSX_BIOS_PATH` (or `.env`), if the file exists
pub fn real_bios_path() -> Option<PathBuf> {
    let _ = dotenvy::dotenv();
    std::env::var("PSX_BIOS_PATH")
        .ok()
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("SCPH1001.BIN")))
        .filter(|path| path.exists())
}
