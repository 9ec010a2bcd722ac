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

//! Machine state snapshots
//!
//! A snapshot records the architectural state a regression test or a bug
//! report cares about: CPU registers, the COP0 exception registers, the
//! scheduler clock and the interrupt controller. It is not a save state;
//! device internals and memory are not captured.
//!
//! Two encodings:
//!
//! - JSON, human-readable, for golden files and `--dump-state`
//! - bincode, compact, through its serde compatibility layer
//!
//! Both carry [`SNAPSHOT_VERSION`]; decoding a different version fails.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{EmulatorError, Result};
use crate::core::scheduler::Clock;

/// Bumped whenever a field is added or changes meaning
pub const SNAPSHOT_VERSION: u32 = 1;

/// Architectural machine state at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub version: u32,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    pub pc: u32,
    pub next_pc: u32,

    /// General purpose registers r0-r31
    pub regs: [u32; 32],
    pub hi: u32,
    pub lo: u32,

    // COP0
    pub sr: u32,
    pub cause: u32,
    pub epc: u32,

    /// Scheduler clock
    pub clock: Clock,

    /// I_STAT
    pub irq_status: u32,
    /// I_MASK
    pub irq_mask: u32,
}

impl MachineSnapshot {
    /// Same machine state, ignoring when each snapshot was taken
    pub fn same_state(&self, other: &Self) -> bool {
        Self {
            taken_at: other.taken_at,
            ..self.clone()
        } == *other
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(text)?;
        snapshot.check_version()
    }

    /// Compact binary encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(
            self,
            bincode::config::standard(),
        )?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (snapshot, _): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        snapshot.check_version()
    }

    /// Write as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a JSON snapshot
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Write the binary encoding
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read the binary encoding
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }

    fn check_version(self) -> Result<Self> {
        if self.version != SNAPSHOT_VERSION {
            return Err(EmulatorError::Snapshot(format!(
                "incompatible snapshot version: expected {}, got {}",
                SNAPSHOT_VERSION, self.version
            )));
        }
        Ok(self)
    }
}
