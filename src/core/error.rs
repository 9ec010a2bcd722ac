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

/// Emulator error types
///
/// Guest CPU faults (address errors, overflow, reserved instructions) are not
/// represented here: they are delivered to the guest exception handler.
/// Everything in this module is a host-visible condition that the caller of
/// the clock-step function gets to decide about.
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Unmapped address on bus '{bus}': {width}-bit access at 0x{address:08X}")]
    UnmappedAddress {
        bus: &'static str,
        address: u32,
        width: u8,
    },

    #[error("Unsupported DMA configuration: channel {channel} {direction}")]
    UnsupportedDma {
        channel: usize,
        direction: &'static str,
    },

    #[error("BIOS file not found: {0}")]
    BiosNotFound(String),

    #[error("Invalid BIOS size: {got} bytes (expected {expected})")]
    InvalidBiosSize { expected: usize, got: usize },

    #[error("Scheduler queue is empty")]
    SchedulerStalled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("CD-ROM error: {0}")]
    CdRom(#[from] CdRomError),
}

/// CD-ROM-specific error types
#[derive(Error, Debug)]
pub enum CdRomError {
    #[error("No disc inserted")]
    NoDisc,

    #[error("Invalid sector: {sector}")]
    InvalidSector { sector: u32 },

    #[error("Read error at sector {sector}: {reason}")]
    ReadError { sector: u32, reason: String },

    #[error("Invalid track: {track}")]
    InvalidTrack { track: u8 },

    #[error("Image size {len} is not a multiple of the raw sector size")]
    ImageSize { len: usize },
}

impl From<toml::de::Error> for EmulatorError {
    fn from(err: toml::de::Error) -> Self {
        EmulatorError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for EmulatorError {
    fn from(err: serde_json::Error) -> Self {
        EmulatorError::Snapshot(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for EmulatorError {
    fn from(err: bincode::error::EncodeError) -> Self {
        EmulatorError::Snapshot(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for EmulatorError {
    fn from(err: bincode::error::DecodeError) -> Self {
        EmulatorError::Snapshot(err.to_string())
    }
}
