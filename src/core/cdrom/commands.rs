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

//! CD-ROM command dispatch
//!
//! Each command validates its parameter count, updates drive state and
//! queues its responses. Responses are built when queued, so the status
//! byte reflects the drive state at that moment.

use super::disc::is_bcd;
use super::{int, CDPosition, DriveStatus, Mode, CDROM};
use crate::core::scheduler::Clock;

/// Error codes sent as the second byte of an INT5 response
pub(super) const ERR_SEEK_FAILED: u8 = 0x04;
pub(super) const ERR_INVALID_ARGUMENT: u8 = 0x10;
pub(super) const ERR_WRONG_PARAM_COUNT: u8 = 0x20;
pub(super) const ERR_INVALID_COMMAND: u8 = 0x40;
pub(super) const ERR_NOT_READY: u8 = 0x80;

/// Completion latency of simple two-response commands
const COMPLETE_DELAY: Clock = 0x4A00;

/// Seek completion latency
const SEEK_DELAY: Clock = 100_000;

/// Table of contents read latency
const READ_TOC_DELAY: Clock = 1_000_000;

/// Controller version reported by Test(0x20): 1994-09-19, version C0
const VERSION: [u8; 4] = [0x94, 0x09, 0x19, 0xC0];

/// Command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Getstat = 0x01,
    Setloc = 0x02,
    Play = 0x03,
    ReadN = 0x06,
    MotorOn = 0x07,
    Stop = 0x08,
    Pause = 0x09,
    Init = 0x0A,
    Mute = 0x0B,
    Demute = 0x0C,
    Setfilter = 0x0D,
    Setmode = 0x0E,
    Getparam = 0x0F,
    GetlocL = 0x10,
    GetlocP = 0x11,
    GetTN = 0x13,
    GetTD = 0x14,
    SeekL = 0x15,
    SeekP = 0x16,
    Test = 0x19,
    GetID = 0x1A,
    ReadS = 0x1B,
    ReadTOC = 0x1E,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        use Command::*;
        Some(match byte {
            0x01 => Getstat,
            0x02 => Setloc,
            0x03 => Play,
            0x06 => ReadN,
            0x07 => MotorOn,
            0x08 => Stop,
            0x09 => Pause,
            0x0A => Init,
            0x0B => Mute,
            0x0C => Demute,
            0x0D => Setfilter,
            0x0E => Setmode,
            0x0F => Getparam,
            0x10 => GetlocL,
            0x11 => GetlocP,
            0x13 => GetTN,
            0x14 => GetTD,
            0x15 => SeekL,
            0x16 => SeekP,
            0x19 => Test,
            0x1A => GetID,
            0x1B => ReadS,
            0x1E => ReadTOC,
            _ => return None,
        })
    }

    /// Accepted parameter counts
    pub fn param_counts(self) -> std::ops::RangeInclusive<usize> {
        match self {
            Command::Setloc => 3..=3,
            Command::Play => 0..=1,
            Command::Setfilter => 2..=2,
            Command::Setmode | Command::GetTD | Command::Test => 1..=1,
            _ => 0..=0,
        }
    }

    /// Commands that need a disc in the drive
    fn needs_disc(self) -> bool {
        matches!(
            self,
            Command::Play
                | Command::ReadN
                | Command::ReadS
                | Command::SeekL
                | Command::SeekP
                | Command::ReadTOC
                | Command::GetTN
                | Command::GetTD
        )
    }
}

impl CDROM {
    /// Execute a command with its parameters
    pub(super) fn execute_command(&mut self, byte: u8, params: &[u8]) {
        let Some(command) = Command::from_byte(byte) else {
            log::warn!("CD-ROM: unhandled command 0x{:02X}", byte);
            self.error(byte, ERR_INVALID_COMMAND);
            return;
        };

        if !command.param_counts().contains(&params.len()) {
            log::warn!(
                "CD-ROM: {:?} with {} parameters",
                command,
                params.len()
            );
            self.error(byte, ERR_WRONG_PARAM_COUNT);
            return;
        }

        if command.needs_disc() && self.disc.is_none() {
            self.error(byte, ERR_NOT_READY);
            return;
        }

        match command {
            Command::Getstat => self.cmd_getstat(),
            Command::Setloc => self.cmd_setloc(params),
            Command::Play => self.cmd_play(params),
            Command::ReadN | Command::ReadS => self.cmd_read(command),
            Command::MotorOn => self.cmd_motor_on(),
            Command::Stop => self.cmd_stop(),
            Command::Pause => self.cmd_pause(),
            Command::Init => self.cmd_init(),
            Command::Mute | Command::Demute => {
                self.muted = command == Command::Mute;
                self.ack(byte);
            }
            Command::Setfilter => {
                self.filter = (params[0], params[1]);
                self.ack(byte);
            }
            Command::Setmode => {
                let mode = Mode::from_bits_retain(params[0]);
                let speed_changed = (self.mode ^ mode).contains(Mode::DOUBLE_SPEED);
                self.mode = mode;
                log::debug!("CD-ROM: mode {:?}", self.mode);
                if speed_changed {
                    self.rearm_reading();
                }
                self.ack(byte);
            }
            Command::Getparam => {
                let bytes = vec![
                    self.stat(),
                    self.mode.bits(),
                    0,
                    self.filter.0,
                    self.filter.1,
                ];
                self.first(byte, int::ACKNOWLEDGE, bytes);
            }
            Command::GetlocL => self.cmd_getloc_l(),
            Command::GetlocP => self.cmd_getloc_p(),
            Command::GetTN => self.cmd_get_tn(),
            Command::GetTD => self.cmd_get_td(params[0]),
            Command::SeekL | Command::SeekP => self.cmd_seek(command),
            Command::Test => self.cmd_test(params[0]),
            Command::GetID => self.cmd_get_id(),
            Command::ReadTOC => {
                self.ack(byte);
                self.complete(byte, READ_TOC_DELAY);
            }
        }
    }

    /// INT3 with the status byte
    fn ack(&mut self, command: u8) {
        let stat = self.stat();
        self.first(command, int::ACKNOWLEDGE, vec![stat]);
    }

    /// First response of a command, after the acknowledge delay
    fn first(&mut self, command: u8, class: u8, bytes: Vec<u8>) {
        let delay = self.ack_delay;
        self.respond(command, class, bytes, delay, true);
    }

    /// INT2 with the status byte, `extra` cycles after the acknowledge
    fn complete(&mut self, command: u8, extra: Clock) {
        let stat = self.stat();
        let delay = self.ack_delay + extra;
        self.respond(command, int::COMPLETE, vec![stat], delay, false);
    }

    /// INT5 with the error bit set in the status byte
    fn error(&mut self, command: u8, code: u8) {
        let stat = self.stat() | DriveStatus::ERROR.bits();
        self.first(command, int::ERROR, vec![stat, code]);
    }

    fn cmd_getstat(&mut self) {
        self.ack(Command::Getstat as u8);
        // The shell-open latch clears once reported with the lid closed
        if self.disc.is_some() {
            self.status.remove(DriveStatus::SHELL_OPEN);
        }
    }

    fn cmd_setloc(&mut self, params: &[u8]) {
        match CDPosition::from_bcd(params[0], params[1], params[2]) {
            Some(pos) => {
                self.seek_target = Some(pos.to_lba());
                log::debug!(
                    "CD-ROM: Setloc {:02}:{:02}:{:02} (LBA {})",
                    pos.minute,
                    pos.second,
                    pos.sector,
                    pos.to_lba()
                );
                self.ack(Command::Setloc as u8);
            }
            None => self.error(Command::Setloc as u8, ERR_INVALID_ARGUMENT),
        }
    }

    fn cmd_play(&mut self, params: &[u8]) {
        let byte = Command::Play as u8;
        if let Some(&track) = params.first().filter(|&&t| t != 0) {
            let start = self
                .disc
                .as_ref()
                .map(|disc| disc.track_start(super::bcd_to_dec(track)));
            match start {
                Some(Ok(pos)) => self.seek_target = Some(pos.to_lba()),
                _ => {
                    self.error(byte, ERR_INVALID_ARGUMENT);
                    return;
                }
            }
        }

        self.stop_reading();
        if let Some(target) = self.seek_target.take() {
            self.position = target;
        }
        self.status
            .insert(DriveStatus::PLAYING | DriveStatus::MOTOR_ON);
        self.ack(byte);
    }

    fn cmd_read(&mut self, command: Command) {
        self.start_reading();
        self.ack(command as u8);
    }

    fn cmd_motor_on(&mut self) {
        self.status.insert(DriveStatus::MOTOR_ON);
        self.ack(Command::MotorOn as u8);
        self.complete(Command::MotorOn as u8, COMPLETE_DELAY);
    }

    fn cmd_stop(&mut self) {
        let byte = Command::Stop as u8;
        self.ack(byte);
        self.stop_reading();
        self.status.remove(DriveStatus::MOTOR_ON);
        self.complete(byte, COMPLETE_DELAY);
    }

    fn cmd_pause(&mut self) {
        let byte = Command::Pause as u8;
        let extra = if self.status.contains(DriveStatus::READING) {
            self.read_interval()
        } else {
            COMPLETE_DELAY
        };
        self.ack(byte);
        self.stop_reading();
        self.complete(byte, extra);
    }

    fn cmd_init(&mut self) {
        let byte = Command::Init as u8;
        // Aborts whatever was in flight
        self.pending.clear();
        self.stop_reading();
        self.mode = Mode::WHOLE_SECTOR;
        self.status.insert(DriveStatus::MOTOR_ON);
        self.ack(byte);
        self.complete(byte, COMPLETE_DELAY);
    }

    fn cmd_getloc_l(&mut self) {
        let byte = Command::GetlocL as u8;
        match self.sector.get(12..20) {
            Some(header) => {
                let bytes = header.to_vec();
                self.first(byte, int::ACKNOWLEDGE, bytes);
            }
            None => self.error(byte, ERR_NOT_READY),
        }
    }

    fn cmd_getloc_p(&mut self) {
        let q = self.disc.as_ref().and_then(|disc| disc.subchannel_q());
        let bytes = match q {
            Some(q) => q[..8].to_vec(),
            None => {
                let lba = self.position.saturating_sub(1);
                let relative = CDPosition::from_absolute(lba).to_bcd();
                let absolute = CDPosition::from_lba(lba).to_bcd();
                let mut bytes = vec![0x01, 0x01];
                bytes.extend_from_slice(&relative);
                bytes.extend_from_slice(&absolute);
                bytes
            }
        };
        self.first(Command::GetlocP as u8, int::ACKNOWLEDGE, bytes);
    }

    fn cmd_get_tn(&mut self) {
        let last = self.disc.as_ref().map_or(1, |disc| disc.last_track());
        let bytes = vec![self.stat(), 0x01, super::dec_to_bcd(last)];
        self.first(Command::GetTN as u8, int::ACKNOWLEDGE, bytes);
    }

    fn cmd_get_td(&mut self, track: u8) {
        let byte = Command::GetTD as u8;
        let start = Some(track)
            .filter(|&t| is_bcd(t))
            .and_then(|_| self.disc.as_ref())
            .map(|disc| disc.track_start(super::bcd_to_dec(track)));

        match start {
            Some(Ok(pos)) => {
                let [m, s, _] = pos.to_bcd();
                let bytes = vec![self.stat(), m, s];
                self.first(byte, int::ACKNOWLEDGE, bytes);
            }
            Some(Err(err)) => {
                log::debug!("CD-ROM: GetTD: {}", err);
                self.error(byte, ERR_INVALID_ARGUMENT);
            }
            None => self.error(byte, ERR_INVALID_ARGUMENT),
        }
    }

    fn cmd_seek(&mut self, command: Command) {
        let byte = command as u8;
        self.stop_reading();

        let target = self.seek_target.take().unwrap_or(self.position);
        let result = match self.disc.as_mut() {
            Some(disc) => disc.seek(target),
            None => Ok(()),
        };

        if let Err(err) = result {
            log::warn!("CD-ROM: {:?} failed: {}", command, err);
            self.status.insert(DriveStatus::SEEK_ERROR);
            self.error(byte, ERR_SEEK_FAILED);
            self.status.remove(DriveStatus::SEEK_ERROR);
            return;
        }

        self.position = target;
        self.status
            .insert(DriveStatus::SEEKING | DriveStatus::MOTOR_ON);
        self.ack(byte);

        // Completion reports the head settled
        let stat = (self.status - DriveStatus::SEEKING).bits();
        let delay = self.ack_delay + SEEK_DELAY;
        self.respond(byte, int::COMPLETE, vec![stat], delay, false);
    }

    fn cmd_test(&mut self, sub: u8) {
        let byte = Command::Test as u8;
        match sub {
            0x20 => self.first(byte, int::ACKNOWLEDGE, VERSION.to_vec()),
            _ => {
                log::warn!("CD-ROM: Test sub-function 0x{:02X} not supported", sub);
                self.error(byte, ERR_INVALID_ARGUMENT);
            }
        }
    }

    fn cmd_get_id(&mut self) {
        let byte = Command::GetID as u8;
        self.ack(byte);

        let delay = self.ack_delay + COMPLETE_DELAY;
        if self.disc.is_some() {
            // Licensed data disc, region string "SCEA"
            let bytes = vec![0x02, 0x00, 0x20, 0x00, b'S', b'C', b'E', b'A'];
            self.respond(byte, int::COMPLETE, bytes, delay, false);
        } else {
            let bytes = vec![0x08, 0x40, 0, 0, 0, 0, 0, 0];
            self.respond(byte, int::ERROR, bytes, delay, false);
        }
    }
}
