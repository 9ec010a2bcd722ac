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

//! Disc image source
//!
//! The controller never parses image containers. It talks to a
//! [`DiscSource`], which hands out raw 2352-byte sectors addressed by LBA
//! (sector 0 is 00:02:00, after the two-second pregap).

use std::path::Path;

use crate::core::error::{CdRomError, Result};

/// Raw sector size: sync, header, subheader, user data and EDC/ECC
pub const SECTOR_SIZE: usize = 2352;

/// Sectors per second of disc time
pub const SECTORS_PER_SECOND: u32 = 75;

/// Pregap before LBA 0 (two seconds)
pub const PREGAP: u32 = 150;

/// Disc position in MSF (Minute:Second:Frame) format
///
/// All values are stored as decimal (not BCD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CDPosition {
    /// Minute (0-99)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
    /// Frame/Sector (0-74)
    pub sector: u8,
}

impl CDPosition {
    pub fn new(minute: u8, second: u8, sector: u8) -> Self {
        Self {
            minute,
            second,
            sector,
        }
    }

    /// Decode a BCD triple as sent with Setloc
    ///
    /// Returns `None` for malformed BCD or out-of-range seconds/frames.
    pub fn from_bcd(minute: u8, second: u8, sector: u8) -> Option<Self> {
        if !is_bcd(minute) || !is_bcd(second) || !is_bcd(sector) {
            return None;
        }
        let pos = Self::new(bcd_to_dec(minute), bcd_to_dec(second), bcd_to_dec(sector));
        (pos.second < 60 && pos.sector < 75).then_some(pos)
    }

    /// Encode as a BCD triple
    pub fn to_bcd(&self) -> [u8; 3] {
        [
            dec_to_bcd(self.minute),
            dec_to_bcd(self.second),
            dec_to_bcd(self.sector),
        ]
    }

    /// Absolute sector count including the pregap
    pub fn to_absolute(&self) -> u32 {
        (self.minute as u32 * 60 + self.second as u32) * SECTORS_PER_SECOND + self.sector as u32
    }

    /// Convert MSF to LBA
    ///
    /// Positions inside the pregap clamp to LBA 0.
    pub fn to_lba(&self) -> u32 {
        self.to_absolute().saturating_sub(PREGAP)
    }

    /// Convert an absolute sector count (pregap included) to MSF
    pub fn from_absolute(absolute: u32) -> Self {
        let frames = absolute % SECTORS_PER_SECOND;
        let seconds = absolute / SECTORS_PER_SECOND;
        Self::new((seconds / 60) as u8, (seconds % 60) as u8, frames as u8)
    }

    /// Convert LBA to MSF
    pub fn from_lba(lba: u32) -> Self {
        Self::from_absolute(lba + PREGAP)
    }
}

/// Supplier of raw sectors
///
/// Implemented by whatever reads disc images; the controller only seeks,
/// reads, and asks for the track layout.
pub trait DiscSource {
    /// Move the read head to `lba`
    fn seek(&mut self, lba: u32) -> std::result::Result<(), CdRomError>;

    /// Read the sector under the head and advance by one
    fn read_sector(&mut self) -> std::result::Result<Vec<u8>, CdRomError>;

    /// Number of the last track
    fn last_track(&self) -> u8;

    /// Start of `track`; track 0 is the lead-out (end of disc)
    fn track_start(&self, track: u8) -> std::result::Result<CDPosition, CdRomError>;

    /// Current subchannel Q block, when the image carries one
    fn subchannel_q(&self) -> Option<[u8; 10]> {
        None
    }
}

/// Single-track raw image held in memory
///
/// # Example
///
/// ```
/// use psx_engine::core::cdrom::{DiscSource, SectorImage, SECTOR_SIZE};
///
/// let mut image = SectorImage::from_bytes(vec![0; SECTOR_SIZE * 4]).unwrap();
/// assert_eq!(image.sector_count(), 4);
///
/// image.seek(3).unwrap();
/// assert_eq!(image.read_sector().unwrap().len(), SECTOR_SIZE);
/// assert!(image.read_sector().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SectorImage {
    data: Vec<u8>,
    head: u32,
}

impl SectorImage {
    /// Wrap raw image bytes
    ///
    /// # Errors
    ///
    /// `ImageSize` if the image is empty or not a whole number of sectors.
    pub fn from_bytes(data: Vec<u8>) -> std::result::Result<Self, CdRomError> {
        if data.is_empty() || data.len() % SECTOR_SIZE != 0 {
            return Err(CdRomError::ImageSize { len: data.len() });
        }
        Ok(Self { data, head: 0 })
    }

    /// Load a raw `.bin` image
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        let image = Self::from_bytes(data)?;
        log::info!(
            "Disc image {}: {} sectors",
            path.as_ref().display(),
            image.sector_count()
        );
        Ok(image)
    }

    pub fn sector_count(&self) -> u32 {
        (self.data.len() / SECTOR_SIZE) as u32
    }

    /// Current head position
    pub fn head(&self) -> u32 {
        self.head
    }
}

impl DiscSource for SectorImage {
    fn seek(&mut self, lba: u32) -> std::result::Result<(), CdRomError> {
        if lba >= self.sector_count() {
            return Err(CdRomError::InvalidSector { sector: lba });
        }
        self.head = lba;
        Ok(())
    }

    fn read_sector(&mut self) -> std::result::Result<Vec<u8>, CdRomError> {
        let lba = self.head;
        if lba >= self.sector_count() {
            return Err(CdRomError::InvalidSector { sector: lba });
        }
        let offset = lba as usize * SECTOR_SIZE;
        self.head += 1;
        Ok(self.data[offset..offset + SECTOR_SIZE].to_vec())
    }

    fn last_track(&self) -> u8 {
        1
    }

    fn track_start(&self, track: u8) -> std::result::Result<CDPosition, CdRomError> {
        match track {
            0 => Ok(CDPosition::from_lba(self.sector_count())),
            1 => Ok(CDPosition::from_lba(0)),
            _ => Err(CdRomError::InvalidTrack { track }),
        }
    }
}

/// Build a mode 2 form 1 sector: sync, BCD header, subheader and payload
///
/// EDC/ECC are left zero. Used to synthesize images for tests and tools.
pub fn build_sector(lba: u32, payload: &[u8]) -> Vec<u8> {
    let mut sector = vec![0u8; SECTOR_SIZE];
    sector[1..11].fill(0xFF);

    let [m, s, f] = CDPosition::from_lba(lba).to_bcd();
    sector[12..16].copy_from_slice(&[m, s, f, 2]);
    // Data submode in both subheader copies
    sector[18] = 0x08;
    sector[22] = 0x08;

    let len = payload.len().min(2048);
    sector[24..24 + len].copy_from_slice(&payload[..len]);
    sector
}

/// Convert BCD to decimal
///
/// Example: 0x23 (BCD) = 23 (decimal)
#[inline]
pub fn bcd_to_dec(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Convert decimal (0-99) to BCD
#[inline]
pub fn dec_to_bcd(dec: u8) -> u8 {
    ((dec / 10) << 4) | (dec % 10)
}

#[inline]
pub(super) fn is_bcd(value: u8) -> bool {
    value >> 4 <= 9 && value & 0x0F <= 9
}
