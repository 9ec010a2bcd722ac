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

//! Store-then-load through the bus returns the stored value at every width

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use super::super::*;

fn ram_bus() -> Bus {
    let mut bus = Bus::new(CPU_BUS);
    bus.attach(Rc::new(RefCell::new(Ram::main())));
    bus
}

proptest! {
    #[test]
    fn prop_word_round_trip(offset in 0u32..0x80_0000, seg in 0usize..3, value: u32) {
        let bus = ram_bus();
        let addr = region::SEGMENTS[seg] | (offset & !0x3);
        bus.write32(addr, value).unwrap();
        prop_assert_eq!(bus.read32(addr).unwrap(), value);
    }

    #[test]
    fn prop_half_round_trip(offset in 0u32..0x80_0000, value: u16) {
        let bus = ram_bus();
        let addr = offset & !0x1;
        bus.write16(addr, value).unwrap();
        prop_assert_eq!(bus.read16(addr).unwrap(), value);
        // Little-endian: low byte first
        prop_assert_eq!(bus.read8(addr).unwrap(), value as u8);
    }

    #[test]
    fn prop_byte_round_trip(offset in 0u32..0x80_0000, value: u8) {
        let bus = ram_bus();
        bus.write8(offset, value).unwrap();
        prop_assert_eq!(bus.read8(offset).unwrap(), value);
    }

    #[test]
    fn prop_word_is_little_endian(offset in 0u32..0x20_0000, value: u32) {
        let bus = ram_bus();
        let addr = offset & !0x3;
        bus.write32(addr, value).unwrap();
        for i in 0..4 {
            prop_assert_eq!(bus.read8(addr + i).unwrap(), (value >> (i * 8)) as u8);
        }
    }
}
