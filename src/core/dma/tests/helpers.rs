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

//! Test harness for DMA tests: a RAM-backed DMA bus with recording ports

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::super::*;
use crate::core::memory::{Ram, DMA_BUS};
use crate::core::scheduler::Scheduler;

/// A peripheral FIFO on the DMA bus
pub struct Port {
    addr: u32,
    pub received: Vec<u32>,
    pub supply: VecDeque<u32>,
}

impl Port {
    pub fn new(addr: u32) -> Self {
        Self {
            addr,
            received: Vec::new(),
            supply: VecDeque::new(),
        }
    }
}

impl Device for Port {
    fn name(&self) -> &str {
        "Port"
    }

    fn ranges(&self, bus: BusName) -> Vec<BusRange> {
        match bus {
            DMA_BUS => vec![BusRange::new(self.addr, 4, 0x3)],
            _ => Vec::new(),
        }
    }

    fn read32(&mut self, _addr: u32) -> Result<u32> {
        Ok(self.supply.pop_front().unwrap_or(0))
    }

    fn write32(&mut self, _addr: u32, value: u32) -> Result<()> {
        self.received.push(value);
        Ok(())
    }
}

pub struct Harness {
    pub dma: DMA,
    pub ram: Rc<RefCell<Ram>>,
    pub gpu: Rc<RefCell<Port>>,
    pub cdrom: Rc<RefCell<Port>>,
    pub interrupts: Rc<RefCell<InterruptController>>,
}

impl Harness {
    /// DMA with RAM, a GPU port and a CD-ROM port; MDEC, SPU and PIO absent
    pub fn new() -> Self {
        let scheduler = Scheduler::shared();
        let interrupts = Rc::new(RefCell::new(InterruptController::new(scheduler)));
        let ram = Rc::new(RefCell::new(Ram::main()));
        let gpu = Rc::new(RefCell::new(Port::new(region::GPU_GP0)));
        let cdrom = Rc::new(RefCell::new(Port::new(region::CDROM_START + 2)));

        let mut bus = Bus::new(DMA_BUS);
        bus.attach(ram.clone());
        bus.attach(gpu.clone());
        bus.attach(cdrom.clone());

        Self {
            dma: DMA::new(bus, interrupts.clone()),
            ram,
            gpu,
            cdrom,
            interrupts,
        }
    }

    pub fn poke(&self, addr: u32, value: u32) {
        self.ram.borrow_mut().write32(addr, value).unwrap();
    }

    pub fn peek(&self, addr: u32) -> u32 {
        self.ram.borrow_mut().read32(addr).unwrap()
    }
}

#[test]
fn test_harness_ram_is_shared_with_dma_bus() {
    let h = Harness::new();
    h.poke(0x1000, 0x1234_5678);
    assert_eq!(h.peek(0x1000), 0x1234_5678);
    assert_eq!(h.ram.borrow().data()[0x1000], 0x78);
}
