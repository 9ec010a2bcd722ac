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

//! Test rig: a controller wired to a scheduler and interrupt controller,
//! with a small event loop standing in for the system

use std::cell::RefCell;
use std::rc::Rc;

use super::super::*;
use crate::core::error::Result;
use crate::core::scheduler::{
    pop_and_execute, Event, EventContext, HandlerTable, Scheduler, SharedScheduler,
};

pub struct Rig {
    pub scheduler: SharedScheduler,
    pub interrupts: Rc<RefCell<InterruptController>>,
    pub cdrom: CDROM,
    handlers: HandlerTable<Rig>,
}

impl EventContext for Rig {
    fn scheduler(&self) -> &SharedScheduler {
        &self.scheduler
    }

    fn handlers(&self) -> &HandlerTable<Self> {
        &self.handlers
    }
}

fn on_response(rig: &mut Rig, event: &Event) -> Result<()> {
    rig.cdrom.deliver_response(event.target);
    Ok(())
}

fn on_read(rig: &mut Rig, _event: &Event) -> Result<()> {
    rig.cdrom.read_tick();
    Ok(())
}

fn on_interrupt(rig: &mut Rig, event: &Event) -> Result<()> {
    rig.interrupts.borrow_mut().deliver_due(event.target);
    Ok(())
}

/// Image of `sectors` sectors whose payload bytes all equal the low byte
/// of their LBA
pub fn image(sectors: u32) -> SectorImage {
    let mut data = Vec::new();
    for lba in 0..sectors {
        data.extend(build_sector(lba, &[lba as u8; 2048]));
    }
    SectorImage::from_bytes(data).unwrap()
}

impl Rig {
    pub fn new() -> Self {
        let scheduler = Scheduler::shared();
        let interrupts = Rc::new(RefCell::new(InterruptController::new(scheduler.clone())));
        let cdrom = CDROM::new(scheduler.clone(), interrupts.clone());
        let mut handlers = HandlerTable::new();
        handlers.register(EventKind::CdromResponse, on_response);
        handlers.register(EventKind::CdromRead, on_read);
        handlers.register(EventKind::Interrupt, on_interrupt);
        Self {
            scheduler,
            interrupts,
            cdrom,
            handlers,
        }
    }

    pub fn with_disc(sectors: u32) -> Self {
        let mut rig = Self::new();
        rig.cdrom.insert_disc(Box::new(image(sectors)));
        rig
    }

    /// Push parameters and write the command register
    pub fn command(&mut self, command: u8, params: &[u8]) {
        for &p in params {
            self.cdrom.push_param(p);
        }
        self.cdrom.write_command(command);
    }

    /// Pop one event and run what the system would run for it
    pub fn dispatch(&mut self) -> Option<Event> {
        pop_and_execute(self).unwrap()
    }

    /// Run events until a response lands in IF
    ///
    /// Returns the delivered class, or `None` if the queue drained first.
    pub fn next_response(&mut self) -> Option<u8> {
        for _ in 0..10_000 {
            self.dispatch()?;
            if self.cdrom.interrupt_flag() != 0 {
                return Some(self.cdrom.interrupt_flag());
            }
        }
        None
    }

    /// Drain the response FIFO through the status bits
    pub fn take_response(&mut self) -> Vec<u8> {
        let mut bytes = Vec::new();
        while self.cdrom.read_status() & (1 << 5) != 0 {
            bytes.push(self.cdrom.pop_response());
        }
        bytes
    }

    /// Wait for the next response, read it and acknowledge it
    pub fn expect(&mut self, class: u8) -> Vec<u8> {
        assert_eq!(self.next_response(), Some(class));
        let bytes = self.take_response();
        self.cdrom.acknowledge(0x1F);
        bytes
    }

    pub fn now(&self) -> Clock {
        self.scheduler.borrow().now()
    }
}

#[test]
fn test_image_helper_payload() {
    let mut img = image(3);
    img.seek(2).unwrap();
    let sector = img.read_sector().unwrap();
    assert_eq!(sector[24], 2);
    assert_eq!(&sector[12..16], &[0x00, 0x02, 0x02, 0x02]);
}
