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

//! System integration
//!
//! [`System`] owns every component and the two buses, and drives them from
//! the global scheduler. Nothing advances time except popping an event:
//!
//! | Event           | Handler                                  |
//! |-----------------|------------------------------------------|
//! | `Interrupt`     | deliver delayed interrupt requests       |
//! | `CdromResponse` | deliver the oldest due disc response     |
//! | `CdromRead`     | read the next sector (periodic)          |
//! | `VBlank`        | end the frame, raise VBLANK (periodic)   |
//! | `CpuClock`      | execute one instruction, re-arm itself   |
//!
//! # Wiring
//!
//! The `cpu` bus sees RAM, scratchpad, BIOS, the memory and cache control
//! registers, the interrupt controller, DMA, CD-ROM and the display port,
//! with open-bus catch-alls attached last. The `dma` bus sees RAM and the
//! two DMA peripherals (display port, CD-ROM data FIFO).
//!
//! # Example
//!
//! ```
//! use psx_engine::core::config::EmulatorConfig;
//! use psx_engine::core::system::System;
//!
//! let mut system = System::new(&EmulatorConfig::default());
//! assert_eq!(system.pc(), 0xBFC0_0000);
//!
//! // A zero-filled BIOS is a stream of NOPs
//! system.run(10).unwrap();
//! assert_eq!(system.pc(), 0xBFC0_0028);
//! ```

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use chrono::Utc;

use super::cdrom::{DiscSource, SectorImage, CDROM};
use super::config::{EmulatorConfig, TimingConfig};
use super::cpu::CPU;
use super::dma::DMA;
use super::error::{EmulatorError, Result};
use super::interrupt::{interrupts, InterruptController};
use super::memory::{
    region, Bus, BusRange, Line, OpenBus, Ram, RegisterFile, Rom, CPU_BUS, DMA_BUS,
};
use super::scheduler::{
    pop_and_execute, Clock, Event, EventContext, EventKind, HandlerTable, Scheduler,
    SharedScheduler,
};
use super::snapshot::{MachineSnapshot, SNAPSHOT_VERSION};
use super::video::VideoPort;

#[cfg(test)]
mod tests;

/// The whole machine
pub struct System {
    cpu: CPU,

    /// CPU-visible bus
    bus: Bus,
    /// Peripheral side of the DMA engine
    dma_bus: Bus,

    scheduler: SharedScheduler,
    handlers: HandlerTable<System>,

    ram: Rc<RefCell<Ram>>,
    bios: Rc<RefCell<Rom>>,
    interrupts: Rc<RefCell<InterruptController>>,
    dma: Rc<RefCell<DMA>>,
    cdrom: Rc<RefCell<CDROM>>,
    video: Rc<RefCell<VideoPort>>,

    timing: TimingConfig,

    /// Instructions executed since reset
    instructions: u64,

    /// Cost of the most recent instruction, before the timing multiplier
    last_cycles: u32,
}

impl System {
    /// Build and wire every component, then reset
    ///
    /// The BIOS ROM starts zero-filled; see [`System::load_bios`].
    pub fn new(config: &EmulatorConfig) -> Self {
        let scheduler = Scheduler::shared();
        let interrupts = Rc::new(RefCell::new(InterruptController::new(scheduler.clone())));

        let ram = Rc::new(RefCell::new(Ram::main()));
        let bios = Rc::new(RefCell::new(Rom::new()));
        let video = Rc::new(RefCell::new(VideoPort::new()));

        let cdrom = Rc::new(RefCell::new(CDROM::new(
            scheduler.clone(),
            interrupts.clone(),
        )));
        cdrom
            .borrow_mut()
            .set_timing(config.timing.cdrom_ack_delay, config.timing.cdrom_sector_cycles);

        let mut dma_bus = Bus::new(DMA_BUS);
        dma_bus.attach(ram.clone());
        dma_bus.attach(video.clone());
        dma_bus.attach(cdrom.clone());

        let dma = Rc::new(RefCell::new(DMA::new(dma_bus.clone(), interrupts.clone())));
        dma.borrow_mut()
            .set_irq_delay_per_word(config.timing.dma_irq_delay_per_word);

        let mut bus = Bus::new(CPU_BUS);
        bus.attach(ram.clone());
        bus.attach(Rc::new(RefCell::new(Ram::scratchpad())));
        bus.attach(bios.clone());
        bus.attach(Rc::new(RefCell::new(RegisterFile::new(
            "Memory Control",
            region::mirrored(region::MEM_CONTROL, 0x24, 0x3F),
            9,
        ))));
        bus.attach(Rc::new(RefCell::new(RegisterFile::new(
            "RAM Size",
            region::mirrored(region::RAM_SIZE_REG, 4, 0x3),
            1,
        ))));
        bus.attach(Rc::new(RefCell::new(RegisterFile::new(
            "Cache Control",
            vec![BusRange::new(region::CACHE_CONTROL, 4, 0x3)],
            1,
        ))));
        bus.attach(interrupts.clone());
        bus.attach(dma.clone());
        bus.attach(cdrom.clone());
        bus.attach(video.clone());
        bus.attach(Rc::new(RefCell::new(OpenBus::io_ports())));
        bus.attach(Rc::new(RefCell::new(OpenBus::expansion1())));

        let mut handlers = HandlerTable::new();
        handlers.register(EventKind::Interrupt, Self::on_interrupt);
        handlers.register(EventKind::CdromResponse, Self::on_cdrom_response);
        handlers.register(EventKind::CdromRead, Self::on_cdrom_read);
        handlers.register(EventKind::VBlank, Self::on_vblank);
        handlers.register(EventKind::CpuClock, Self::on_cpu_clock);

        log::info!(
            "System: {} CPU bus devices, {} DMA bus devices",
            bus.device_count(),
            dma_bus.device_count()
        );

        let mut system = Self {
            cpu: CPU::new(),
            bus,
            dma_bus,
            scheduler,
            handlers,
            ram,
            bios,
            interrupts,
            dma,
            cdrom,
            video,
            timing: config.timing,
            instructions: 0,
            last_cycles: 0,
        };
        system.reset();
        system
    }

    /// Build a system and load the BIOS and disc named by `config`
    pub fn boot(config: &EmulatorConfig) -> Result<Self> {
        let mut system = Self::new(config);
        system.load_bios(&config.bios)?;
        if let Some(disc) = &config.disc {
            system.insert_disc(disc)?;
        }
        Ok(system)
    }

    /// Load a 512KB BIOS image
    ///
    /// # Errors
    ///
    /// `BiosNotFound` or `InvalidBiosSize`; the current ROM is kept.
    pub fn load_bios<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let rom = Rom::from_file(path)?;
        self.bios.borrow_mut().replace(rom);
        Ok(())
    }

    /// Load a BIOS image from memory
    pub fn load_bios_bytes(&mut self, data: Vec<u8>) -> Result<()> {
        let rom = Rom::from_bytes(data)?;
        self.bios.borrow_mut().replace(rom);
        log::info!("BIOS loaded ({} bytes)", region::BIOS_SIZE);
        Ok(())
    }

    /// Insert a raw 2352-byte-sector disc image from a file
    pub fn insert_disc<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let image = SectorImage::from_file(path)?;
        self.insert_disc_source(Box::new(image));
        Ok(())
    }

    /// Insert any disc source
    pub fn insert_disc_source(&mut self, disc: Box<dyn DiscSource>) {
        self.cdrom.borrow_mut().insert_disc(disc);
    }

    /// Power-cycle
    ///
    /// Drops every pending event, pulses the reset line on the CPU bus and
    /// restarts the CPU at the reset vector. BIOS, RAM and the inserted
    /// disc are kept.
    pub fn reset(&mut self) {
        self.scheduler.borrow_mut().reset();
        self.bus.broadcast(Line::Reset, true);
        self.bus.broadcast(Line::Reset, false);
        self.cpu.reset();
        self.instructions = 0;
        self.last_cycles = 0;

        let mut scheduler = self.scheduler.borrow_mut();
        scheduler.schedule_event(Event::once(EventKind::CpuClock, 0, 0, 0));
        scheduler.schedule_periodic(EventKind::VBlank, self.timing.vblank_interval, 0);
        log::info!("System: reset");
    }

    /// Run events until one CPU instruction has executed
    ///
    /// # Returns
    ///
    /// Cycle cost of that instruction
    ///
    /// # Errors
    ///
    /// Any host-visible fault raised by a handler. The machine stays
    /// consistent and can be stepped again.
    pub fn step(&mut self) -> Result<u32> {
        loop {
            match pop_and_execute(self)? {
                Some(event) if event.kind == EventKind::CpuClock => {
                    return Ok(self.last_cycles);
                }
                Some(_) => {}
                None => return Err(EmulatorError::SchedulerStalled),
            }
        }
    }

    /// Execute `instructions` CPU instructions
    pub fn run(&mut self, instructions: u64) -> Result<()> {
        for _ in 0..instructions {
            self.step()?;
        }
        Ok(())
    }

    /// Run every event due at or before `target`
    ///
    /// The clock ends at the target of the last event consumed, which may
    /// be earlier than `target`.
    pub fn run_until_cycle(&mut self, target: Clock) -> Result<()> {
        loop {
            let next = self.scheduler.borrow().peek().map(|event| event.target);
            match next {
                Some(clock) if clock <= target => {
                    pop_and_execute(self)?;
                }
                Some(_) => return Ok(()),
                None => return Err(EmulatorError::SchedulerStalled),
            }
        }
    }

    /// Capture the architectural state
    pub fn snapshot(&self) -> MachineSnapshot {
        let irq = self.interrupts.borrow();
        MachineSnapshot {
            version: SNAPSHOT_VERSION,
            taken_at: Utc::now(),
            pc: self.cpu.pc(),
            next_pc: self.cpu.next_pc(),
            regs: *self.cpu.regs(),
            hi: self.cpu.hi(),
            lo: self.cpu.lo(),
            sr: self.cpu.sr(),
            cause: self.cpu.cause(),
            epc: self.cpu.epc(),
            clock: self.cycles(),
            irq_status: irq.read_status(),
            irq_mask: irq.read_mask(),
        }
    }

    // Event handlers

    fn on_interrupt(system: &mut Self, event: &Event) -> Result<()> {
        system.interrupts.borrow_mut().deliver_due(event.target);
        Ok(())
    }

    fn on_cdrom_response(system: &mut Self, event: &Event) -> Result<()> {
        system.cdrom.borrow_mut().deliver_response(event.target);
        Ok(())
    }

    fn on_cdrom_read(system: &mut Self, _event: &Event) -> Result<()> {
        system.cdrom.borrow_mut().read_tick();
        Ok(())
    }

    fn on_vblank(system: &mut Self, _event: &Event) -> Result<()> {
        system.video.borrow_mut().vblank();
        system
            .interrupts
            .borrow_mut()
            .request_interrupt(interrupts::VBLANK, false, true, 0);
        Ok(())
    }

    fn on_cpu_clock(system: &mut Self, _event: &Event) -> Result<()> {
        let irq = system.interrupts.borrow().is_pending();
        let result = system.cpu.step(&system.bus, irq);

        // Re-arm even on a fault so the caller can resume
        let cycles = result.as_ref().copied().unwrap_or(1);
        system.scheduler.borrow_mut().schedule_in(
            EventKind::CpuClock,
            cycles as Clock * system.timing.cpu_cycles_per_instruction,
            0,
        );

        system.last_cycles = cycles;
        system.instructions += 1;
        result.map(|_| ())
    }

    // Accessors

    /// Address of the next instruction to execute
    pub fn pc(&self) -> u32 {
        self.cpu.pc()
    }

    /// Global clock
    pub fn cycles(&self) -> Clock {
        self.scheduler.borrow().now()
    }

    /// Instructions executed since reset
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CPU {
        &mut self.cpu
    }

    /// CPU-visible bus
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn dma_bus(&self) -> &Bus {
        &self.dma_bus
    }

    pub fn shared_scheduler(&self) -> SharedScheduler {
        Rc::clone(&self.scheduler)
    }

    pub fn ram(&self) -> Rc<RefCell<Ram>> {
        Rc::clone(&self.ram)
    }

    pub fn bios(&self) -> Rc<RefCell<Rom>> {
        Rc::clone(&self.bios)
    }

    pub fn interrupts(&self) -> Rc<RefCell<InterruptController>> {
        Rc::clone(&self.interrupts)
    }

    pub fn dma(&self) -> Rc<RefCell<DMA>> {
        Rc::clone(&self.dma)
    }

    pub fn cdrom(&self) -> Rc<RefCell<CDROM>> {
        Rc::clone(&self.cdrom)
    }

    pub fn video(&self) -> Rc<RefCell<VideoPort>> {
        Rc::clone(&self.video)
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new(&EmulatorConfig::default())
    }
}

impl EventContext for System {
    fn scheduler(&self) -> &SharedScheduler {
        &self.scheduler
    }

    fn handlers(&self) -> &HandlerTable<Self> {
        &self.handlers
    }
}
