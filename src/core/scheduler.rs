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

//! Global event scheduler
//!
//! A single time-ordered queue drives every component. Events carry an
//! absolute target clock; popping one advances the global clock to that
//! target and runs every handler registered for the event's kind.
//!
//! # Architecture
//!
//! The clock is not wall time and is not advanced by anything but a pop: it
//! is the target of the most recently consumed event. The CPU itself is an
//! event kind ([`EventKind::CpuClock`]), so instruction execution, disc
//! latency, delayed interrupts and the video clock are all interleaved by
//! the same ordering rule:
//!
//! - earlier `target` first
//! - equal `target`: lower [`EventKind`] first
//! - equal `(target, kind)`: insertion order
//!
//! Handlers live in a [`HandlerTable`] owned by the context type (normally
//! the [`System`](crate::core::system::System)), separate from the queue,
//! so a handler can borrow the context mutably and schedule new events.
//!
//! # Example
//!
//! ```
//! use psx_engine::core::scheduler::{EventKind, Scheduler};
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.schedule_in(EventKind::CdromResponse, 1000, 0);
//! scheduler.schedule_in(EventKind::Interrupt, 500, 4);
//!
//! let first = scheduler.pop().unwrap();
//! assert_eq!(first.kind, EventKind::Interrupt);
//! assert_eq!(scheduler.now(), 500);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::core::error::Result;

/// Absolute time in CPU cycles since reset
pub type Clock = u64;

/// Event kinds, in tie-break precedence order
///
/// At equal target clock a lower variant fires first. The CPU clock is
/// last so an instruction observes everything that became due with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// Delayed interrupt request delivery
    Interrupt = 0,
    /// CD-ROM response delivery
    CdromResponse = 1,
    /// CD-ROM sector read tick
    CdromRead = 2,
    /// Vertical blank
    VBlank = 3,
    /// Execute one CPU instruction
    CpuClock = 4,
}

impl EventKind {
    /// Number of kinds
    pub const COUNT: usize = 5;

    /// Every kind, in precedence order
    pub const ALL: [EventKind; Self::COUNT] = [
        EventKind::Interrupt,
        EventKind::CdromResponse,
        EventKind::CdromRead,
        EventKind::VBlank,
        EventKind::CpuClock,
    ];

    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }
}

/// Scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Event kind (selects handlers)
    pub kind: EventKind,
    /// Clock at which the event was scheduled
    pub start: Clock,
    /// Clock at which the event fires
    pub target: Clock,
    /// Re-insert after firing
    pub reschedule: bool,
    /// Period for rescheduled events
    pub interval: Clock,
    /// Opaque handler data
    pub payload: u32,
}

impl Event {
    /// One-shot event
    pub fn once(kind: EventKind, start: Clock, target: Clock, payload: u32) -> Self {
        Self {
            kind,
            start,
            target,
            reschedule: false,
            interval: 0,
            payload,
        }
    }

    /// Periodic event whose first firing is one interval after `start`
    pub fn periodic(kind: EventKind, start: Clock, interval: Clock, payload: u32) -> Self {
        Self {
            kind,
            start,
            target: start + interval,
            reschedule: true,
            interval,
            payload,
        }
    }

    /// The copy inserted after a periodic event fires
    ///
    /// New start is the old target; new target is one interval later.
    pub fn next_period(&self) -> Self {
        Self {
            start: self.target,
            target: self.target + self.interval,
            ..*self
        }
    }

    #[inline(always)]
    fn key(&self) -> (Clock, EventKind) {
        (self.target, self.kind)
    }
}

/// Time-ordered event queue
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: VecDeque<Event>,
    clock: Clock,
    /// Bumped on every cancellation of a kind
    cancellations: [u64; EventKind::COUNT],
}

/// Scheduler handle shared by the context and the devices that schedule
pub type SharedScheduler = Rc<RefCell<Scheduler>>;

impl Scheduler {
    /// Create an empty scheduler at clock 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared handle
    pub fn shared() -> SharedScheduler {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Current global clock
    #[inline(always)]
    pub fn now(&self) -> Clock {
        self.clock
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Insert an event keeping the queue ordered by `(target, kind)`
    ///
    /// Events with an equal key keep insertion order. Most insertions land
    /// near the back, so the search runs from there.
    pub fn schedule_event(&mut self, event: Event) {
        let key = event.key();
        let pos = self
            .queue
            .iter()
            .rposition(|e| e.key() <= key)
            .map_or(0, |i| i + 1);

        log::trace!(
            "Scheduler: {:?} at {} (now {}, slot {}/{})",
            event.kind,
            event.target,
            self.clock,
            pos,
            self.queue.len()
        );

        self.queue.insert(pos, event);
    }

    /// Schedule a one-shot event `delay` cycles from now
    pub fn schedule_in(&mut self, kind: EventKind, delay: Clock, payload: u32) {
        let now = self.clock;
        self.schedule_event(Event::once(kind, now, now + delay, payload));
    }

    /// Schedule a periodic event whose first firing is one interval from now
    pub fn schedule_periodic(&mut self, kind: EventKind, interval: Clock, payload: u32) {
        let now = self.clock;
        self.schedule_event(Event::periodic(kind, now, interval, payload));
    }

    /// Remove every queued event of `kind`
    ///
    /// # Returns
    ///
    /// Number of events removed
    ///
    /// A periodic event of `kind` that is currently being dispatched is not
    /// re-inserted either.
    pub fn unschedule_all_events_of_kind(&mut self, kind: EventKind) -> usize {
        self.cancellations[kind.index()] += 1;
        let before = self.queue.len();
        self.queue.retain(|e| e.kind != kind);
        before - self.queue.len()
    }

    /// Peek the earliest event of `kind` without removing it
    pub fn next_event_of_kind(&self, kind: EventKind) -> Option<&Event> {
        self.queue.iter().find(|e| e.kind == kind)
    }

    /// Peek the earliest event
    pub fn peek(&self) -> Option<&Event> {
        self.queue.front()
    }

    /// Remove the earliest event and advance the clock to its target
    ///
    /// Periodic events are not re-inserted here; see [`pop_and_execute`].
    pub fn pop(&mut self) -> Option<Event> {
        let event = self.queue.pop_front()?;
        // Events scheduled in the past still fire, without moving time back
        self.clock = self.clock.max(event.target);
        Some(event)
    }

    /// Drop every event and rewind the clock
    pub fn reset(&mut self) {
        self.queue.clear();
        self.clock = 0;
        for count in self.cancellations.iter_mut() {
            *count += 1;
        }
    }

    /// Cancellation count for `kind`
    fn cancellation_count(&self, kind: EventKind) -> u64 {
        self.cancellations[kind.index()]
    }
}

/// Event handler
///
/// Handlers receive the whole context, so they can touch any device and
/// schedule further events.
pub type Handler<C> = fn(&mut C, &Event) -> Result<()>;

/// Per-kind handler lists, run in registration order
pub struct HandlerTable<C> {
    handlers: [Vec<Handler<C>>; EventKind::COUNT],
}

impl<C> HandlerTable<C> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            handlers: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Register a handler for `kind`
    pub fn register(&mut self, kind: EventKind, handler: Handler<C>) {
        self.handlers[kind.index()].push(handler);
    }

    /// Number of handlers for `kind`
    pub fn count(&self, kind: EventKind) -> usize {
        self.handlers[kind.index()].len()
    }

    #[inline(always)]
    fn get(&self, kind: EventKind, i: usize) -> Handler<C> {
        self.handlers[kind.index()][i]
    }
}

impl<C> Default for HandlerTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that owns a scheduler and a handler table
pub trait EventContext: Sized {
    /// Shared scheduler
    fn scheduler(&self) -> &SharedScheduler;

    /// Handler table for this context
    fn handlers(&self) -> &HandlerTable<Self>;
}

/// Pop the earliest event, run its handlers, then re-insert it if periodic
///
/// # Returns
///
/// The consumed event, or `None` if the queue was empty
///
/// # Errors
///
/// The first handler error stops the remaining handlers and is returned.
/// A periodic event is still re-inserted in that case so that the caller
/// can resume.
///
/// A periodic event is dropped if a handler cancels its kind.
pub fn pop_and_execute<C: EventContext>(ctx: &mut C) -> Result<Option<Event>> {
    let (event, cancellations) = {
        let mut scheduler = ctx.scheduler().borrow_mut();
        let Some(event) = scheduler.pop() else {
            return Ok(None);
        };
        let cancellations = scheduler.cancellation_count(event.kind);
        (event, cancellations)
    };

    let mut result = Ok(());
    for i in 0..ctx.handlers().count(event.kind) {
        let handler = ctx.handlers().get(event.kind, i);
        result = handler(ctx, &event);
        if result.is_err() {
            break;
        }
    }

    if event.reschedule {
        let mut scheduler = ctx.scheduler().borrow_mut();
        if scheduler.cancellation_count(event.kind) == cancellations {
            scheduler.schedule_event(event.next_period());
        } else {
            log::trace!("Scheduler: {:?} cancelled by its handler", event.kind);
        }
    }

    result.map(|()| Some(event))
}
