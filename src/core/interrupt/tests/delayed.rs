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

//! Delayed interrupt delivery through the scheduler

use super::super::*;
use crate::core::scheduler::Scheduler;

#[test]
fn test_delayed_request_schedules_event() {
    let scheduler = Scheduler::shared();
    let mut ic = InterruptController::new(scheduler.clone());

    assert!(ic.request_interrupt(interrupts::DMA, false, true, 100));
    assert_eq!(ic.read_status(), 0);
    assert_eq!(ic.delayed_count(), 1);

    let event = *scheduler
        .borrow()
        .next_event_of_kind(EventKind::Interrupt)
        .unwrap();
    assert_eq!(event.target, 100);
    assert_eq!(event.payload, interrupts::DMA as u32);
}

#[test]
fn test_delivery_waits_for_target() {
    let scheduler = Scheduler::shared();
    let mut ic = InterruptController::new(scheduler.clone());
    ic.request_interrupt(interrupts::CDROM, false, true, 50);

    assert_eq!(ic.deliver_due(49), 0);
    assert_eq!(ic.read_status(), 0);

    let event = scheduler.borrow_mut().pop().unwrap();
    assert_eq!(ic.deliver_due(event.target), interrupts::CDROM);
    assert_eq!(ic.read_status(), interrupts::CDROM as u32);
    assert_eq!(ic.delayed_count(), 0);
}

#[test]
fn test_duplicate_delayed_request_not_queued_twice() {
    let scheduler = Scheduler::shared();
    let mut ic = InterruptController::new(scheduler.clone());

    assert!(ic.request_interrupt(interrupts::GPU, false, true, 10));
    assert!(!ic.request_interrupt(interrupts::GPU, false, true, 10));
    assert_eq!(scheduler.borrow().len(), 1);
}

#[test]
fn test_reset_drops_delayed() {
    let scheduler = Scheduler::shared();
    let mut ic = InterruptController::new(scheduler);
    ic.request_interrupt(interrupts::TIMER2, false, true, 10);

    ic.reset();
    assert_eq!(ic.deliver_due(1_000), 0);
}
