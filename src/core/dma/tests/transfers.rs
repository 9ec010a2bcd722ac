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

//! DMA transfer operation tests

use super::super::*;
use super::helpers::Harness;

#[test]
fn test_otc_transfer() {
    let mut h = Harness::new();
    let base_addr = 0x1000;
    let entry_count = 8;

    h.dma.write_madr(DMA::CH_OTC, base_addr);
    h.dma.write_bcr(DMA::CH_OTC, entry_count);
    h.dma.write_chcr(DMA::CH_OTC, 0x1100_0000).unwrap();

    assert!(!h.dma.channel(DMA::CH_OTC).is_active());

    let last_entry_addr = base_addr - (entry_count - 1) * 4;
    assert_eq!(h.peek(last_entry_addr), OT_END);

    let mut addr = base_addr;
    for i in 0..entry_count - 1 {
        let expected_link = (addr - 4) & 0x001F_FFFC;
        assert_eq!(
            h.peek(addr),
            expected_link,
            "Entry {} at 0x{:X} should link to 0x{:X}",
            i,
            addr,
            expected_link
        );
        addr -= 4;
    }

    let status = h.dma.last_transfer().unwrap();
    assert_eq!(status.words, entry_count);
    assert!(status.complete);
}

#[test]
fn test_otc_transfer_single_entry() {
    let mut h = Harness::new();
    h.poke(0x1000, 0xDEAD_BEEF);

    h.dma.write_madr(DMA::CH_OTC, 0x1000);
    h.dma.write_bcr(DMA::CH_OTC, 1);
    h.dma.write_chcr(DMA::CH_OTC, 0x1100_0000).unwrap();

    assert_eq!(h.peek(0x1000), OT_END);
    assert_eq!(h.peek(0x0FFC), 0);

    let chcr = h.dma.read_chcr(DMA::CH_OTC);
    assert_eq!(chcr & (1 << 24), 0, "enable cleared");
    assert_eq!(chcr & (1 << 28), 0, "trigger cleared");
}

#[test]
fn test_otc_without_trigger_does_not_run() {
    let mut h = Harness::new();
    h.dma.write_madr(DMA::CH_OTC, 0x1000);
    h.dma.write_bcr(DMA::CH_OTC, 4);
    h.dma.write_chcr(DMA::CH_OTC, 0x0100_0000).unwrap();

    assert_eq!(h.peek(0x1000), 0);
    assert!(h.dma.channel(DMA::CH_OTC).enabled());
    assert!(h.dma.last_transfer().is_none());
}

#[test]
fn test_gpu_linked_list_two_nodes() {
    let mut h = Harness::new();

    // Node 1 at 0x1000: two words, links to 0x2000
    h.poke(0x1000, 0x0200_2000);
    h.poke(0x1004, 0xAAAA_0001);
    h.poke(0x1008, 0xAAAA_0002);
    // Node 2 at 0x2000: one word, end of list
    h.poke(0x2000, 0x01FF_FFFF);
    h.poke(0x2004, 0xBBBB_0001);

    h.dma.write_madr(DMA::CH_GPU, 0x1000);
    h.dma.write_chcr(DMA::CH_GPU, 0x0100_0401).unwrap();

    assert_eq!(
        h.gpu.borrow().received,
        vec![0xAAAA_0001, 0xAAAA_0002, 0xBBBB_0001]
    );

    let status = h.dma.last_transfer().unwrap();
    assert_eq!(status.nodes, 2);
    assert_eq!(status.words, 3);
    assert!(status.complete);
    assert!(!h.dma.channel(DMA::CH_GPU).enabled());
    assert_eq!(h.dma.read_madr(DMA::CH_GPU), OT_END);
}

#[test]
fn test_linked_list_walks_ordering_table() {
    let mut h = Harness::new();

    // Build an ordering table with OTC, then send it to the GPU
    h.dma.write_madr(DMA::CH_OTC, 0x100C);
    h.dma.write_bcr(DMA::CH_OTC, 4);
    h.dma.write_chcr(DMA::CH_OTC, 0x1100_0000).unwrap();

    h.dma.write_madr(DMA::CH_GPU, 0x100C);
    h.dma.write_chcr(DMA::CH_GPU, 0x0100_0401).unwrap();

    let status = h.dma.last_transfer().unwrap();
    assert_eq!(status.nodes, 4);
    assert_eq!(status.words, 0);
    assert!(h.gpu.borrow().received.is_empty());
}

#[test]
fn test_linked_list_cycle_leaves_channel_enabled() {
    let mut h = Harness::new();
    // Self-referencing empty node
    h.poke(0x3000, 0x0000_3000);

    h.dma.write_madr(DMA::CH_GPU, 0x3000);
    h.dma.write_chcr(DMA::CH_GPU, 0x0100_0401).unwrap();

    let status = h.dma.last_transfer().unwrap();
    assert!(!status.complete);
    assert!(h.dma.channel(DMA::CH_GPU).enabled());
}

#[test]
fn test_gpu_block_transfer_from_ram() {
    let mut h = Harness::new();
    for i in 0..8 {
        h.poke(0x4000 + i * 4, 0x1000 + i);
    }

    h.dma.write_madr(DMA::CH_GPU, 0x4000);
    h.dma.write_bcr(DMA::CH_GPU, 0x0002_0004); // 2 blocks of 4 words
    h.dma.write_chcr(DMA::CH_GPU, 0x0100_0201).unwrap();

    assert_eq!(
        h.gpu.borrow().received,
        (0..8).map(|i| 0x1000 + i).collect::<Vec<u32>>()
    );
    assert_eq!(h.dma.read_madr(DMA::CH_GPU), 0x4020);
    assert_eq!(h.dma.read_bcr(DMA::CH_GPU) >> 16, 0);
}

#[test]
fn test_cdrom_block_transfer_to_ram() {
    let mut h = Harness::new();
    h.cdrom
        .borrow_mut()
        .supply
        .extend([0x0403_0201, 0x0807_0605, 0x0C0B_0A09]);

    h.dma.write_madr(DMA::CH_CDROM, 0x8000);
    h.dma.write_bcr(DMA::CH_CDROM, 3);
    h.dma.write_chcr(DMA::CH_CDROM, 0x1100_0000).unwrap();

    assert_eq!(h.peek(0x8000), 0x0403_0201);
    assert_eq!(h.peek(0x8004), 0x0807_0605);
    assert_eq!(h.peek(0x8008), 0x0C0B_0A09);
    assert!(!h.dma.channel(DMA::CH_CDROM).enabled());
}

#[test]
fn test_completion_raises_dma_interrupt() {
    let mut h = Harness::new();
    h.dma.write_interrupt(1 << 23 | 1 << (16 + DMA::CH_GPU));

    h.poke(0x1000, 0x00FF_FFFF);
    h.dma.write_madr(DMA::CH_GPU, 0x1000);
    h.dma.write_chcr(DMA::CH_GPU, 0x0100_0401).unwrap();

    assert_ne!(h.dma.read_interrupt() & (1 << (24 + DMA::CH_GPU)), 0);
    assert_eq!(
        h.interrupts.borrow().read_status(),
        interrupts::DMA as u32
    );
}

#[test]
fn test_second_completion_without_ack_is_not_a_new_edge() {
    let mut h = Harness::new();
    h.dma.write_interrupt(1 << 23 | 0x7F << 16);

    for _ in 0..2 {
        h.dma.write_madr(DMA::CH_OTC, 0x100);
        h.dma.write_bcr(DMA::CH_OTC, 1);
        h.dma.write_chcr(DMA::CH_OTC, 0x1100_0000).unwrap();
    }
    assert_eq!(h.interrupts.borrow().read_status(), interrupts::DMA as u32);

    // Acknowledge at the controller only: master flag is still high
    h.interrupts.borrow_mut().write_status(interrupts::DMA as u32);
    h.dma.write_madr(DMA::CH_OTC, 0x100);
    h.dma.write_chcr(DMA::CH_OTC, 0x1100_0000).unwrap();
    assert_eq!(h.interrupts.borrow().read_status(), 0);
}

#[test]
fn test_missing_port_is_unsupported() {
    let mut h = Harness::new();
    h.dma.write_madr(DMA::CH_SPU, 0x1000);
    h.dma.write_bcr(DMA::CH_SPU, 0x0001_0010);

    let err = h
        .dma
        .write_chcr(DMA::CH_SPU, 0x0100_0201)
        .unwrap_err();
    assert!(matches!(
        err,
        EmulatorError::UnsupportedDma {
            channel: DMA::CH_SPU,
            direction: "from RAM"
        }
    ));
    assert!(!h.dma.channel(DMA::CH_SPU).enabled());
}

#[test]
fn test_linked_list_to_ram_is_unsupported() {
    let mut h = Harness::new();
    h.dma.write_madr(DMA::CH_GPU, 0x1000);
    let err = h.dma.write_chcr(DMA::CH_GPU, 0x0100_0400).unwrap_err();
    assert!(matches!(
        err,
        EmulatorError::UnsupportedDma {
            channel: DMA::CH_GPU,
            direction: "to RAM"
        }
    ));
}
