// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// ShmBuffer: round trips, all-or-nothing writes, wraparound, and two
// handles (threads and processes) sharing one ring.

use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use libsysprim::{ErrorKind, ShmBuffer, SHM_BUFFER_DATA_OFFSET};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Set in a child process to the name of the ring it should attach to.
const CHILD_ENV: &str = "LIBSYSPRIM_SHMBUF_CHILD";

fn fresh(prefix: &str) -> String {
    let _ = env_logger::builder().is_test(true).try_init();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = format!("{prefix}_ring_{}_{n}", std::process::id());
    ShmBuffer::clear_storage(&name);
    name
}

#[test]
fn header_is_two_words() {
    assert_eq!(SHM_BUFFER_DATA_OFFSET, 2 * std::mem::size_of::<usize>());
}

#[test]
fn new_buffer_is_empty() {
    let name = fresh("empty");
    let buf = ShmBuffer::new(&name, 64).expect("create");
    assert!(buf.capacity() >= 65);
    assert_eq!(buf.used_space().unwrap(), 0);
    assert_eq!(buf.free_space().unwrap(), buf.capacity() - 1);

    let mut out = [0u8; 8];
    assert_eq!(buf.read(&mut out).unwrap(), 0);
}

#[test]
fn round_trip() {
    let name = fresh("round_trip");
    let buf = ShmBuffer::new(&name, 128).expect("create");
    let msg = b"the quick brown fox";

    assert_eq!(buf.write(msg).unwrap(), msg.len());
    assert_eq!(buf.used_space().unwrap(), msg.len());

    let mut out = [0u8; 64];
    let n = buf.read(&mut out).unwrap();
    assert_eq!(&out[..n], msg);
    assert_eq!(buf.used_space().unwrap(), 0);
}

#[test]
fn short_read_leaves_rest_queued() {
    let name = fresh("short_read");
    let buf = ShmBuffer::new(&name, 64).expect("create");
    buf.write(b"abcdef").unwrap();

    let mut out = [0u8; 4];
    assert_eq!(buf.read(&mut out).unwrap(), 4);
    assert_eq!(&out, b"abcd");
    assert_eq!(buf.used_space().unwrap(), 2);
    assert_eq!(buf.read(&mut out).unwrap(), 2);
    assert_eq!(&out[..2], b"ef");
}

#[test]
fn oversized_write_is_rejected_whole() {
    let name = fresh("no_partial");
    let buf = ShmBuffer::new(&name, 32).expect("create");
    buf.write(b"xyz").unwrap();
    let before = buf.used_space().unwrap();

    let big = vec![7u8; buf.free_space().unwrap() + 1];
    assert_eq!(buf.write(&big).unwrap(), 0);
    assert_eq!(buf.used_space().unwrap(), before);

    // Exactly the free space fits.
    let fits = vec![9u8; buf.free_space().unwrap()];
    assert_eq!(buf.write(&fits).unwrap(), fits.len());
    assert_eq!(buf.free_space().unwrap(), 0);
}

#[test]
fn clear_resets_positions() {
    let name = fresh("clear");
    let buf = ShmBuffer::new(&name, 32).expect("create");
    buf.write(b"some bytes").unwrap();
    let mut out = [0u8; 4];
    buf.read(&mut out).unwrap();

    buf.clear().unwrap();
    assert_eq!(buf.used_space().unwrap(), 0);

    buf.write(b"fresh").unwrap();
    let mut out = [0u8; 16];
    assert_eq!(buf.read(&mut out).unwrap(), 5);
    assert_eq!(&out[..5], b"fresh");
}

#[test]
fn wraparound_keeps_unread_bytes() {
    let name = fresh("wrap");
    let buf = ShmBuffer::new(&name, 40).expect("create");
    let cap = buf.capacity();

    let first: Vec<u8> = (0..cap - 2).map(|i| i as u8).collect();
    assert_eq!(buf.write(&first).unwrap(), first.len());

    let mut sink = vec![0u8; cap - 4];
    assert_eq!(buf.read(&mut sink).unwrap(), cap - 4);
    assert_eq!(sink[..], first[..cap - 4]);

    // Crosses the end of the data region.
    let tail = [0xA1, 0xA2, 0xA3, 0xA4, 0xA5];
    assert_eq!(buf.write(&tail).unwrap(), tail.len());
    assert_eq!(buf.used_space().unwrap(), 2 + tail.len());

    let mut out = vec![0u8; cap];
    let n = buf.read(&mut out).unwrap();
    let mut expected = first[cap - 4..].to_vec();
    expected.extend_from_slice(&tail);
    assert_eq!(&out[..n], &expected[..]);
}

#[test]
fn many_small_messages_cycle_the_ring() {
    let name = fresh("cycle");
    let buf = ShmBuffer::new(&name, 16).expect("create");
    let mut out = [0u8; 7];
    for i in 0..500u32 {
        let msg = [i as u8; 7];
        assert_eq!(buf.write(&msg).unwrap(), 7);
        assert_eq!(buf.read(&mut out).unwrap(), 7);
        assert_eq!(out, msg);
    }
}

#[test]
fn attach_to_missing_ring_fails() {
    let name = fresh("missing");
    let err = ShmBuffer::new(&name, 0).err().expect("must fail");
    assert_eq!(err.kind(), ErrorKind::NotExists);
}

#[test]
fn overflowing_size_is_rejected() {
    let err = ShmBuffer::new("overflow_ring", usize::MAX).err().expect("must fail");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

// A creates 4096 bytes, B attaches, A writes "hello", B reads it.
#[test]
fn two_handles_share_the_ring() {
    let name = fresh("two_handles");
    let a = ShmBuffer::new(&name, 4096).expect("create");
    let b = ShmBuffer::new(&name, 0).expect("attach");
    assert_eq!(a.capacity(), b.capacity());

    assert_eq!(a.write(b"hello").unwrap(), 5);
    assert_eq!(b.used_space().unwrap(), 5);

    let mut out = [0u8; 16];
    assert_eq!(b.read(&mut out).unwrap(), 5);
    assert_eq!(&out[..5], b"hello");
    assert_eq!(a.used_space().unwrap(), 0);
    assert_eq!(b.used_space().unwrap(), 0);
}

#[test]
fn threads_stream_through_the_ring() {
    let name = fresh("stream");
    let total: usize = 20_000;
    let producer_name = name.clone();
    let a = ShmBuffer::new(&name, 256).expect("create");

    let producer = std::thread::spawn(move || {
        let w = ShmBuffer::new(&producer_name, 0).expect("attach");
        let mut next = 0usize;
        while next < total {
            let chunk: Vec<u8> = (next..(next + 13).min(total)).map(|i| i as u8).collect();
            if w.write(&chunk).unwrap() == chunk.len() {
                next += chunk.len();
            } else {
                std::thread::yield_now();
            }
        }
    });

    let mut got = 0usize;
    let mut out = [0u8; 64];
    while got < total {
        let n = a.read(&mut out).unwrap();
        for (i, b) in out[..n].iter().enumerate() {
            assert_eq!(*b, (got + i) as u8);
        }
        got += n;
        if n == 0 {
            std::thread::yield_now();
        }
    }
    producer.join().unwrap();
    assert_eq!(a.used_space().unwrap(), 0);
}

/// Child side of `hello_across_processes`; does nothing in a normal run.
#[test]
fn child_reads_hello() {
    let Ok(name) = std::env::var(CHILD_ENV) else {
        return;
    };
    let buf = ShmBuffer::new(&name, 0).expect("child attach");
    assert_eq!(buf.used_space().unwrap(), 5);
    let mut out = [0u8; 16];
    assert_eq!(buf.read(&mut out).unwrap(), 5);
    assert_eq!(&out[..5], b"hello");
    assert_eq!(buf.used_space().unwrap(), 0);
}

#[test]
fn hello_across_processes() {
    if std::env::var(CHILD_ENV).is_ok() {
        return;
    }
    let name = fresh("xproc");
    let a = ShmBuffer::new(&name, 4096).expect("create");
    assert_eq!(a.write(b"hello").unwrap(), 5);

    let status = Command::new(std::env::current_exe().unwrap())
        .args(["--exact", "child_reads_hello", "--test-threads=1"])
        .env(CHILD_ENV, &name)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(a.used_space().unwrap(), 0);
}
