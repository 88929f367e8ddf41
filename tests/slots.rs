use std::collections::HashSet;
use std::time::Duration;

use crossbeam_utils::thread;
use tabletkv::{ConnectionSlots, DEFAULT_SLOTS};

#[test]
fn zero_slots_is_rejected() {
    assert!(ConnectionSlots::new(0).is_err());
}

#[test]
fn slots_are_distinct_and_bounded() {
    let slots = ConnectionSlots::new(4).unwrap();
    assert_eq!(slots.capacity(), 4);

    let taken: Vec<_> = (0..4).map(|_| slots.acquire().unwrap()).collect();
    let indices: HashSet<usize> = taken.iter().map(|slot| slot.index()).collect();
    assert_eq!(indices, (0..4).collect());
    assert_eq!(slots.available(), 0);
    assert!(slots.try_acquire().is_none());
}

#[test]
fn dropped_slot_is_returned() {
    let slots = ConnectionSlots::new(2).unwrap();
    let first = slots.acquire().unwrap();
    let second = slots.acquire().unwrap();
    let index = first.index();

    drop(first);
    assert_eq!(slots.available(), 1);
    let again = slots.try_acquire().unwrap();
    assert_eq!(again.index(), index);

    drop(again);
    drop(second);
    assert_eq!(slots.available(), 2);
}

#[test]
fn acquire_waits_for_a_release() {
    let slots = ConnectionSlots::new(1).unwrap();
    let held = slots.acquire().unwrap();

    thread::scope(|s| {
        let waiter = s.spawn(|_| slots.acquire().unwrap().index());
        std::thread::sleep(Duration::from_millis(50));
        drop(held);
        assert_eq!(waiter.join().unwrap(), 0);
    })
    .unwrap();
}

#[test]
fn default_capacity() {
    let slots = ConnectionSlots::new(DEFAULT_SLOTS).unwrap();
    assert_eq!(slots.available(), 100);
}
