//! Tests for position planning
//!
//! A small in-memory model applies the planned shifts the same way the SQL
//! executor does, so these tests exercise the density postcondition over
//! whole operation sequences.

use crate::ordering::{
    clamp_move_target, insert_position, move_shift, removal_shift, Shift,
};

/// (id, position) rows of one scope
type Model = Vec<(u32, i32)>;

fn apply(rows: &mut Model, shift: Shift, exclude: Option<u32>) {
    for row in rows.iter_mut() {
        if Some(row.0) == exclude {
            continue;
        }
        if row.1 >= shift.from && row.1 <= shift.to {
            row.1 += shift.delta;
        }
    }
}

fn insert(rows: &mut Model, id: u32, requested: Option<i32>) {
    let max = rows.iter().map(|r| r.1).max().unwrap_or(0);
    let (pos, shift) = insert_position(max, requested);
    if let Some(s) = shift {
        apply(rows, s, None);
    }
    rows.push((id, pos));
}

fn relocate(rows: &mut Model, id: u32, requested: i32) {
    let old = rows.iter().find(|r| r.0 == id).unwrap().1;
    let max = rows.iter().map(|r| r.1).max().unwrap_or(0);
    let new = clamp_move_target(max, requested);
    if let Some(s) = move_shift(old, new) {
        apply(rows, s, Some(id));
    }
    rows.iter_mut().find(|r| r.0 == id).unwrap().1 = new;
}

fn remove(rows: &mut Model, id: u32) {
    let old = rows.iter().find(|r| r.0 == id).unwrap().1;
    rows.retain(|r| r.0 != id);
    apply(rows, removal_shift(old), None);
}

fn position_of(rows: &Model, id: u32) -> i32 {
    rows.iter().find(|r| r.0 == id).unwrap().1
}

fn assert_dense(rows: &Model) {
    let mut positions: Vec<i32> = rows.iter().map(|r| r.1).collect();
    positions.sort_unstable();
    let expected: Vec<i32> = (1..=rows.len() as i32).collect();
    assert_eq!(positions, expected, "positions must be exactly 1..=n");
}

#[test]
fn append_starts_at_one() {
    let (pos, shift) = insert_position(0, None);
    assert_eq!(pos, 1);
    assert!(shift.is_none());
}

#[test]
fn explicit_position_shifts_occupants_up() {
    // Create P1 (auto = 1), then P2 at explicit position 1: P1 moves to 2.
    let mut rows = Model::new();
    insert(&mut rows, 1, None);
    insert(&mut rows, 2, Some(1));

    assert_eq!(position_of(&rows, 2), 1);
    assert_eq!(position_of(&rows, 1), 2);
    assert_dense(&rows);
}

#[test]
fn requested_position_is_clamped() {
    let (pos, shift) = insert_position(3, Some(0));
    assert_eq!(pos, 1);
    assert_eq!(shift, Some(Shift { from: 1, to: 3, delta: 1 }));

    let (pos, shift) = insert_position(3, Some(99));
    assert_eq!(pos, 4);
    assert!(shift.is_none(), "beyond the end is an append, no shift");
}

#[test]
fn move_toward_front_shifts_range_up() {
    assert_eq!(move_shift(5, 2), Some(Shift { from: 2, to: 4, delta: 1 }));
}

#[test]
fn move_toward_back_shifts_range_down() {
    assert_eq!(move_shift(2, 5), Some(Shift { from: 3, to: 5, delta: -1 }));
}

#[test]
fn move_to_same_position_is_noop() {
    assert_eq!(move_shift(3, 3), None);
}

#[test]
fn removal_compacts_everything_above() {
    let mut rows = Model::new();
    for id in 1..=5 {
        insert(&mut rows, id, None);
    }
    remove(&mut rows, 2);

    assert_dense(&rows);
    assert_eq!(position_of(&rows, 1), 1);
    assert_eq!(position_of(&rows, 3), 2);
    assert_eq!(position_of(&rows, 5), 4);
}

#[test]
fn mixed_operation_sequence_keeps_density() {
    let mut rows = Model::new();

    insert(&mut rows, 1, None);
    insert(&mut rows, 2, None);
    insert(&mut rows, 3, Some(2));
    assert_dense(&rows);

    relocate(&mut rows, 1, 3);
    assert_dense(&rows);
    assert_eq!(position_of(&rows, 1), 3);

    insert(&mut rows, 4, Some(1));
    remove(&mut rows, 3);
    relocate(&mut rows, 4, 2);
    insert(&mut rows, 5, None);
    remove(&mut rows, 1);
    assert_dense(&rows);
}

#[test]
fn move_target_clamps_to_occupied_range() {
    assert_eq!(clamp_move_target(4, 0), 1);
    assert_eq!(clamp_move_target(4, -3), 1);
    assert_eq!(clamp_move_target(4, 9), 4);
    // Single-row scope: the only legal target is 1
    assert_eq!(clamp_move_target(1, 7), 1);
}
