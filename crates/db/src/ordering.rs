//! Dense position bookkeeping shared by phases, missions and games.
//!
//! Every ordered scope (phases globally, missions per phase, games per
//! mission) keeps its active rows at positions `1..=n` with no gaps. The
//! planning functions here decide where a row lands and which siblings must
//! shift; the executor applies a shift to one scope. Callers run plan +
//! shift + row write inside a single transaction.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// A half-open adjustment to sibling positions: add `delta` to every active
/// row with `from <= position <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub from: i32,
    pub to: i32,
    pub delta: i32,
}

/// Decide the position for a new row in a scope whose current maximum
/// active position is `max` (0 when empty).
///
/// With no requested position the row appends at `max + 1`. An explicit
/// position is clamped to `[1, max + 1]`; if it collides with existing
/// rows, everything at or above it shifts up by one.
pub fn insert_position(max: i32, requested: Option<i32>) -> (i32, Option<Shift>) {
    let append = max + 1;
    match requested {
        None => (append, None),
        Some(p) => {
            let p = p.clamp(1, append);
            if p == append {
                (p, None)
            } else {
                (p, Some(Shift { from: p, to: max, delta: 1 }))
            }
        }
    }
}

/// Clamp a move target to the occupied range of the scope.
pub fn clamp_move_target(max: i32, requested: i32) -> i32 {
    requested.clamp(1, max.max(1))
}

/// Shift applied to siblings when a row moves from `old` to `new` within
/// the same scope. The moved row itself is repositioned by the caller.
pub fn move_shift(old: i32, new: i32) -> Option<Shift> {
    use std::cmp::Ordering::*;
    match new.cmp(&old) {
        Less => Some(Shift { from: new, to: old - 1, delta: 1 }),
        Greater => Some(Shift { from: old + 1, to: new, delta: -1 }),
        Equal => None,
    }
}

/// Compaction applied after a row leaves its scope (soft-delete or move to
/// another parent): everything above it slides down by one.
pub fn removal_shift(old: i32) -> Shift {
    Shift { from: old + 1, to: i32::MAX, delta: -1 }
}

/// The three ordered tables and their scope columns.
#[derive(Debug, Clone, Copy)]
pub enum Scope {
    Phases,
    Missions { phase_id: Uuid },
    Games { mission_id: Uuid },
}

/// Highest active position in a scope, 0 when the scope is empty.
pub async fn max_position(
    tx: &mut Transaction<'_, Postgres>,
    scope: Scope,
) -> Result<i32, sqlx::Error> {
    let (sql, scope_id) = match scope {
        Scope::Phases => (
            "SELECT COALESCE(MAX(position), 0) FROM phases WHERE is_active",
            None,
        ),
        Scope::Missions { phase_id } => (
            "SELECT COALESCE(MAX(position), 0) FROM missions WHERE phase_id = $1 AND is_active",
            Some(phase_id),
        ),
        Scope::Games { mission_id } => (
            "SELECT COALESCE(MAX(position), 0) FROM games WHERE mission_id = $1 AND is_active",
            Some(mission_id),
        ),
    };

    let mut query = sqlx::query_scalar::<_, i32>(sql);
    if let Some(id) = scope_id {
        query = query.bind(id);
    }
    query.fetch_one(&mut **tx).await
}

/// Apply a shift to every active row of a scope inside the caller's
/// transaction. `exclude` is the row being inserted or moved, which is
/// repositioned separately.
pub async fn apply_shift(
    tx: &mut Transaction<'_, Postgres>,
    scope: Scope,
    shift: Shift,
    exclude: Uuid,
) -> Result<(), sqlx::Error> {
    let (sql, scope_id) = match scope {
        Scope::Phases => (
            "UPDATE phases SET position = position + $1, updated_at = NOW() \
             WHERE is_active AND position >= $2 AND position <= $3 AND id <> $4",
            None,
        ),
        Scope::Missions { phase_id } => (
            "UPDATE missions SET position = position + $1, updated_at = NOW() \
             WHERE phase_id = $5 AND is_active AND position >= $2 AND position <= $3 AND id <> $4",
            Some(phase_id),
        ),
        Scope::Games { mission_id } => (
            "UPDATE games SET position = position + $1, updated_at = NOW() \
             WHERE mission_id = $5 AND is_active AND position >= $2 AND position <= $3 AND id <> $4",
            Some(mission_id),
        ),
    };

    let mut query = sqlx::query(sql)
        .bind(shift.delta)
        .bind(shift.from)
        .bind(shift.to)
        .bind(exclude);
    if let Some(id) = scope_id {
        query = query.bind(id);
    }
    query.execute(&mut **tx).await?;
    Ok(())
}
