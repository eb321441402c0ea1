//! Dense position ordering for sibling sets
//!
//! Columns within a board and tasks within a column are kept in a dense,
//! zero-based ordering: a parent with `n` children holds exactly the positions
//! `0..n`. This module contains the position arithmetic only. It never touches
//! storage; each repository backend loads the sibling set (or locks it), asks
//! this module for a plan, and applies the plan inside its own atomic unit.
//!
//! # Operations
//!
//! - **Append**: a new child takes `position = n`.
//! - **Move** within a parent: siblings between the old and the new slot shift
//!   by one towards the vacated slot, then the item lands on the new slot.
//! - **Insert** into another parent: siblings at or after the slot shift up.
//! - **Remove** (delete or move-out): siblings after the vacated slot shift
//!   down, so the parent stays gap-free.
//!
//! # Example
//!
//! ```
//! use kanban_core::ordering::{plan_move, MovePlan, Shift};
//!
//! // Columns [Todo, Doing, Done]; move "Done" (2) to the front.
//! let plan = plan_move(2, 0, 3).unwrap();
//! assert_eq!(
//!     plan,
//!     MovePlan::Reorder {
//!         shift: Shift { start: 0, end: 1, delta: 1 },
//!         target: 0,
//!     }
//! );
//! ```

/// Zero-based slot of a child within its parent.
pub type Position = i32;

/// Errors produced by position arithmetic
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    /// Requested position is below zero
    #[error("position {0} must not be negative")]
    NegativePosition(Position),

    /// Requested position is past the end of the sibling set
    #[error("position {requested} is out of range for {len} items")]
    OutOfRange { requested: Position, len: usize },

    /// Sibling set no longer fits the position type
    #[error("sibling set is too large to be positioned")]
    Overflow,
}

/// A uniform shift applied to every sibling whose position lies in
/// `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    /// First affected position (inclusive)
    pub start: Position,

    /// Last affected position (inclusive)
    pub end: Position,

    /// Amount added to each affected position (`+1` or `-1`)
    pub delta: Position,
}

impl Shift {
    /// Returns true if a sibling at `position` is moved by this shift
    pub fn contains(&self, position: Position) -> bool {
        position >= self.start && position <= self.end
    }

    /// Returns the position a sibling ends up at after the shift
    pub fn apply(&self, position: Position) -> Position {
        if self.contains(position) {
            position + self.delta
        } else {
            position
        }
    }
}

/// Outcome of planning a move within one parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// The item already sits at the requested position; nothing is written
    Unchanged,

    /// Shift the intervening siblings, then place the item at `target`
    Reorder { shift: Shift, target: Position },
}

/// Implemented by entities that occupy a slot in a sibling ordering
pub trait Positioned {
    fn position(&self) -> Position;
    fn set_position(&mut self, position: Position);
}

/// Position assigned to a child appended to a parent with `sibling_count`
/// children.
pub fn append_position(sibling_count: usize) -> Result<Position, OrderingError> {
    Position::try_from(sibling_count).map_err(|_| OrderingError::Overflow)
}

/// Rejects positions that can never be valid, regardless of sibling count.
///
/// Services call this before any storage access; the range check against the
/// live sibling count happens later inside the atomic unit.
pub fn check_requested(requested: Position) -> Result<(), OrderingError> {
    if requested < 0 {
        return Err(OrderingError::NegativePosition(requested));
    }
    Ok(())
}

/// Plans moving an item from `current` to `requested` within a parent that
/// holds `sibling_count` children (the moving item included).
///
/// # Errors
///
/// - `NegativePosition` if `requested < 0`
/// - `OutOfRange` if `requested >= sibling_count`; positions are never clamped
pub fn plan_move(
    current: Position,
    requested: Position,
    sibling_count: usize,
) -> Result<MovePlan, OrderingError> {
    check_requested(requested)?;

    if requested as usize >= sibling_count {
        return Err(OrderingError::OutOfRange {
            requested,
            len: sibling_count,
        });
    }

    if requested == current {
        return Ok(MovePlan::Unchanged);
    }

    let shift = if requested > current {
        // Moving later: the block after the item slides back.
        Shift {
            start: current + 1,
            end: requested,
            delta: -1,
        }
    } else {
        // Moving earlier: the block before the item slides forward.
        Shift {
            start: requested,
            end: current - 1,
            delta: 1,
        }
    };

    Ok(MovePlan::Reorder {
        shift,
        target: requested,
    })
}

/// Plans inserting an item at `requested` into a parent that currently holds
/// `sibling_count` children (the incoming item not included).
///
/// `requested == sibling_count` appends; anything beyond is out of range.
pub fn plan_insert(requested: Position, sibling_count: usize) -> Result<Shift, OrderingError> {
    check_requested(requested)?;

    if requested as usize > sibling_count {
        return Err(OrderingError::OutOfRange {
            requested,
            len: sibling_count,
        });
    }

    Ok(Shift {
        start: requested,
        end: Position::MAX,
        delta: 1,
    })
}

/// Plans closing the gap left by an item that vacated `vacated`.
pub fn plan_remove(vacated: Position) -> Shift {
    Shift {
        start: vacated.saturating_add(1),
        end: Position::MAX,
        delta: -1,
    }
}

/// Applies `shift` to every item it covers and returns how many moved.
pub fn apply_shift<'a, T, I>(items: I, shift: &Shift) -> usize
where
    T: Positioned + 'a,
    I: IntoIterator<Item = &'a mut T>,
{
    let mut moved = 0;
    for item in items {
        let position = item.position();
        if shift.contains(position) {
            item.set_position(shift.apply(position));
            moved += 1;
        }
    }
    moved
}

/// Returns true if `positions` is exactly `0..n` with no gaps or duplicates.
pub fn is_dense<I>(positions: I) -> bool
where
    I: IntoIterator<Item = Position>,
{
    let mut sorted: Vec<Position> = positions.into_iter().collect();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(index, position)| *position as usize == index && *position >= 0)
}
