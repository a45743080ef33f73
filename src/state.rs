use std::fmt;

use serde::{Deserialize, Serialize};

/// A pixel position in image-space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// The point list of one session together with its history stacks.
///
/// A point that is currently in `points` is never also held by either stack.
#[derive(Clone, Debug, Default)]
pub struct AnnotationState {
    points: Vec<Point>,
    /// Every point removed by `undo` or `replace`, most recent last.
    undo_stack: Vec<Point>,
    /// Points removed by `undo` that `redo` can bring back, most recent last.
    redo_stack: Vec<Point>,
}

impl AnnotationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session from already known points (e.g. a coordinate file).
    pub fn with_points(points: Vec<Point>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn undo_stack(&self) -> &[Point] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[Point] {
        &self.redo_stack
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Appends a point. The redo stack is left alone, so a later `redo` can
    /// still bring back a point undone before this call.
    pub fn add(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Replaces the whole list with `point`, returning the point it displaced.
    /// Used by single-point sessions where a click re-selects.
    pub fn replace(&mut self, point: Point) -> Option<Point> {
        let previous = self.points.pop();
        self.undo_stack.extend(self.points.drain(..));
        if let Some(previous) = previous {
            self.undo_stack.push(previous);
        }
        self.points.push(point);
        previous
    }

    /// Removes the last point. Returns `None` and changes nothing when the
    /// list is empty.
    pub fn undo(&mut self) -> Option<Point> {
        let point = self.points.pop()?;
        self.undo_stack.push(point);
        self.redo_stack.push(point);
        Some(point)
    }

    /// Re-appends the most recently undone point, if any.
    pub fn redo(&mut self) -> Option<Point> {
        let point = self.redo_stack.pop()?;
        self.points.push(point);
        Some(point)
    }

    /// Like `redo`, but the restored point replaces the current list.
    /// Single-point sessions use this so the list never grows past one entry.
    pub fn redo_replace(&mut self) -> Option<Point> {
        let point = self.redo_stack.pop()?;
        self.replace(point);
        Some(point)
    }

    /// Empties the list and the redo stack. Returns `false` when the list was
    /// already empty, in which case nothing changes.
    ///
    /// Clearing is not undoable: the removed points do not go to the redo
    /// stack.
    pub fn clear_all(&mut self) -> bool {
        if self.points.is_empty() {
            return false;
        }
        self.points.clear();
        self.redo_stack.clear();
        true
    }

    pub fn finalize(self) -> Vec<Point> {
        self.points
    }
}
