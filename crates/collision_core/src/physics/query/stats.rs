//! Query diagnostics
//!
//! Counters accumulate across calls until [`CollisionQuery::reset_stats`].
//!
//! [`CollisionQuery::reset_stats`]: super::CollisionQuery::reset_stats

use std::cell::Cell;

use crate::spatial::AABB;

/// Snapshot of the query counters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QueryStats {
    /// Triangles that survived broad-phase pruning
    pub candidates: u64,
    /// Triangles run through the conservative-advancement sweep
    pub sweep_tests: u64,
    /// Distance evaluations spent advancing and bisecting sweeps
    pub sweep_iterations: u64,
    /// BVH nodes visited by any query
    pub nodes_visited: u64,
    /// Broad-phase box of the most recent sweep or overlap
    pub last_bounds: Option<AABB>,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    candidates: Cell<u64>,
    sweep_tests: Cell<u64>,
    sweep_iterations: Cell<u64>,
    nodes_visited: Cell<u64>,
    last_bounds: Cell<Option<AABB>>,
}

fn bump(cell: &Cell<u64>, amount: usize) {
    cell.set(cell.get() + amount as u64);
}

impl StatsCounters {
    pub(crate) fn add_candidates(&self, count: usize) {
        bump(&self.candidates, count);
    }

    pub(crate) fn add_sweep_test(&self) {
        bump(&self.sweep_tests, 1);
    }

    pub(crate) fn add_sweep_iterations(&self, count: usize) {
        bump(&self.sweep_iterations, count);
    }

    pub(crate) fn add_nodes(&self, count: usize) {
        bump(&self.nodes_visited, count);
    }

    pub(crate) fn set_bounds(&self, bounds: AABB) {
        self.last_bounds.set(Some(bounds));
    }

    pub(crate) fn snapshot(&self) -> QueryStats {
        QueryStats {
            candidates: self.candidates.get(),
            sweep_tests: self.sweep_tests.get(),
            sweep_iterations: self.sweep_iterations.get(),
            nodes_visited: self.nodes_visited.get(),
            last_bounds: self.last_bounds.get(),
        }
    }

    pub(crate) fn reset(&self) {
        self.candidates.set(0);
        self.sweep_tests.set(0);
        self.sweep_iterations.set(0);
        self.nodes_visited.set(0);
        self.last_bounds.set(None);
    }
}
