//! Bounding volume hierarchy over triangle bounds
//!
//! A binary tree stored as a flat node array. Nodes refer to each other by
//! index and the root's parent is `-1`, so refit can walk towards the root
//! with plain array lookups. Leaves own a contiguous range of a triangle
//! permutation; each triangle remembers its owning leaf.
//!
//! Build is top-down: a node holding more than [`LEAF_SIZE`] triangles is
//! split on the longest axis of its centroid bounds at the midpoint of that
//! axis. If every centroid lands on one side, the range is sorted along the
//! axis and split at the middle index instead.

use std::cmp::Reverse;

use super::aabb::{inverse_direction, AABB};
use crate::foundation::math::Vec3;

/// Maximum triangles in a leaf
pub const LEAF_SIZE: usize = 4;

/// Leaf range or child pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Triangles `indices[start..start + count]`
    Leaf {
        /// First slot in the triangle permutation
        start: u32,
        /// Number of triangles
        count: u32,
    },
    /// Two child nodes
    Interior {
        /// Left child index
        left: u32,
        /// Right child index
        right: u32,
    },
}

/// A single BVH node
#[derive(Debug, Clone, PartialEq)]
pub struct BvhNode {
    /// Bounds of every triangle below this node
    pub bounds: AABB,
    /// Parent index, `-1` for the root
    pub parent: i32,
    /// Distance from the root
    pub depth: u32,
    /// Leaf range or children
    pub kind: NodeKind,
}

impl BvhNode {
    /// Is this node a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// Bounding volume hierarchy
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
    leaf_of: Vec<u32>,
}

impl Bvh {
    /// Build a hierarchy over the given triangle bounds. Returns `None` when
    /// there is nothing to build over.
    pub fn build(bounds: &[AABB]) -> Option<Self> {
        if bounds.is_empty() {
            return None;
        }

        let centroids: Vec<Vec3> = bounds.iter().map(AABB::center).collect();
        let mut indices: Vec<u32> = (0..bounds.len() as u32).collect();
        let mut nodes = vec![BvhNode {
            bounds: AABB::empty(),
            parent: -1,
            depth: 0,
            kind: NodeKind::Leaf {
                start: 0,
                count: bounds.len() as u32,
            },
        }];

        let mut stack = vec![0_usize];
        let mut interior = Vec::new();
        while let Some(node_index) = stack.pop() {
            let NodeKind::Leaf { start, count } = nodes[node_index].kind else {
                continue;
            };
            let (start, end) = (start as usize, (start + count) as usize);

            if end - start <= LEAF_SIZE {
                nodes[node_index].bounds = range_bounds(&indices[start..end], bounds);
                continue;
            }

            let mid = split_range(&mut indices[start..end], &centroids) + start;
            let depth = nodes[node_index].depth + 1;
            let left = nodes.len();
            for (child_start, child_end) in [(start, mid), (mid, end)] {
                nodes.push(BvhNode {
                    bounds: AABB::empty(),
                    parent: node_index as i32,
                    depth,
                    kind: NodeKind::Leaf {
                        start: child_start as u32,
                        count: (child_end - child_start) as u32,
                    },
                });
            }
            nodes[node_index].kind = NodeKind::Interior {
                left: left as u32,
                right: left as u32 + 1,
            };
            interior.push(node_index as u32);
            stack.push(left + 1);
            stack.push(left);
        }

        let mut leaf_of = vec![0_u32; bounds.len()];
        for (node_index, node) in nodes.iter().enumerate() {
            if let NodeKind::Leaf { start, count } = node.kind {
                for &tri in &indices[start as usize..(start + count) as usize] {
                    leaf_of[tri as usize] = node_index as u32;
                }
            }
        }

        let mut bvh = Self {
            nodes,
            indices,
            leaf_of,
        };
        bvh.merge_upwards(&mut interior);

        log::debug!(
            "BVH built: {} triangles, {} nodes, depth {}",
            bounds.len(),
            bvh.nodes.len(),
            bvh.max_depth()
        );
        Some(bvh)
    }

    /// Recompute bounds after the triangles in `changed` moved. `bounds` is
    /// the full, updated triangle bounds list. Topology is left untouched.
    ///
    /// Returns the number of nodes whose bounds were recomputed.
    pub fn refit(&mut self, changed: &[u32], bounds: &[AABB]) -> usize {
        let mut leaves: Vec<u32> = changed
            .iter()
            .filter_map(|&tri| self.leaf_of.get(tri as usize).copied())
            .collect();
        leaves.sort_unstable();
        leaves.dedup();

        for &leaf in &leaves {
            if let NodeKind::Leaf { start, count } = self.nodes[leaf as usize].kind {
                let range = &self.indices[start as usize..(start + count) as usize];
                self.nodes[leaf as usize].bounds = range_bounds(range, bounds);
            }
        }

        let mut marked = vec![false; self.nodes.len()];
        let mut ancestors = Vec::new();
        for &leaf in &leaves {
            let mut parent = self.nodes[leaf as usize].parent;
            while parent >= 0 && !marked[parent as usize] {
                marked[parent as usize] = true;
                ancestors.push(parent as u32);
                parent = self.nodes[parent as usize].parent;
            }
        }

        let refit = leaves.len() + ancestors.len();
        self.merge_upwards(&mut ancestors);
        log::trace!("BVH refit: {} triangles, {} nodes", changed.len(), refit);
        refit
    }

    /// Recompute interior nodes as the union of their children, deepest first
    fn merge_upwards(&mut self, interior: &mut [u32]) {
        interior.sort_unstable_by_key(|&n| Reverse(self.nodes[n as usize].depth));
        for &n in interior.iter() {
            if let NodeKind::Interior { left, right } = self.nodes[n as usize].kind {
                let merged = self.nodes[left as usize]
                    .bounds
                    .union(&self.nodes[right as usize].bounds);
                self.nodes[n as usize].bounds = merged;
            }
        }
    }

    /// Collect every triangle whose bounds overlap `query` into `out`.
    /// Returns the number of nodes visited.
    pub fn query_aabb(&self, query: &AABB, bounds: &[AABB], out: &mut Vec<u32>) -> usize {
        let mut visited = 0;
        let mut stack = vec![0_u32];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n as usize];
            visited += 1;
            if !node.bounds.intersects(query) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, count } => {
                    out.extend(
                        self.indices[start as usize..(start + count) as usize]
                            .iter()
                            .copied()
                            .filter(|&tri| bounds[tri as usize].intersects(query)),
                    );
                }
                NodeKind::Interior { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        visited
    }

    /// Depth-first ray traversal
    ///
    /// `hit_test(triangle, best)` is called for every triangle in a leaf the
    /// ray reaches and returns the hit distance if it is closer than `best`.
    /// Nodes whose slab entry lies beyond the current best are skipped.
    /// Returns the nearest `(triangle, distance)` and the nodes visited.
    pub fn traverse_ray<F>(
        &self,
        origin: &Vec3,
        direction: &Vec3,
        max_distance: f32,
        mut hit_test: F,
    ) -> (Option<(u32, f32)>, usize)
    where
        F: FnMut(u32, f32) -> Option<f32>,
    {
        let inv_dir = inverse_direction(direction);
        let mut best: Option<(u32, f32)> = None;
        let mut best_distance = max_distance;
        let mut visited = 0;

        let Some(root_entry) = self.nodes[0].bounds.intersect_ray_inv(origin, &inv_dir) else {
            return (None, 1);
        };
        let mut stack = vec![(0_u32, root_entry)];

        while let Some((n, entry)) = stack.pop() {
            if entry > best_distance {
                continue;
            }
            visited += 1;
            match self.nodes[n as usize].kind {
                NodeKind::Leaf { start, count } => {
                    for &tri in &self.indices[start as usize..(start + count) as usize] {
                        if let Some(t) = hit_test(tri, best_distance) {
                            if t <= best_distance {
                                best_distance = t;
                                best = Some((tri, t));
                            }
                        }
                    }
                }
                NodeKind::Interior { left, right } => {
                    let l = self.nodes[left as usize].bounds.intersect_ray_inv(origin, &inv_dir);
                    let r = self.nodes[right as usize].bounds.intersect_ray_inv(origin, &inv_dir);
                    // Push the farther child first so the nearer pops first
                    match (l, r) {
                        (Some(l), Some(r)) if l <= r => {
                            stack.push((right, r));
                            stack.push((left, l));
                        }
                        (Some(l), Some(r)) => {
                            stack.push((left, l));
                            stack.push((right, r));
                        }
                        (Some(l), None) => stack.push((left, l)),
                        (None, Some(r)) => stack.push((right, r)),
                        (None, None) => {}
                    }
                }
            }
        }
        (best, visited)
    }

    /// Every node contains its children, and every leaf contains its
    /// triangles' bounds
    pub fn contains_subtrees(&self, bounds: &[AABB]) -> bool {
        self.nodes.iter().all(|node| match node.kind {
            NodeKind::Leaf { start, count } => self.indices[start as usize..(start + count) as usize]
                .iter()
                .all(|&tri| node.bounds.contains(&bounds[tri as usize], 0.0)),
            NodeKind::Interior { left, right } => {
                node.bounds.contains(&self.nodes[left as usize].bounds, 0.0)
                    && node.bounds.contains(&self.nodes[right as usize].bounds, 0.0)
            }
        })
    }

    /// Bounds of the whole tree
    pub fn root_bounds(&self) -> AABB {
        self.nodes[0].bounds
    }

    /// Flat node array, root first
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Leaf node owning `triangle`
    pub fn leaf_of(&self, triangle: u32) -> Option<u32> {
        self.leaf_of.get(triangle as usize).copied()
    }

    /// Deepest node depth
    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

fn range_bounds(range: &[u32], bounds: &[AABB]) -> AABB {
    range
        .iter()
        .fold(AABB::empty(), |acc, &tri| acc.union(&bounds[tri as usize]))
}

/// Partition `range` in place and return the local split index, which is
/// always strictly inside the range.
fn split_range(range: &mut [u32], centroids: &[Vec3]) -> usize {
    let centroid_bounds = AABB::from_points(range.iter().map(|&tri| &centroids[tri as usize]));
    let axis = centroid_bounds.longest_axis();
    let split = 0.5 * (centroid_bounds.min[axis] + centroid_bounds.max[axis]);

    let mut i = 0;
    let mut j = range.len();
    while i < j {
        if centroids[range[i] as usize][axis] < split {
            i += 1;
        } else {
            j -= 1;
            range.swap(i, j);
        }
    }

    if i == 0 || i == range.len() {
        range.sort_unstable_by(|&a, &b| {
            centroids[a as usize][axis].total_cmp(&centroids[b as usize][axis])
        });
        range.len() / 2
    } else {
        i
    }
}
