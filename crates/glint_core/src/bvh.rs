//! Bounding Volume Hierarchy over the scene's triangle array.
//!
//! The tree is stored as a flat node array in depth-first order: an interior
//! node's left child is the next slot, its right child lives at
//! `second_child_offset`. Construction reorders the triangle array in place
//! so leaves can address their primitives as a contiguous range.

use std::cmp::Ordering;

use glint_math::{Aabb, Ray, Vec3};

use crate::material::{Material, MaterialKind};
use crate::triangle::{HitInfo, Triangle};

/// Build stops splitting at this depth.
const MAX_DEPTH: u32 = 10;

/// Maximum primitives per leaf node before splitting.
const MAX_LEAF_SIZE: usize = 4;

/// Traversal stack capacity; a binary tree of depth 10 needs at most
/// two slots per level.
const STACK_CAPACITY: usize = 32;

/// Packed BVH node.
///
/// `payload` is the primitive offset for leaves and the second-child offset
/// for interior nodes, discriminated by `count` (0 means interior).
#[derive(Debug, Copy, Clone)]
pub struct BvhNode {
    pub aabb: Aabb,
    payload: u32,
    count: u16,
    split_axis: u8,
}

impl BvhNode {
    fn leaf(aabb: Aabb, offset: u32, count: u16) -> Self {
        Self {
            aabb,
            payload: offset,
            count,
            split_axis: 0,
        }
    }

    fn interior(aabb: Aabb, split_axis: u8) -> Self {
        Self {
            aabb,
            payload: 0,
            count: 0,
            split_axis,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.count != 0
    }

    /// Leaf primitive range `[start, end)`.
    pub fn primitive_range(&self) -> (usize, usize) {
        let start = self.payload as usize;
        (start, start + self.count as usize)
    }
}

/// Flat-array BVH. Built once per scene; immutable afterwards.
#[derive(Default, Debug)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
}

fn axis_value(v: Vec3, axis: usize) -> f32 {
    match axis {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}

fn bounds_of(triangles: &[Triangle]) -> Aabb {
    let mut bounds = Aabb::EMPTY;
    for triangle in triangles {
        bounds.include(&triangle.aabb());
    }
    bounds
}

impl Bvh {
    /// Build the hierarchy, reordering `triangles` in place.
    pub fn build(triangles: &mut [Triangle]) -> Self {
        let mut nodes = Vec::new();
        if !triangles.is_empty() {
            build_range(&mut nodes, triangles, 0, triangles.len(), 0);
        }
        log::debug!(
            "built BVH: {} nodes over {} triangles",
            nodes.len(),
            triangles.len()
        );
        Self { nodes }
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Find the nearest triangle intersection along the ray.
    ///
    /// The working ray's `max_t` shrinks monotonically as closer hits are
    /// found, which is what prunes far subtrees and gives the traversal its
    /// speedup.
    pub fn closest_hit(&self, triangles: &[Triangle], ray: &Ray) -> HitInfo {
        let mut ray = *ray;
        self.traverse(&mut ray, |ray, hit, start, end| {
            for index in start..end {
                let current = triangles[index].intersect(ray);
                if current.hit && current.t < hit.t {
                    *hit = current;
                    hit.triangle_index = index as u32;
                    ray.max_t = current.t;
                }
            }
            false
        })
    }

    /// Occlusion query: is any non-refractive triangle hit within
    /// `[0, ray.max_t]`? Refractive surfaces do not cast shadows. Exits on
    /// the first qualifying hit and never modifies `max_t`.
    pub fn any_hit(&self, triangles: &[Triangle], materials: &[Material], ray: &Ray) -> bool {
        let mut ray = *ray;
        let info = self.traverse(&mut ray, |ray, hit, start, end| {
            for index in start..end {
                let triangle = &triangles[index];
                if triangle.intersect(ray).hit {
                    let material = &materials[triangle.material_index as usize];
                    if material.kind != MaterialKind::Refractive {
                        hit.hit = true;
                        return true;
                    }
                }
            }
            false
        });
        info.hit
    }

    /// Stack-based traversal. The visitor receives leaf primitive ranges and
    /// returns true to stop early; the near child (with respect to the ray
    /// direction along the node's split axis) is pushed last so it pops
    /// first.
    fn traverse<F>(&self, ray: &mut Ray, mut visit: F) -> HitInfo
    where
        F: FnMut(&mut Ray, &mut HitInfo, usize, usize) -> bool,
    {
        let mut hit = HitInfo::default();
        if self.nodes.is_empty() {
            return hit;
        }

        let dir_is_negative = [
            ray.dir_n.x < 0.0,
            ray.dir_n.y < 0.0,
            ray.dir_n.z < 0.0,
        ];

        let mut stack = [0u32; STACK_CAPACITY];
        let mut top = 1usize;
        stack[0] = 0;

        while top > 0 {
            top -= 1;
            let index = stack[top] as usize;
            let node = &self.nodes[index];

            if !node.aabb.hit(ray) {
                continue;
            }

            if node.is_leaf() {
                let (start, end) = node.primitive_range();
                if visit(ray, &mut hit, start, end) {
                    return hit;
                }
            } else {
                let left = index as u32 + 1;
                let right = node.payload;
                let (near, far) = if dir_is_negative[node.split_axis as usize] {
                    (right, left)
                } else {
                    (left, right)
                };
                stack[top] = far;
                stack[top + 1] = near;
                top += 2;
            }
        }

        hit
    }
}

fn build_range(
    nodes: &mut Vec<BvhNode>,
    triangles: &mut [Triangle],
    start: usize,
    end: usize,
    depth: u32,
) {
    let bounds = bounds_of(&triangles[start..end]);
    let count = end - start;

    if depth >= MAX_DEPTH || count <= MAX_LEAF_SIZE {
        nodes.push(BvhNode::leaf(bounds, start as u32, count as u16));
        return;
    }

    // Median split along the widest axis; nth-element selection reorders the
    // range around the median centroid without fully sorting it.
    let axis = bounds.longest_axis();
    let mid = (start + end) / 2;
    triangles[start..end].select_nth_unstable_by(mid - start, |a, b| {
        axis_value(a.centroid(), axis)
            .partial_cmp(&axis_value(b.centroid(), axis))
            .unwrap_or(Ordering::Equal)
    });

    let interior_index = nodes.len();
    nodes.push(BvhNode::interior(bounds, axis as u8));

    build_range(nodes, triangles, start, mid, depth + 1);
    nodes[interior_index].payload = nodes.len() as u32;
    build_range(nodes, triangles, mid, end, depth + 1);
}
