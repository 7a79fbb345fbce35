//! CPU ray picking against the scene graph.
//!
//! Each candidate is tested together with its whole subtree. A world-space
//! box test rejects most meshes before any triangle is touched; surviving
//! meshes are intersected triangle by triangle in their local space, so the
//! hit carries local coordinates and the interpolated texture coordinate.

use crate::scene::{Aabb, Mesh, SceneGraph, SurfaceId};
use glam::{Mat4, Vec2, Vec3};
use std::collections::HashSet;

// ========================================================================
// Ray
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize_or_zero();
        Self {
            origin,
            direction: if direction == Vec3::ZERO {
                Vec3::NEG_Z
            } else {
                direction
            },
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

// ========================================================================
// PickHit: one ray/primitive intersection
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Innermost node whose mesh was hit.
    pub surface: SurfaceId,
    pub distance: f32,
    pub point: Vec3,
    pub local_point: Vec3,
    pub uv: Option<Vec2>,
    pub triangle: usize,
}

/// Slab test. Returns the entry and exit distances along the ray.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<(f32, f32)> {
    let inv = ray.direction.recip();
    let t0 = (aabb.min - ray.origin) * inv;
    let t1 = (aabb.max - ray.origin) * inv;
    let near = t0.min(t1);
    let far = t0.max(t1);
    // A zero direction lane lying on a slab plane gives NaN, which f32::max
    // and f32::min drop.
    let t_enter = near.x.max(near.y).max(near.z);
    let t_exit = far.x.min(far.y).min(far.z);
    if t_exit >= t_enter.max(0.0) {
        Some((t_enter, t_exit))
    } else {
        None
    }
}

/// Möller–Trumbore, both faces. Returns `(t, u, v)` with barycentric
/// weights of `b` and `c`.
pub fn ray_triangle(origin: Vec3, direction: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<(f32, f32, f32)> {
    const EPSILON: f32 = 1e-7;
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    if t < 0.0 {
        return None;
    }
    Some((t, u, v))
}

// ========================================================================
// SpatialIndex
// ========================================================================

pub struct SpatialIndex<'a> {
    graph: &'a SceneGraph,
}

impl<'a> SpatialIndex<'a> {
    pub fn new(graph: &'a SceneGraph) -> Self {
        Self { graph }
    }

    /// All hits on the candidates and their descendants, nearest first.
    pub fn intersect(&self, ray: &Ray, candidates: &[SurfaceId]) -> Vec<PickHit> {
        let mut hits = Vec::new();
        let mut visited = HashSet::new();
        for candidate in candidates {
            for id in self.graph.subtree(*candidate) {
                if visited.insert(id) {
                    self.intersect_node(id, ray, &mut hits);
                }
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    pub fn nearest(&self, ray: &Ray, candidates: &[SurfaceId]) -> Option<PickHit> {
        self.intersect(ray, candidates).into_iter().next()
    }

    fn intersect_node(&self, id: SurfaceId, ray: &Ray, hits: &mut Vec<PickHit>) {
        let Some(mesh) = self.graph.mesh(id) else {
            return;
        };
        let Some(local_aabb) = mesh.local_aabb() else {
            return;
        };
        let world = self.graph.world_transform(id);
        if world.determinant().abs() < 1e-12 {
            return;
        }
        if ray_aabb(ray, &local_aabb.transformed(&world)).is_none() {
            return;
        }
        let (local_origin, local_direction) = local_ray(&world, ray);
        // Affine maps keep the ray parameter, so `t` is the world distance.
        intersect_mesh(mesh, local_origin, local_direction, |triangle, t, local_point, uv| {
            hits.push(PickHit {
                surface: id,
                distance: t,
                point: ray.at(t),
                local_point,
                uv,
                triangle,
            });
        });
    }
}

fn intersect_mesh(
    mesh: &Mesh,
    origin: Vec3,
    direction: Vec3,
    mut on_hit: impl FnMut(usize, f32, Vec3, Option<Vec2>),
) {
    for (triangle, [ia, ib, ic]) in mesh.triangles().enumerate() {
        let vertex = |i: u32| mesh.positions.get(i as usize).copied();
        let (Some(a), Some(b), Some(c)) = (vertex(ia), vertex(ib), vertex(ic)) else {
            continue;
        };
        let Some((t, u, v)) = ray_triangle(origin, direction, a, b, c) else {
            continue;
        };
        let uv = mesh.uvs.as_ref().and_then(|uvs| {
            let (ua, ub, uc) = (
                uvs.get(ia as usize)?,
                uvs.get(ib as usize)?,
                uvs.get(ic as usize)?,
            );
            Some(*ua * (1.0 - u - v) + *ub * u + *uc * v)
        });
        on_hit(triangle, t, origin + direction * t, uv);
    }
}

/// World-space ray transformed into a node's local frame.
fn local_ray(world: &Mat4, ray: &Ray) -> (Vec3, Vec3) {
    let inverse = world.inverse();
    (
        inverse.transform_point3(ray.origin),
        inverse.transform_vector3(ray.direction),
    )
}

// ========================================================================
// Tests
// ========================================================================
