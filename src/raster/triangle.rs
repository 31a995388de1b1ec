use crate::common::bounds::Bounds2i;
use crate::shading::{Varyings, VertexOutput};

/// A vertex after the perspective divide and viewport transform.
#[derive(Debug, Clone, Copy)]
struct WindowVertex<V> {
    /// Window x, y and depth in `[0, 1]`.
    p: glm::Vec3,
    inv_w: f32,
    /// Varyings divided by `w`, so they interpolate linearly in screen space.
    varyings_over_w: V,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Sample {
    pub weights: [f32; 3],
    pub covered: bool,
}

/// Edge function of `a -> b`, positive on the left side.
#[inline]
fn edge(a: &glm::Vec3, b: &glm::Vec3, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Top-left rule for counter-clockwise triangles with y pointing up.
#[inline]
fn is_top_left(a: &glm::Vec3, b: &glm::Vec3) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dy == 0.0 && dx < 0.0) || dy < 0.0
}

/// A triangle ready for rasterization, always wound counter-clockwise in window space.
#[derive(Debug, Clone)]
pub(super) struct TriangleSetup<V> {
    v: [WindowVertex<V>; 3],
    area: f32,
    top_left: [bool; 3],
    pub bounds: Bounds2i,
}

impl<V: Varyings> TriangleSetup<V> {
    /// Returns `None` for triangles that cannot produce fragments in `viewport`.
    pub fn new(vertices: [&VertexOutput<V>; 3], viewport: &Bounds2i) -> Option<Self> {
        let size = viewport.diagonal();
        let origin = viewport.p_min;

        let mut v = [None; 3];
        for (out, vertex) in v.iter_mut().zip(vertices.iter()) {
            let w = vertex.clip_position.w;
            if !(w > 0.0) {
                return None;
            }
            let ndc = vertex.clip_position.xyz() / w;
            let p = glm::vec3(
                (ndc.x * 0.5 + 0.5) * size.x as f32 + origin.x as f32,
                (ndc.y * 0.5 + 0.5) * size.y as f32 + origin.y as f32,
                ndc.z * 0.5 + 0.5,
            );
            if !p.iter().all(|c| c.is_finite()) {
                return None;
            }
            let inv_w = 1.0 / w;
            *out = Some(WindowVertex {
                p,
                inv_w,
                varyings_over_w: vertex.varyings.scaled(inv_w),
            });
        }
        let mut v = [v[0]?, v[1]?, v[2]?];

        let mut area = edge(&v[0].p, &v[1].p, v[2].p.x, v[2].p.y);
        if !(area.abs() > 0.0) {
            return None;
        }
        if area < 0.0 {
            v.swap(1, 2);
            area = -area;
        }

        let min_x = v.iter().map(|v| v.p.x).fold(f32::INFINITY, f32::min);
        let min_y = v.iter().map(|v| v.p.y).fold(f32::INFINITY, f32::min);
        let max_x = v.iter().map(|v| v.p.x).fold(f32::NEG_INFINITY, f32::max);
        let max_y = v.iter().map(|v| v.p.y).fold(f32::NEG_INFINITY, f32::max);

        // clamp in float space, tiny w pushes window coordinates past i32
        let clamp_x = |x: f32| {
            x.max(viewport.p_min.x as f32)
                .min(viewport.p_max.x as f32) as i32
        };
        let clamp_y = |y: f32| {
            y.max(viewport.p_min.y as f32)
                .min(viewport.p_max.y as f32) as i32
        };
        let bounds = Bounds2i::intersect(
            &Bounds2i::new(
                na::Point2::new(clamp_x(min_x.floor()), clamp_y(min_y.floor())),
                na::Point2::new(clamp_x(max_x.ceil() + 1.0), clamp_y(max_y.ceil() + 1.0)),
            ),
            viewport,
        );
        if bounds.is_empty() {
            return None;
        }

        let top_left = [
            is_top_left(&v[1].p, &v[2].p),
            is_top_left(&v[2].p, &v[0].p),
            is_top_left(&v[0].p, &v[1].p),
        ];

        Some(TriangleSetup {
            v,
            area,
            top_left,
            bounds,
        })
    }

    /// Barycentric weights at a window position, and whether the triangle owns it.
    pub fn sample(&self, px: f32, py: f32) -> Sample {
        let e = [
            edge(&self.v[1].p, &self.v[2].p, px, py),
            edge(&self.v[2].p, &self.v[0].p, px, py),
            edge(&self.v[0].p, &self.v[1].p, px, py),
        ];
        let covered = e
            .iter()
            .zip(self.top_left.iter())
            .all(|(&e, &top_left)| e > 0.0 || (e == 0.0 && top_left));

        Sample {
            weights: [e[0] / self.area, e[1] / self.area, e[2] / self.area],
            covered,
        }
    }

    /// Window depth, linear in screen space.
    pub fn depth(&self, weights: &[f32; 3]) -> f32 {
        weights
            .iter()
            .zip(self.v.iter())
            .map(|(w, v)| w * v.p.z)
            .sum()
    }

    /// Perspective-correct varyings.
    pub fn varyings(&self, weights: &[f32; 3]) -> V {
        let inv_w: f32 = weights
            .iter()
            .zip(self.v.iter())
            .map(|(w, v)| w * v.inv_w)
            .sum();
        V::blend(
            [
                &self.v[0].varyings_over_w,
                &self.v[1].varyings_over_w,
                &self.v[2].varyings_over_w,
            ],
            *weights,
        )
        .scaled(1.0 / inv_w)
    }
}
