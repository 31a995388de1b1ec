use crate::shading::{Varyings, VertexOutput};

/// Signed distance to the near plane `z = -w`; inside when non-negative.
#[inline]
fn near_distance(clip_position: &glm::Vec4) -> f32 {
    clip_position.z + clip_position.w
}

fn lerp_vertex<V: Varyings>(a: &VertexOutput<V>, b: &VertexOutput<V>, t: f32) -> VertexOutput<V> {
    VertexOutput {
        clip_position: glm::lerp(&a.clip_position, &b.clip_position, t),
        varyings: a.varyings.lerp(&b.varyings, t),
    }
}

/// Clips a triangle against the near plane and returns it as a fan of 0, 1 or 2 triangles.
pub(super) fn clip_near<V: Varyings>(triangle: [&VertexOutput<V>; 3]) -> Vec<[VertexOutput<V>; 3]> {
    let mut polygon: Vec<VertexOutput<V>> = Vec::with_capacity(4);

    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        let da = near_distance(&a.clip_position);
        let db = near_distance(&b.clip_position);

        if da >= 0.0 {
            polygon.push(*a);
        }
        if (da >= 0.0) != (db >= 0.0) {
            polygon.push(lerp_vertex(a, b, da / (da - db)));
        }
    }

    if polygon.len() < 3 {
        return vec![];
    }

    (1..polygon.len() - 1)
        .map(|i| [polygon[0], polygon[i], polygon[i + 1]])
        .collect()
}
