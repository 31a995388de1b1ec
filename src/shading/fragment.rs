use super::uniforms::ShadingMode;

/// Lower bound of the shading factor, reached by normals perpendicular to the view axis.
pub const AMBIENT_TERM: f32 = 0.25;
/// Weight of `|n.z|` in the shading factor.
pub const VIEW_TERM: f32 = 0.75;

#[inline]
pub fn smooth_normal(varying_normal: &glm::Vec3) -> glm::Vec3 {
    glm::normalize(varying_normal)
}

/// Flat normal from the screen-space derivatives of the position.
///
/// Orientation follows the derivative directions and is not corrected towards the viewer.
#[inline]
pub fn flat_normal(dpdx: &glm::Vec3, dpdy: &glm::Vec3) -> glm::Vec3 {
    glm::normalize(&glm::cross(dpdx, dpdy))
}

pub fn resolve_normal(
    mode: ShadingMode,
    varying_normal: &glm::Vec3,
    dpdx: &glm::Vec3,
    dpdy: &glm::Vec3,
) -> glm::Vec3 {
    match mode {
        ShadingMode::Interpolated => smooth_normal(varying_normal),
        ShadingMode::Flat => flat_normal(dpdx, dpdy),
    }
}

/// `|n.z| * 0.75 + 0.25`, in `[0.25, 1.0]` for unit normals.
#[inline]
pub fn shading_factor(normal: &glm::Vec3) -> f32 {
    normal.z.abs() * VIEW_TERM + AMBIENT_TERM
}

/// Final fragment color for an already normalized normal.
pub fn shade(normal: &glm::Vec3, diffuse_color: &glm::Vec3) -> glm::Vec4 {
    let f = shading_factor(normal);
    glm::vec4(
        f * diffuse_color.x,
        f * diffuse_color.y,
        f * diffuse_color.z,
        1.0,
    )
}
