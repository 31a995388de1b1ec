pub mod bounds;
pub mod film;
pub mod mesh;
pub mod shapes;

lazy_static::lazy_static! {
    pub static ref DEFAULT_RESOLUTION: glm::UVec2 = glm::vec2(640, 480);
}
