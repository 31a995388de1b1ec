use super::bounds::Bounds2i;
use anyhow::Context;
use image::RgbaImage;
use itertools::Itertools;
use std::path::Path;

lazy_static::lazy_static! {
    pub static ref DEFAULT_CLEAR_COLOR: glm::Vec4 = glm::vec4(0.2, 0.2, 1.0, 1.0);
}

/// Depth a cleared film starts from; the far end of the window depth range.
pub const FAR_DEPTH: f32 = 1.0;

/// A rectangular piece of the film that can be shaded independently of its neighbours.
///
/// Pixels are addressed in window coordinates, with the origin in the lower left corner.
pub struct FilmTile {
    color: Vec<glm::Vec4>,
    depth: Vec<f32>,
    pixel_bounds: Bounds2i,
}

impl FilmTile {
    fn offset(&self, p: &na::Point2<i32>) -> usize {
        let width = self.pixel_bounds.p_max.x - self.pixel_bounds.p_min.x;
        ((p.x - self.pixel_bounds.p_min.x) + (p.y - self.pixel_bounds.p_min.y) * width) as usize
    }

    pub fn get_pixel_bounds(&self) -> Bounds2i {
        self.pixel_bounds
    }

    pub fn get_depth(&self, p: &na::Point2<i32>) -> f32 {
        self.depth[self.offset(p)]
    }

    pub fn get_pixel(&self, p: &na::Point2<i32>) -> glm::Vec4 {
        self.color[self.offset(p)]
    }

    pub fn set_pixel(&mut self, p: &na::Point2<i32>, color: glm::Vec4, depth: f32) {
        let offset = self.offset(p);
        self.color[offset] = color;
        self.depth[offset] = depth;
    }
}

fn num_pixels(resolution: &glm::UVec2) -> usize {
    resolution.x as usize * resolution.y as usize
}

/// Color and depth target of the rasterizer.
pub struct Film {
    pub resolution: glm::UVec2,
    color: Vec<glm::Vec4>,
    depth: Vec<f32>,
}

impl Film {
    pub fn new(resolution: &glm::UVec2) -> Self {
        let n = num_pixels(resolution);
        Film {
            resolution: *resolution,
            color: vec![*DEFAULT_CLEAR_COLOR; n],
            depth: vec![FAR_DEPTH; n],
        }
    }

    fn offset(&self, p: &na::Point2<i32>) -> usize {
        p.x as usize + p.y as usize * self.resolution.x as usize
    }

    /// Fills the color target and resets depth to the far plane.
    pub fn clear(&mut self, color: &glm::Vec4) {
        self.color.iter_mut().for_each(|c| *c = *color);
        self.depth.iter_mut().for_each(|d| *d = FAR_DEPTH);
    }

    pub fn get_pixel(&self, p: &na::Point2<i32>) -> glm::Vec4 {
        self.color[self.offset(p)]
    }

    pub fn get_depth(&self, p: &na::Point2<i32>) -> f32 {
        self.depth[self.offset(p)]
    }

    pub fn get_sample_bounds(&self) -> Bounds2i {
        Bounds2i::new(
            na::Point2::new(0, 0),
            na::Point2::new(self.resolution.x as i32, self.resolution.y as i32),
        )
    }

    /// Copies the current contents of `sample_bounds` so the tile can depth test against them.
    pub fn get_film_tile(&self, sample_bounds: &Bounds2i) -> Box<FilmTile> {
        let pixel_bounds = Bounds2i::intersect(sample_bounds, &self.get_sample_bounds());
        let pixels = (pixel_bounds.p_min.y..pixel_bounds.p_max.y)
            .cartesian_product(pixel_bounds.p_min.x..pixel_bounds.p_max.x)
            .map(|(y, x)| self.offset(&na::Point2::new(x, y)))
            .collect_vec();

        Box::new(FilmTile {
            color: pixels.iter().map(|&i| self.color[i]).collect(),
            depth: pixels.iter().map(|&i| self.depth[i]).collect(),
            pixel_bounds,
        })
    }

    pub fn merge_film_tile(&mut self, tile: Box<FilmTile>) {
        let pixel_bounds = tile.get_pixel_bounds();
        for (y, x) in (pixel_bounds.p_min.y..pixel_bounds.p_max.y)
            .cartesian_product(pixel_bounds.p_min.x..pixel_bounds.p_max.x)
        {
            let p = na::Point2::new(x, y);
            let offset = self.offset(&p);
            self.color[offset] = tile.get_pixel(&p);
            self.depth[offset] = tile.get_depth(&p);
        }
    }

    /// Converts to an 8 bit image with the first row at the top.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let width = self.resolution.x;
        let height = self.resolution.y;

        RgbaImage::from_fn(width, height, |x, y| {
            let c = self.get_pixel(&na::Point2::new(x as i32, (height - 1 - y) as i32));
            image::Rgba([
                to_byte(c.x),
                to_byte(c.y),
                to_byte(c.z),
                to_byte(c.w),
            ])
        })
    }

    pub fn save(&self, file_path: &Path) -> anyhow::Result<()> {
        self.to_rgba_image()
            .save(file_path)
            .with_context(|| format!("failed to save film to {:?}", file_path))
    }
}

/// `f32::max` discards NaN, so undefined fragments come out black.
fn to_byte(v: f32) -> u8 {
    (v.max(0.0).min(1.0) * 255.0).round() as u8
}
