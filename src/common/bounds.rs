use std::fmt;

/// Half-open 2D box, `p_max` excluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TBounds2<T: na::Scalar> {
    pub p_min: na::Point2<T>,
    pub p_max: na::Point2<T>,
}

pub type Bounds2i = TBounds2<i32>;

impl<T: na::Scalar + na::ClosedSub + na::ClosedMul + Copy> TBounds2<T> {
    pub fn diagonal(&self) -> na::Vector2<T> {
        self.p_max.coords - self.p_min.coords
    }

    pub fn area(&self) -> T {
        let d = self.p_max.coords - self.p_min.coords;
        d.x * d.y
    }
}

impl Bounds2i {
    pub fn new(p_min: na::Point2<i32>, p_max: na::Point2<i32>) -> Self {
        Bounds2i { p_min, p_max }
    }

    pub fn is_empty(&self) -> bool {
        self.p_min.x >= self.p_max.x || self.p_min.y >= self.p_max.y
    }

    pub fn contains(&self, p: &na::Point2<i32>) -> bool {
        p.x >= self.p_min.x && p.x < self.p_max.x && p.y >= self.p_min.y && p.y < self.p_max.y
    }

    pub fn intersect(b1: &Bounds2i, b2: &Bounds2i) -> Bounds2i {
        Bounds2i {
            p_min: na::Point2::new(b1.p_min.x.max(b2.p_min.x), b1.p_min.y.max(b2.p_min.y)),
            p_max: na::Point2::new(b1.p_max.x.min(b2.p_max.x), b1.p_max.y.min(b2.p_max.y)),
        }
    }

    pub fn overlaps(b1: &Bounds2i, b2: &Bounds2i) -> bool {
        !Bounds2i::intersect(b1, b2).is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TBounds3<T: na::RealField> {
    pub p_min: na::Point3<T>,
    pub p_max: na::Point3<T>,
}

pub type Bounds3 = TBounds3<f32>;

pub fn min_p<T: na::RealField + Copy>(p1: &na::Point3<T>, p2: &na::Point3<T>) -> na::Point3<T> {
    na::Point3::new(
        na::RealField::min(p1.x, p2.x),
        na::RealField::min(p1.y, p2.y),
        na::RealField::min(p1.z, p2.z),
    )
}

pub fn max_p<T: na::RealField + Copy>(p1: &na::Point3<T>, p2: &na::Point3<T>) -> na::Point3<T> {
    na::Point3::new(
        na::RealField::max(p1.x, p2.x),
        na::RealField::max(p1.y, p2.y),
        na::RealField::max(p1.z, p2.z),
    )
}

impl<T: na::RealField + Copy> TBounds3<T> {
    pub fn new(p1: na::Point3<T>, p2: na::Point3<T>) -> Self {
        TBounds3 {
            p_min: min_p(&p1, &p2),
            p_max: max_p(&p1, &p2),
        }
    }

    /// Inverted box that any union replaces.
    pub fn empty() -> Self {
        let min_num = T::min_value().unwrap_or_else(T::zero);
        let max_num = T::max_value().unwrap_or_else(T::zero);

        TBounds3 {
            p_min: na::Point3::new(max_num, max_num, max_num),
            p_max: na::Point3::new(min_num, min_num, min_num),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.p_min.x > self.p_max.x || self.p_min.y > self.p_max.y || self.p_min.z > self.p_max.z
    }

    pub fn diagonal(&self) -> na::Vector3<T> {
        self.p_max.coords - self.p_min.coords
    }

    pub fn center(&self) -> na::Point3<T> {
        na::center(&self.p_min, &self.p_max)
    }

    pub fn union(b1: &TBounds3<T>, b2: &TBounds3<T>) -> TBounds3<T> {
        TBounds3 {
            p_min: min_p(&b1.p_min, &b2.p_min),
            p_max: max_p(&b1.p_max, &b2.p_max),
        }
    }

    pub fn union_p(b: &TBounds3<T>, p: &na::Point3<T>) -> TBounds3<T> {
        TBounds3 {
            p_min: min_p(&b.p_min, p),
            p_max: max_p(&b.p_max, p),
        }
    }

    pub fn transformed(&self, transform: &na::Matrix4<T>) -> TBounds3<T> {
        let corners = [
            na::Point3::new(self.p_min.x, self.p_min.y, self.p_min.z),
            na::Point3::new(self.p_max.x, self.p_min.y, self.p_min.z),
            na::Point3::new(self.p_min.x, self.p_max.y, self.p_min.z),
            na::Point3::new(self.p_min.x, self.p_min.y, self.p_max.z),
            na::Point3::new(self.p_max.x, self.p_max.y, self.p_min.z),
            na::Point3::new(self.p_max.x, self.p_min.y, self.p_max.z),
            na::Point3::new(self.p_min.x, self.p_max.y, self.p_max.z),
            na::Point3::new(self.p_max.x, self.p_max.y, self.p_max.z),
        ];

        corners.iter().fold(TBounds3::empty(), |b, p| {
            TBounds3::union_p(&b, &transform.transform_point(p))
        })
    }
}

impl fmt::Display for Bounds3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})-({}, {}, {})",
            self.p_min.x, self.p_min.y, self.p_min.z, self.p_max.x, self.p_max.y, self.p_max.z
        )
    }
}
