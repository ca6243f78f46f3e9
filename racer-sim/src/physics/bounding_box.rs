use glam::DVec2;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn from_vecs(min: DVec2, max: DVec2) -> BoundingBox {
        BoundingBox {
            min_x: min.x,
            max_x: max.x,
            min_y: min.y,
            max_y: max.y,
        }
    }

    pub fn around(center: DVec2, half_extents: DVec2) -> BoundingBox {
        Self::from_vecs(center - half_extents, center + half_extents)
    }

    // inverted box that any accum() will overwrite
    pub fn extremes() -> BoundingBox {
        BoundingBox {
            min_x: f64::MAX,
            max_x: f64::MIN,
            min_y: f64::MAX,
            max_y: f64::MIN,
        }
    }

    pub fn accum(&self, new: BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(new.min_x),
            max_x: self.max_x.max(new.max_x),
            min_y: self.min_y.min(new.min_y),
            max_y: self.max_y.max(new.max_y),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec2>) -> BoundingBox {
        points.into_iter().fold(Self::extremes(), |bounds, point| {
            bounds.accum(Self::from_vecs(*point, *point))
        })
    }

    pub fn expanded(&self, margin: f64) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x - margin,
            max_x: self.max_x + margin,
            min_y: self.min_y - margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn pos(&self) -> DVec2 {
        DVec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn size(&self) -> DVec2 {
        DVec2::new(self.max_x - self.min_x, self.max_y - self.min_y)
    }

    pub fn is_colliding(&self, other: &BoundingBox) -> bool {
        (self.min_x <= other.max_x && self.max_x >= other.min_x)
            && (self.min_y <= other.max_y && self.max_y >= other.min_y)
    }

    pub fn contains_point(&self, point: DVec2) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}
