use glam::DVec2;

use super::bounding_box::BoundingBox;

const EPSILON: f64 = 1e-9;

fn cross(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

fn perpendicular(v: DVec2) -> DVec2 {
    DVec2::new(-v.y, v.x)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub a: DVec2,
    pub b: DVec2,
}

impl Segment {
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Segment { a, b }
    }

    pub fn is_degenerate(&self) -> bool {
        (self.b - self.a).length_squared() < EPSILON
    }

    pub fn closest_point(&self, point: DVec2) -> DVec2 {
        let ab = self.b - self.a;
        let length_squared = ab.length_squared();
        if length_squared < EPSILON {
            return self.a;
        }
        let t = ((point - self.a).dot(ab) / length_squared).clamp(0.0, 1.0);
        self.a + ab * t
    }

    // any unit vector perpendicular to the segment
    fn normal(&self) -> DVec2 {
        perpendicular(self.b - self.a).normalize_or_zero()
    }

    pub fn intersects(&self, other: &Segment) -> bool {
        ray_vs_segment(self.a, self.b - self.a, other).is_some()
    }
}

/// Where a ray first touched a shape. `fraction` is in `[0, 1]` along the cast
/// segment and `normal` faces back towards the ray origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayContact {
    pub fraction: f64,
    pub normal: DVec2,
}

/// How far a circle is sunk into a shape, and which way pushes it out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Penetration {
    pub normal: DVec2,
    pub depth: f64,
}

pub fn ray_vs_segment(origin: DVec2, delta: DVec2, segment: &Segment) -> Option<RayContact> {
    if segment.is_degenerate() || delta.length_squared() < EPSILON {
        return None;
    }

    let s = segment.b - segment.a;
    let denominator = cross(delta, s);
    if denominator.abs() < EPSILON {
        // parallel or collinear; grazing along a wall doesn't count as a hit
        return None;
    }

    let q = segment.a - origin;
    let t = cross(q, s) / denominator;
    let u = cross(q, delta) / denominator;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }

    let mut normal = segment.normal();
    if normal.dot(delta) > 0.0 {
        normal = -normal;
    }
    Some(RayContact {
        fraction: t,
        normal,
    })
}

pub fn ray_vs_circle(origin: DVec2, delta: DVec2, center: DVec2, radius: f64) -> Option<RayContact> {
    let a = delta.length_squared();
    if a < EPSILON {
        return None;
    }
    let f = origin - center;
    let c = f.length_squared() - radius * radius;
    if c < 0.0 {
        // started inside the circle
        return None;
    }
    let b = 2.0 * f.dot(delta);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let normal = (origin + delta * t - center).normalize_or_zero();
    Some(RayContact { fraction: t, normal })
}

pub fn point_in_polygon(point: DVec2, polygon: &[DVec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// A body's shape resolved into map coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldShape {
    Circle { center: DVec2, radius: f64 },
    Polygon(Vec<DVec2>),
    Chain { points: Vec<DVec2>, closed: bool },
}

impl WorldShape {
    pub fn segments(&self) -> Vec<Segment> {
        let (points, closed) = match self {
            WorldShape::Circle { .. } => return Vec::new(),
            WorldShape::Polygon(points) => (points, true),
            WorldShape::Chain { points, closed } => (points, *closed),
        };
        if points.len() < 2 {
            return Vec::new();
        }

        let mut segments: Vec<Segment> = points
            .windows(2)
            .map(|pair| Segment::new(pair[0], pair[1]))
            .collect();
        if closed && points.len() > 2 {
            segments.push(Segment::new(points[points.len() - 1], points[0]));
        }
        segments.retain(|segment| !segment.is_degenerate());
        segments
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            WorldShape::Circle { center, radius } => {
                BoundingBox::around(*center, DVec2::splat(*radius))
            }
            WorldShape::Polygon(points) | WorldShape::Chain { points, .. } => {
                BoundingBox::from_points(points)
            }
        }
    }

    // chains are edges only and enclose nothing
    pub fn contains_point(&self, point: DVec2) -> bool {
        match self {
            WorldShape::Circle { center, radius } => {
                center.distance_squared(point) <= radius * radius
            }
            WorldShape::Polygon(points) => point_in_polygon(point, points),
            WorldShape::Chain { .. } => false,
        }
    }

    pub fn cast_ray(&self, origin: DVec2, delta: DVec2) -> Option<RayContact> {
        match self {
            WorldShape::Circle { center, radius } => ray_vs_circle(origin, delta, *center, *radius),
            _ => self
                .segments()
                .iter()
                .filter_map(|segment| ray_vs_segment(origin, delta, segment))
                .min_by(|a, b| a.fraction.total_cmp(&b.fraction)),
        }
    }

    /// Contact of a circle against this shape, if they overlap.
    pub fn circle_contact(&self, center: DVec2, radius: f64) -> Option<Penetration> {
        match self {
            WorldShape::Circle {
                center: other_center,
                radius: other_radius,
            } => {
                let offset = center - *other_center;
                let distance = offset.length();
                let reach = radius + other_radius;
                if distance >= reach {
                    return None;
                }
                let normal = if distance < EPSILON {
                    DVec2::X
                } else {
                    offset / distance
                };
                Some(Penetration {
                    normal,
                    depth: reach - distance,
                })
            }
            _ => {
                let inside = self.contains_point(center);
                let (closest, segment) = self
                    .segments()
                    .into_iter()
                    .map(|segment| (segment.closest_point(center), segment))
                    .min_by(|(a, _), (b, _)| {
                        a.distance_squared(center)
                            .total_cmp(&b.distance_squared(center))
                    })?;
                let distance = closest.distance(center);

                if inside {
                    let normal = if distance < EPSILON {
                        segment.normal()
                    } else {
                        (closest - center) / distance
                    };
                    Some(Penetration {
                        normal,
                        depth: distance + radius,
                    })
                } else if distance < radius {
                    let normal = if distance < EPSILON {
                        segment.normal()
                    } else {
                        (center - closest) / distance
                    };
                    Some(Penetration {
                        normal,
                        depth: radius - distance,
                    })
                } else {
                    None
                }
            }
        }
    }

    pub fn overlaps(&self, other: &WorldShape, margin: f64) -> bool {
        if !self
            .bounding_box()
            .expanded(margin)
            .is_colliding(&other.bounding_box())
        {
            return false;
        }

        match (self, other) {
            (WorldShape::Circle { center, radius }, _) => {
                other.circle_contact(*center, radius + margin).is_some()
            }
            (_, WorldShape::Circle { center, radius }) => {
                self.circle_contact(*center, radius + margin).is_some()
            }
            _ => {
                let ours = self.segments();
                let theirs = other.segments();
                let edges_cross = ours
                    .iter()
                    .any(|a| theirs.iter().any(|b| a.intersects(b)));
                edges_cross
                    || theirs.first().map_or(false, |s| self.contains_point(s.a))
                    || ours.first().map_or(false, |s| other.contains_point(s.a))
            }
        }
    }
}
