/// Numeric encoding and decoding of vertex elements
pub mod codec;
/// Legacy GFB model (conversion input)
pub mod gfb;
/// Trinity model (conversion output)
pub mod trinity;
/// Vertex layout descriptors
pub mod vertex_format;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    /// Divide both corners by `divisor`.
    pub fn scaled(&self, divisor: f32) -> BoundingBox {
        BoundingBox {
            min: self.min.map(|c| c / divisor),
            max: self.max.map(|c| c / divisor),
        }
    }
}

/// Bounding sphere enclosing a [`BoundingBox`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sphere {
    pub center: [f32; 3],
    pub radius: f32,
}

impl Sphere {
    pub fn from_bounds(bounds: &BoundingBox) -> Sphere {
        let mut center = [0.0; 3];
        let mut extent_sq = 0.0;
        for axis in 0..3 {
            center[axis] = (bounds.min[axis] + bounds.max[axis]) / 2.0;
            let extent = bounds.max[axis] - bounds.min[axis];
            extent_sq += extent * extent;
        }
        Sphere {
            center,
            radius: f32::sqrt(extent_sq) / 2.0,
        }
    }
}
