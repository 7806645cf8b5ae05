// THEORY:
// A `Kernel` is the spatial half of the neighborhood fitness: a fixed list of
// offsets around a pixel together with how much each neighbor counts. Near
// neighbors count most. Weight falls off as `1 / (d^2 + EPSILON)` where `d` is
// the offset's Euclidean length divided by the radius, so the shape of the
// falloff is the same at every radius and `EPSILON` caps the weight of the
// immediate neighbors. The origin is never part of the kernel.

/// Keeps the weight of the closest neighbors finite and bounded.
const EPSILON: f64 = 0.2;

/// One neighbor offset and its weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelElement {
    pub dx: isize,
    pub dy: isize,
    pub weight: f64,
}

/// An immutable set of weighted neighbor offsets.
#[derive(Debug, Clone)]
pub struct Kernel {
    radius: usize,
    elements: Vec<KernelElement>,
}

impl Kernel {
    /// Every offset in the `(2r + 1)^2` square except the origin.
    pub fn new(radius: usize) -> Self {
        let r = radius as isize;
        let mut elements = Vec::with_capacity((2 * radius + 1).pow(2).saturating_sub(1));
        for dx in -r..=r {
            for dy in -r..=r {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let distance = (dx as f64).hypot(dy as f64) / radius as f64;
                elements.push(KernelElement {
                    dx,
                    dy,
                    weight: 1.0 / (distance * distance + EPSILON),
                });
            }
        }
        Self { radius, elements }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn elements(&self) -> &[KernelElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
