//! Defines a spatial 3-vector: (x, y, z)

use std::ops::{Add, Sub, Mul, Index};

/// A three-vector, used for both positions (pc) and velocities (km/s)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThreeVector {
    x: f64,
    y: f64,
    z: f64,
}

impl ThreeVector {
    /// Creates a new three-vector with the specified components.
    pub fn new(x: f64, y: f64, z: f64) -> ThreeVector {
        ThreeVector {x, y, z}
    }

    /// Returns the squared magnitude of the three-vector.
    pub fn norm_sqr(self) -> f64 {
        self * self
    }

    /// Returns the magnitude of the three-vector.
    pub fn norm(self) -> f64 {
        self.norm_sqr().sqrt()
    }
}

impl Index<i32> for ThreeVector {
    type Output = f64;
    fn index(&self, index: i32) -> &Self::Output {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("index out of bounds: a three-vector has 3 components but the index is {}", index),
        }
    }
}

impl Add for ThreeVector {
    type Output = ThreeVector;
    fn add(self, other: ThreeVector) -> ThreeVector {
        ThreeVector {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for ThreeVector {
    type Output = ThreeVector;
    fn sub(self, other: ThreeVector) -> ThreeVector {
        ThreeVector {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

/// Scalar product of two three-vectors
impl Mul for ThreeVector {
    type Output = f64;
    fn mul(self, other: ThreeVector) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl Mul<ThreeVector> for f64 {
    type Output = ThreeVector;
    fn mul(self, other: ThreeVector) -> ThreeVector {
        ThreeVector {
            x: self * other.x,
            y: self * other.y,
            z: self * other.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norms() {
        let v = ThreeVector::new(3.0, 4.0, 12.0);
        assert_eq!(v.norm_sqr(), 169.0);
        assert_eq!(v.norm(), 13.0);
    }

    #[test]
    fn arithmetic() {
        let a = ThreeVector::new(1.0, 2.0, 3.0);
        let b = ThreeVector::new(-1.0, 0.5, 2.0);
        assert_eq!(a + b, ThreeVector::new(0.0, 2.5, 5.0));
        assert_eq!(a - b, ThreeVector::new(2.0, 1.5, 1.0));
        assert_eq!(a * b, 6.0);
        assert_eq!(2.0 * a, ThreeVector::new(2.0, 4.0, 6.0));
        assert_eq!(a[1], 2.0);
    }
}
