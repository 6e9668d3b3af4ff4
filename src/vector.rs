use std::{
    fmt::Display,
    ops::{Add, Mul, Neg, Sub},
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub i: f32,
    pub j: f32,
    pub k: f32,
}

impl Vector {
    pub fn new(i: f32, j: f32, k: f32) -> Self {
        Self { i, j, k }
    }

    pub fn dot(self, other: Vector) -> f32 {
        (self.i * other.i) + (self.j * other.j) + (self.k * other.k)
    }

    /// Right-hand rule cross product.
    pub fn cross(self, other: Vector) -> Vector {
        Vector {
            i: (self.j * other.k) - (self.k * other.j),
            j: -((self.i * other.k) - (self.k * other.i)),
            k: (self.i * other.j) - (self.j * other.i),
        }
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, other: Vector) -> Vector {
        Vector::new(self.i + other.i, self.j + other.j, self.k + other.k)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, other: Vector) -> Vector {
        Vector::new(self.i - other.i, self.j - other.j, self.k - other.k)
    }
}

/// Componentwise product.
impl Mul for Vector {
    type Output = Vector;

    fn mul(self, other: Vector) -> Vector {
        Vector::new(self.i * other.i, self.j * other.j, self.k * other.k)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;

    fn mul(self, scalar: f32) -> Vector {
        Vector::new(self.i * scalar, self.j * scalar, self.k * scalar)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.i, -self.j, -self.k)
    }
}

impl Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ i: {:.2}, j: {:.2}, k: {:.2} }}", self.i, self.j, self.k)
    }
}
