//! Euler angles with an explicit axis order.
//!
//! Orders are intrinsic: `Xzy` means the rotation matrix is `Rx * Rz * Ry`.
//! Decomposition follows the usual matrix-based branches, zeroing the last
//! axis when the middle axis sits at ±90°.

use nalgebra::{UnitQuaternion, Vector3};
use std::f32::consts::{FRAC_PI_2, PI};

/// 0.9999999 in the gimbal test keeps asin() off the unstable edge.
const GIMBAL_EPS: f32 = 0.999_999_9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn unit(self) -> nalgebra::Unit<Vector3<f32>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EulerOrder {
    Xyz,
    Yxz,
    Zxy,
    Zyx,
    Yzx,
    Xzy,
}

impl EulerOrder {
    /// heading, pitch, bank の順
    pub fn axes(self) -> [Axis; 3] {
        match self {
            EulerOrder::Xyz => [Axis::X, Axis::Y, Axis::Z],
            EulerOrder::Yxz => [Axis::Y, Axis::X, Axis::Z],
            EulerOrder::Zxy => [Axis::Z, Axis::X, Axis::Y],
            EulerOrder::Zyx => [Axis::Z, Axis::Y, Axis::X],
            EulerOrder::Yzx => [Axis::Y, Axis::Z, Axis::X],
            EulerOrder::Xzy => [Axis::X, Axis::Z, Axis::Y],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub order: EulerOrder,
}

impl Euler {
    pub fn new(x: f32, y: f32, z: f32, order: EulerOrder) -> Self {
        Self { x, y, z, order }
    }

    pub fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    pub fn clamp_axis(&mut self, axis: Axis, min: f32, max: f32) {
        let v = self.get(axis);
        self.set(axis, v.clamp(min, max));
    }

    pub fn from_quaternion(q: &UnitQuaternion<f32>, order: EulerOrder) -> Self {
        let m = q.to_rotation_matrix();
        let m = m.matrix();
        let (m11, m12, m13) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
        let (m21, m22, m23) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
        let (m31, m32, m33) = (m[(2, 0)], m[(2, 1)], m[(2, 2)]);

        let (x, y, z) = match order {
            EulerOrder::Xyz => {
                let y = m13.clamp(-1.0, 1.0).asin();
                if m13.abs() < GIMBAL_EPS {
                    (f32::atan2(-m23, m33), y, f32::atan2(-m12, m11))
                } else {
                    (f32::atan2(m32, m22), y, 0.0)
                }
            }
            EulerOrder::Yxz => {
                let x = (-m23.clamp(-1.0, 1.0)).asin();
                if m23.abs() < GIMBAL_EPS {
                    (x, f32::atan2(m13, m33), f32::atan2(m21, m22))
                } else {
                    (x, f32::atan2(-m31, m11), 0.0)
                }
            }
            EulerOrder::Zxy => {
                let x = m32.clamp(-1.0, 1.0).asin();
                if m32.abs() < GIMBAL_EPS {
                    (x, f32::atan2(-m31, m33), f32::atan2(-m12, m22))
                } else {
                    (x, 0.0, f32::atan2(m21, m11))
                }
            }
            EulerOrder::Zyx => {
                let y = (-m31.clamp(-1.0, 1.0)).asin();
                if m31.abs() < GIMBAL_EPS {
                    (f32::atan2(m32, m33), y, f32::atan2(m21, m11))
                } else {
                    (0.0, y, f32::atan2(-m12, m22))
                }
            }
            EulerOrder::Yzx => {
                let z = m21.clamp(-1.0, 1.0).asin();
                if m21.abs() < GIMBAL_EPS {
                    (f32::atan2(-m23, m22), f32::atan2(-m31, m11), z)
                } else {
                    (0.0, f32::atan2(m13, m33), z)
                }
            }
            EulerOrder::Xzy => {
                let z = (-m12.clamp(-1.0, 1.0)).asin();
                if m12.abs() < GIMBAL_EPS {
                    (f32::atan2(m32, m22), f32::atan2(m13, m11), z)
                } else {
                    (f32::atan2(-m23, m33), 0.0, z)
                }
            }
        };

        Self { x, y, z, order }
    }

    pub fn to_quaternion(&self) -> UnitQuaternion<f32> {
        let [a, b, c] = self.order.axes();
        UnitQuaternion::from_axis_angle(&a.unit(), self.get(a))
            * UnitQuaternion::from_axis_angle(&b.unit(), self.get(b))
            * UnitQuaternion::from_axis_angle(&c.unit(), self.get(c))
    }

    /// heading/bank を [-π, π]、pitch を [-π/2, π/2] に収める
    pub fn canonicalize(&mut self) {
        let [heading, pitch, bank] = self.order.axes();
        self.clamp_axis(heading, -PI, PI);
        self.clamp_axis(pitch, -FRAC_PI_2, FRAC_PI_2);
        self.clamp_axis(bank, -PI, PI);
    }
}
