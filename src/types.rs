//! Domain value types
//!
//! Compound values that RML stores in attributes and element content:
//! times, colors, vectors, rotations and poses. Each type parses from and
//! formats to the whitespace-separated text form used in documents.
//! Number parsing never consults the host locale: `.` is the only decimal
//! separator.

use std::fmt;
use std::ops::{Add, Mul};
use std::str::FromStr;

/// Error produced when a domain value cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueParseError {
    /// Name of the type being parsed
    pub type_name: &'static str,
    /// Offending input
    pub input: String,
}

impl ValueParseError {
    fn new(type_name: &'static str, input: &str) -> Self {
        Self {
            type_name,
            input: input.to_string(),
        }
    }
}

impl fmt::Display for ValueParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} value [{}]", self.type_name, self.input)
    }
}

impl std::error::Error for ValueParseError {}

/// Split `s` on whitespace and parse exactly `N` numbers
fn parse_numbers<T: FromStr, const N: usize>(
    s: &str,
    type_name: &'static str,
) -> Result<[T; N], ValueParseError> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    if parts.len() != N {
        return Err(ValueParseError::new(type_name, s));
    }
    let mut values = Vec::with_capacity(N);
    for part in parts {
        values.push(
            part.parse::<T>()
                .map_err(|_| ValueParseError::new(type_name, s))?,
        );
    }
    values
        .try_into()
        .map_err(|_| ValueParseError::new(type_name, s))
}

/// Simulation time: seconds plus nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Time {
    /// Whole seconds
    pub sec: i32,
    /// Nanoseconds
    pub nsec: i32,
}

impl Time {
    /// Create a time value
    pub fn new(sec: i32, nsec: i32) -> Self {
        Self { sec, nsec }
    }
}

impl FromStr for Time {
    type Err = ValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [sec, nsec] = parse_numbers::<i32, 2>(s, "time")?;
        Ok(Self { sec, nsec })
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sec, self.nsec)
    }
}

/// RGBA color with float channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Create a color
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl FromStr for Color {
    type Err = ValueParseError;

    /// Accepts `r g b` (opaque) or `r g b a`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count = s.split_whitespace().count();
        match count {
            3 => {
                let [r, g, b] = parse_numbers::<f32, 3>(s, "color")?;
                Ok(Self::new(r, g, b, 1.0))
            }
            _ => {
                let [r, g, b, a] = parse_numbers::<f32, 4>(s, "color")?;
                Ok(Self::new(r, g, b, a))
            }
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.r, self.g, self.b, self.a)
    }
}

/// Two-component integer vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vector2i {
    /// X component
    pub x: i32,
    /// Y component
    pub y: i32,
}

impl Vector2i {
    /// Create a vector
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl FromStr for Vector2i {
    type Err = ValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [x, y] = parse_numbers::<i32, 2>(s, "vector2i")?;
        Ok(Self { x, y })
    }
}

impl fmt::Display for Vector2i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Two-component float vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2d {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
}

impl Vector2d {
    /// Create a vector
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl FromStr for Vector2d {
    type Err = ValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [x, y] = parse_numbers::<f64, 2>(s, "vector2d")?;
        Ok(Self { x, y })
    }
}

impl fmt::Display for Vector2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Three-component float vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vector3 {
    /// Create a vector
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Cross product
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl FromStr for Vector3 {
    type Err = ValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [x, y, z] = parse_numbers::<f64, 3>(s, "vector3")?;
        Ok(Self { x, y, z })
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// Rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// Scalar part
    pub w: f64,
    /// X of the vector part
    pub x: f64,
    /// Y of the vector part
    pub y: f64,
    /// Z of the vector part
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion from components
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Build from roll/pitch/yaw (fixed-axis X, Y, Z)
    pub fn from_euler(roll: f64, pitch: f64, yaw: f64) -> Self {
        let (sr, cr) = (roll * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sy, cy) = (yaw * 0.5).sin_cos();

        Self::new(
            cr * cp * cy + sr * sp * sy,
            sr * cp * cy - cr * sp * sy,
            cr * sp * cy + sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
        )
    }

    /// Roll/pitch/yaw of this rotation
    pub fn euler(&self) -> Vector3 {
        let q = self.normalized();
        let sinp = 2.0 * (q.w * q.y - q.z * q.x);
        let pitch = if sinp.abs() >= 1.0 {
            std::f64::consts::FRAC_PI_2.copysign(sinp)
        } else {
            sinp.asin()
        };
        let roll = (2.0 * (q.w * q.x + q.y * q.z))
            .atan2(1.0 - 2.0 * (q.x * q.x + q.y * q.y));
        let yaw = (2.0 * (q.w * q.z + q.x * q.y))
            .atan2(1.0 - 2.0 * (q.y * q.y + q.z * q.z));
        Vector3::new(roll, pitch, yaw)
    }

    /// Unit-length copy; the identity if the norm is zero
    pub fn normalized(&self) -> Self {
        let norm = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if norm == 0.0 {
            return Self::identity();
        }
        Self::new(self.w / norm, self.x / norm, self.y / norm, self.z / norm)
    }

    /// Rotate a vector by this quaternion
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        let q = self.normalized();
        let u = Vector3::new(q.x, q.y, q.z);
        let t = u.cross(&v);
        let t = Vector3::new(2.0 * t.x, 2.0 * t.y, 2.0 * t.z);
        let ut = u.cross(&t);
        Vector3::new(
            v.x + q.w * t.x + ut.x,
            v.y + q.w * t.y + ut.y,
            v.z + q.w * t.z + ut.z,
        )
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Quaternion {
        Quaternion::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }
}

impl FromStr for Quaternion {
    type Err = ValueParseError;

    /// Accepts `w x y z` or Euler angles `roll pitch yaw`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.split_whitespace().count() == 3 {
            let [roll, pitch, yaw] = parse_numbers::<f64, 3>(s, "quaternion")?;
            return Ok(Self::from_euler(roll, pitch, yaw));
        }
        let [w, x, y, z] = parse_numbers::<f64, 4>(s, "quaternion")?;
        Ok(Self::new(w, x, y, z))
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.w, self.x, self.y, self.z)
    }
}

/// Position plus orientation
///
/// The text form is `x y z roll pitch yaw`. The Euler angles are kept as
/// written so that formatting a parsed pose reproduces its input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// Translation
    pub pos: Vector3,
    /// Roll, pitch, yaw in radians
    pub rpy: Vector3,
}

impl Pose {
    /// Create a pose from translation and roll/pitch/yaw
    pub fn new(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            pos: Vector3::new(x, y, z),
            rpy: Vector3::new(roll, pitch, yaw),
        }
    }

    /// Create a pose from translation and rotation
    pub fn from_parts(pos: Vector3, rot: Quaternion) -> Self {
        Self {
            pos,
            rpy: rot.euler(),
        }
    }

    /// The orientation as a quaternion
    pub fn rot(&self) -> Quaternion {
        Quaternion::from_euler(self.rpy.x, self.rpy.y, self.rpy.z)
    }

    /// Express `child`, given relative to this pose, in this pose's parent frame
    pub fn compose(&self, child: &Pose) -> Pose {
        let rot = self.rot();
        Pose::from_parts(self.pos + rot.rotate_vector(child.pos), rot * child.rot())
    }
}

impl FromStr for Pose {
    type Err = ValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [x, y, z, roll, pitch, yaw] = parse_numbers::<f64, 6>(s, "pose")?;
        Ok(Self::new(x, y, z, roll, pitch, yaw))
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.pos, self.rpy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_vector3_parse_and_format() {
        let v: Vector3 = "1 2.5 -3".parse().unwrap();
        assert_eq!(v, Vector3::new(1.0, 2.5, -3.0));
        assert_eq!(v.to_string(), "1 2.5 -3");
    }

    #[test]
    fn test_vector3_rejects_wrong_arity() {
        assert!("1 2".parse::<Vector3>().is_err());
        assert!("1 2 3 4".parse::<Vector3>().is_err());
    }

    #[test]
    fn test_comma_decimal_is_rejected() {
        assert!("2,5 0 0".parse::<Vector3>().is_err());
    }

    #[test]
    fn test_color_alpha_defaults_to_one() {
        let c: Color = "0.1 0.2 0.3".parse().unwrap();
        assert_eq!(c.a, 1.0);
        let c: Color = "0.1 0.2 0.3 0.5".parse().unwrap();
        assert_eq!(c.a, 0.5);
    }

    #[test]
    fn test_time_parse() {
        let t: Time = "3 500".parse().unwrap();
        assert_eq!(t, Time::new(3, 500));
        assert_eq!(t.to_string(), "3 500");
    }

    #[test]
    fn test_quaternion_from_euler_roundtrip() {
        let q = Quaternion::from_euler(0.1, 0.2, 0.3);
        let e = q.euler();
        assert!(approx(e.x, 0.1));
        assert!(approx(e.y, 0.2));
        assert!(approx(e.z, 0.3));
    }

    #[test]
    fn test_quaternion_accepts_euler_text() {
        let q: Quaternion = "0 0 0".parse().unwrap();
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn test_rotate_vector_yaw() {
        let q = Quaternion::from_euler(0.0, 0.0, FRAC_PI_2);
        let v = q.rotate_vector(Vector3::new(1.0, 0.0, 0.0));
        assert!(approx(v.x, 0.0));
        assert!(approx(v.y, 1.0));
        assert!(approx(v.z, 0.0));
    }

    #[test]
    fn test_pose_compose() {
        let parent = Pose::new(1.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2);
        let child = Pose::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let composed = parent.compose(&child);
        assert!(approx(composed.pos.x, 1.0));
        assert!(approx(composed.pos.y, 1.0));
        assert!(approx(composed.rpy.z, FRAC_PI_2));
    }

    #[test]
    fn test_pose_text_roundtrip() {
        let p: Pose = "1 2 3 0.1 0.2 0.3".parse().unwrap();
        assert_eq!(p.to_string(), "1 2 3 0.1 0.2 0.3");
    }
}
