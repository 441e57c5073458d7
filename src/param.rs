//! Typed value cells
//!
//! A [`Param`] holds one attribute or element-content value. Its type is
//! chosen once, from the type tag written in the schema, and every value it
//! ever holds (current and default) is of that kind. Values move in and out
//! of a cell as text: documents are parsed with [`Param::set_from_string`]
//! and serialized with [`Param::as_string`].

use crate::error::{Error, Result};
use crate::types::{Color, Pose, Quaternion, Time, ValueParseError, Vector2d, Vector2i, Vector3};
use std::fmt;
use std::sync::Arc;

/// The closed set of value kinds a cell can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `unsigned int`
    UnsignedInt,
    /// `uint64_t`
    Uint64,
    /// `double`
    Double,
    /// `float`
    Float,
    /// `char`
    Char,
    /// `string`
    String,
    /// `time`
    Time,
    /// `color`
    Color,
    /// `vector2i`
    Vector2i,
    /// `vector2d`
    Vector2d,
    /// `vector3`
    Vector3,
    /// `pose`
    Pose,
    /// `quaternion`
    Quaternion,
}

impl ValueKind {
    /// Resolve a schema type tag, including the legacy namespaced aliases
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name.trim() {
            "bool" => ValueKind::Bool,
            "int" => ValueKind::Int,
            "unsigned int" => ValueKind::UnsignedInt,
            "uint64_t" => ValueKind::Uint64,
            "double" => ValueKind::Double,
            "float" => ValueKind::Float,
            "char" => ValueKind::Char,
            "string" | "std::string" => ValueKind::String,
            "time" | "sdf::Time" => ValueKind::Time,
            "color" | "sdf::Color" => ValueKind::Color,
            "vector2i" | "sdf::Vector2i" | "ignition::math::Vector2i" => ValueKind::Vector2i,
            "vector2d" | "sdf::Vector2d" | "ignition::math::Vector2d" => ValueKind::Vector2d,
            "vector3" | "sdf::Vector3" | "ignition::math::Vector3d" => ValueKind::Vector3,
            "pose" | "Pose" | "sdf::Pose" | "ignition::math::Pose3d" => ValueKind::Pose,
            "quaternion" | "sdf::Quaternion" | "ignition::math::Quaterniond" => {
                ValueKind::Quaternion
            }
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UnsignedInt => "unsigned int",
            ValueKind::Uint64 => "uint64_t",
            ValueKind::Double => "double",
            ValueKind::Float => "float",
            ValueKind::Char => "char",
            ValueKind::String => "string",
            ValueKind::Time => "time",
            ValueKind::Color => "color",
            ValueKind::Vector2i => "vector2i",
            ValueKind::Vector2d => "vector2d",
            ValueKind::Vector3 => "vector3",
            ValueKind::Pose => "pose",
            ValueKind::Quaternion => "quaternion",
        }
    }

    /// The zero value of this kind
    pub fn zero(&self) -> ParamValue {
        match self {
            ValueKind::Bool => ParamValue::Bool(false),
            ValueKind::Int => ParamValue::Int(0),
            ValueKind::UnsignedInt => ParamValue::UnsignedInt(0),
            ValueKind::Uint64 => ParamValue::Uint64(0),
            ValueKind::Double => ParamValue::Double(0.0),
            ValueKind::Float => ParamValue::Float(0.0),
            ValueKind::Char => ParamValue::Char('\0'),
            ValueKind::String => ParamValue::String(String::new()),
            ValueKind::Time => ParamValue::Time(Time::default()),
            ValueKind::Color => ParamValue::Color(Color::default()),
            ValueKind::Vector2i => ParamValue::Vector2i(Vector2i::default()),
            ValueKind::Vector2d => ParamValue::Vector2d(Vector2d::default()),
            ValueKind::Vector3 => ParamValue::Vector3(Vector3::default()),
            ValueKind::Pose => ParamValue::Pose(Pose::default()),
            ValueKind::Quaternion => ParamValue::Quaternion(Quaternion::default()),
        }
    }

    /// Parse text into a value of this kind
    pub fn parse(&self, s: &str) -> std::result::Result<ParamValue, ValueParseError> {
        fn num<T: std::str::FromStr>(
            s: &str,
            type_name: &'static str,
        ) -> std::result::Result<T, ValueParseError> {
            s.parse::<T>().map_err(|_| ValueParseError {
                type_name,
                input: s.to_string(),
            })
        }

        let value = match self {
            ValueKind::Bool => match s.to_ascii_lowercase().as_str() {
                "1" | "true" => ParamValue::Bool(true),
                "0" | "false" => ParamValue::Bool(false),
                _ => {
                    return Err(ValueParseError {
                        type_name: "bool",
                        input: s.to_string(),
                    })
                }
            },
            ValueKind::Int => ParamValue::Int(num(s, "int")?),
            ValueKind::UnsignedInt => ParamValue::UnsignedInt(num(s, "unsigned int")?),
            ValueKind::Uint64 => ParamValue::Uint64(num(s, "uint64_t")?),
            ValueKind::Double => ParamValue::Double(num(s, "double")?),
            ValueKind::Float => ParamValue::Float(num(s, "float")?),
            ValueKind::Char => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => ParamValue::Char(c),
                    _ => {
                        return Err(ValueParseError {
                            type_name: "char",
                            input: s.to_string(),
                        })
                    }
                }
            }
            ValueKind::String => ParamValue::String(s.to_string()),
            ValueKind::Time => ParamValue::Time(s.parse()?),
            ValueKind::Color => ParamValue::Color(s.parse()?),
            ValueKind::Vector2i => ParamValue::Vector2i(s.parse()?),
            ValueKind::Vector2d => ParamValue::Vector2d(s.parse()?),
            ValueKind::Vector3 => ParamValue::Vector3(s.parse()?),
            ValueKind::Pose => ParamValue::Pose(s.parse()?),
            ValueKind::Quaternion => ParamValue::Quaternion(s.parse()?),
        };
        Ok(value)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value of one of the [`ValueKind`]s
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean
    Bool(bool),
    /// Signed 32-bit integer
    Int(i32),
    /// Unsigned 32-bit integer
    UnsignedInt(u32),
    /// Unsigned 64-bit integer
    Uint64(u64),
    /// Double precision float
    Double(f64),
    /// Single precision float
    Float(f32),
    /// Single character
    Char(char),
    /// Text
    String(String),
    /// Time
    Time(Time),
    /// Color
    Color(Color),
    /// Integer 2D vector
    Vector2i(Vector2i),
    /// Float 2D vector
    Vector2d(Vector2d),
    /// 3D vector
    Vector3(Vector3),
    /// Pose
    Pose(Pose),
    /// Quaternion
    Quaternion(Quaternion),
}

impl ParamValue {
    /// Kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            ParamValue::Bool(_) => ValueKind::Bool,
            ParamValue::Int(_) => ValueKind::Int,
            ParamValue::UnsignedInt(_) => ValueKind::UnsignedInt,
            ParamValue::Uint64(_) => ValueKind::Uint64,
            ParamValue::Double(_) => ValueKind::Double,
            ParamValue::Float(_) => ValueKind::Float,
            ParamValue::Char(_) => ValueKind::Char,
            ParamValue::String(_) => ValueKind::String,
            ParamValue::Time(_) => ValueKind::Time,
            ParamValue::Color(_) => ValueKind::Color,
            ParamValue::Vector2i(_) => ValueKind::Vector2i,
            ParamValue::Vector2d(_) => ValueKind::Vector2d,
            ParamValue::Vector3(_) => ValueKind::Vector3,
            ParamValue::Pose(_) => ValueKind::Pose,
            ParamValue::Quaternion(_) => ValueKind::Quaternion,
        }
    }

    /// Numeric view used by cross-kind casts
    fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::UnsignedInt(v) => Some(*v as f64),
            ParamValue::Uint64(v) => Some(*v as f64),
            ParamValue::Double(v) => Some(*v),
            ParamValue::Float(v) => Some(*v as f64),
            ParamValue::Char(c) => Some(*c as u32 as f64),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::UnsignedInt(v) => write!(f, "{}", v),
            ParamValue::Uint64(v) => write!(f, "{}", v),
            ParamValue::Double(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Char(v) => write!(f, "{}", v),
            ParamValue::String(v) => f.write_str(v),
            ParamValue::Time(v) => write!(f, "{}", v),
            ParamValue::Color(v) => write!(f, "{}", v),
            ParamValue::Vector2i(v) => write!(f, "{}", v),
            ParamValue::Vector2d(v) => write!(f, "{}", v),
            ParamValue::Vector3(v) => write!(f, "{}", v),
            ParamValue::Pose(v) => write!(f, "{}", v),
            ParamValue::Quaternion(v) => write!(f, "{}", v),
        }
    }
}

/// Rust types that can be read from and written to a [`Param`]
pub trait ParamType: Sized {
    /// Kind whose values map onto this type without conversion
    const KIND: ValueKind;

    /// Best-effort conversion from any value
    fn from_value(value: &ParamValue) -> Option<Self>;

    /// Wrap into a value of [`Self::KIND`]
    fn into_value(self) -> ParamValue;
}

macro_rules! numeric_param_type {
    ($ty:ty, $kind:ident) => {
        impl ParamType for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn from_value(value: &ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$kind(v) => Some(*v),
                    ParamValue::String(s) => s.trim().parse().ok(),
                    other => other.as_f64().map(|v| v as $ty),
                }
            }

            fn into_value(self) -> ParamValue {
                ParamValue::$kind(self)
            }
        }
    };
}

numeric_param_type!(i32, Int);
numeric_param_type!(u32, UnsignedInt);
numeric_param_type!(u64, Uint64);
numeric_param_type!(f64, Double);
numeric_param_type!(f32, Float);

macro_rules! compound_param_type {
    ($ty:ident) => {
        impl ParamType for $ty {
            const KIND: ValueKind = ValueKind::$ty;

            fn from_value(value: &ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$ty(v) => Some(*v),
                    ParamValue::String(s) => s.trim().parse().ok(),
                    _ => None,
                }
            }

            fn into_value(self) -> ParamValue {
                ParamValue::$ty(self)
            }
        }
    };
}

compound_param_type!(Time);
compound_param_type!(Color);
compound_param_type!(Vector2i);
compound_param_type!(Vector2d);
compound_param_type!(Vector3);
compound_param_type!(Pose);
compound_param_type!(Quaternion);

impl ParamType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bool(b) => Some(*b),
            // string-declared flags: only "true" and "1" read as true
            ParamValue::String(s) => Some(s == "true" || s == "1"),
            other => other.as_f64().map(|v| v != 0.0),
        }
    }

    fn into_value(self) -> ParamValue {
        ParamValue::Bool(self)
    }
}

impl ParamType for char {
    const KIND: ValueKind = ValueKind::Char;

    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Char(c) => Some(*c),
            ParamValue::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn into_value(self) -> ParamValue {
        ParamValue::Char(self)
    }
}

impl ParamType for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: &ParamValue) -> Option<Self> {
        Some(value.to_string())
    }

    fn into_value(self) -> ParamValue {
        ParamValue::String(self)
    }
}

/// Callback used by [`Param::update`] to refresh a value
pub type UpdateFn = Arc<dyn Fn() -> std::result::Result<ParamValue, String> + Send + Sync>;

/// A typed, string-convertible value cell
pub struct Param {
    key: String,
    type_name: String,
    kind: ValueKind,
    required: bool,
    set: bool,
    description: String,
    value: ParamValue,
    default: ParamValue,
    update_fn: Option<UpdateFn>,
}

impl Param {
    /// Create a cell whose default is parsed from `default`.
    ///
    /// Never fails: an unknown type tag falls back to the string kind and an
    /// unparsable default leaves the zero value, both with an error logged.
    pub fn new(
        key: impl Into<String>,
        type_name: impl Into<String>,
        default: &str,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let type_name = type_name.into();
        let kind = ValueKind::from_type_name(&type_name).unwrap_or_else(|| {
            tracing::error!(key = %key, type_name = %type_name, "unknown parameter type, storing as string");
            ValueKind::String
        });

        let value = match kind.parse(default.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "unable to init parameter value from default");
                kind.zero()
            }
        };

        Self {
            key,
            type_name,
            kind,
            required,
            set: false,
            description: description.into(),
            default: value.clone(),
            value,
            update_fn: None,
        }
    }

    /// Key (attribute name, or element name for content cells)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Type tag as written in the schema
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Kind of the stored values
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether the document must supply this value
    pub fn required(&self) -> bool {
        self.required
    }

    /// Whether a value has been parsed since construction or the last reset
    pub fn is_set(&self) -> bool {
        self.set
    }

    /// Human readable description from the schema
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replace the description
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Current value
    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// Default value
    pub fn default_value(&self) -> &ParamValue {
        &self.default
    }

    /// Current value in canonical text form
    pub fn as_string(&self) -> String {
        self.value.to_string()
    }

    /// Default value in canonical text form
    pub fn default_as_string(&self) -> String {
        self.default.to_string()
    }

    /// Parse `input` into the cell.
    ///
    /// Returns `false` (and logs) when the text does not parse; the current
    /// value is then left untouched.
    pub fn set_from_string(&mut self, input: &str) -> bool {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            if self.required {
                tracing::error!(key = %self.key, "empty string used when setting a required parameter");
                return false;
            }
            self.value = self.default.clone();
            return true;
        }

        let remapped = match trimmed.to_ascii_lowercase().as_str() {
            "true" => "1",
            "false" => "0",
            _ => trimmed,
        };

        match self.kind.parse(remapped) {
            Ok(v) => {
                self.value = v;
                self.set = true;
                true
            }
            Err(_) if trimmed == "inf" || trimmed == "-inf" => {
                tracing::info!(key = %self.key, value = %trimmed, "infinite value passed through without conversion");
                true
            }
            Err(_) => {
                tracing::error!(
                    error = %self.parse_failure(trimmed),
                    "unable to set parameter value"
                );
                false
            }
        }
    }

    /// Like [`Param::set_from_string`] but reporting the failure as an error
    pub fn try_set_from_string(&mut self, input: &str) -> Result<()> {
        if self.set_from_string(input) {
            Ok(())
        } else {
            Err(self.parse_failure(input.trim()))
        }
    }

    fn parse_failure(&self, input: &str) -> Error {
        Error::ParseFailure {
            key: self.key.clone(),
            value: input.to_string(),
            type_name: self.type_name.clone(),
        }
    }

    /// Set from a typed value by way of its text form
    pub fn set<T: ParamType>(&mut self, value: T) -> bool {
        let text = value.into_value().to_string();
        self.set_from_string(&text)
    }

    /// Read the current value as `T`, converting across kinds where possible
    pub fn get<T: ParamType>(&self) -> Result<T> {
        T::from_value(&self.value).ok_or_else(|| self.type_mismatch::<T>())
    }

    /// Read the default value as `T`
    pub fn get_default<T: ParamType>(&self) -> Result<T> {
        T::from_value(&self.default).ok_or_else(|| self.type_mismatch::<T>())
    }

    fn type_mismatch<T>(&self) -> Error {
        Error::TypeMismatch {
            key: self.key.clone(),
            type_name: self.type_name.clone(),
            requested: std::any::type_name::<T>(),
        }
    }

    /// Whether the cell holds exactly `T`'s kind
    pub fn is_type<T: ParamType>(&self) -> bool {
        self.kind == T::KIND
    }

    /// Restore the default and clear the set flag
    pub fn reset(&mut self) {
        self.value = self.default.clone();
        self.set = false;
    }

    /// Register the callback used by [`Param::update`]
    pub fn set_update_func<F>(&mut self, f: F)
    where
        F: Fn() -> std::result::Result<ParamValue, String> + Send + Sync + 'static,
    {
        self.update_fn = Some(Arc::new(f));
    }

    /// Refresh the value from the update callback, if one is registered.
    ///
    /// A failing callback, or one producing a value of another kind, is
    /// logged and leaves the value unchanged.
    pub fn update(&mut self) {
        let Some(update_fn) = self.update_fn.as_ref() else {
            return;
        };

        match update_fn() {
            Ok(v) if v.kind() == self.kind => self.value = v,
            Ok(v) => {
                tracing::error!(
                    key = %self.key,
                    expected = %self.kind,
                    found = %v.kind(),
                    "update callback returned a value of the wrong type"
                );
            }
            Err(e) => {
                tracing::error!(key = %self.key, error = %e, "unable to set value using update");
            }
        }
    }
}

/// Cloning snapshots the current value: the clone's default is the source's
/// *current* value, and the clone starts unset. The update callback is not
/// carried over.
impl Clone for Param {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            type_name: self.type_name.clone(),
            kind: self.kind,
            required: self.required,
            set: false,
            description: self.description.clone(),
            value: self.value.clone(),
            default: self.value.clone(),
            update_fn: None,
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("key", &self.key)
            .field("type_name", &self.type_name)
            .field("required", &self.required)
            .field("set", &self.set)
            .field("value", &self.value)
            .field("default", &self.default)
            .finish()
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parsed_at_construction() {
        let p = Param::new("size", "double", "1.5", false, "");
        assert_eq!(p.value(), &ParamValue::Double(1.5));
        assert!(!p.is_set());
        assert_eq!(p.default_as_string(), "1.5");
    }

    #[test]
    fn test_bad_default_yields_zero() {
        let p = Param::new("count", "int", "lots", false, "");
        assert_eq!(p.value(), &ParamValue::Int(0));
    }

    #[test]
    fn test_unknown_type_falls_back_to_string() {
        let p = Param::new("odd", "matrix4", "1 0 0 1", false, "");
        assert_eq!(p.kind(), ValueKind::String);
        assert_eq!(p.type_name(), "matrix4");
        assert_eq!(p.as_string(), "1 0 0 1");
    }

    #[test]
    fn test_bool_remap_is_case_insensitive() {
        let mut p = Param::new("static", "bool", "false", false, "");
        assert!(p.set_from_string("  TRUE "));
        assert_eq!(p.get::<bool>().unwrap(), true);
        assert!(p.set_from_string("False"));
        assert_eq!(p.get::<bool>().unwrap(), false);
        assert!(!p.set_from_string("yes"));
    }

    #[test]
    fn test_remap_applies_to_every_kind() {
        let mut p = Param::new("label", "string", "", false, "");
        assert!(p.set_from_string("true"));
        assert_eq!(p.as_string(), "1");
    }

    #[test]
    fn test_empty_string_required_fails() {
        let mut p = Param::new("name", "string", "", true, "");
        assert!(!p.set_from_string("   "));
        assert!(!p.is_set());
    }

    #[test]
    fn test_empty_string_optional_resets_value() {
        let mut p = Param::new("mass", "double", "1", false, "");
        assert!(p.set_from_string("3"));
        assert!(p.set_from_string(""));
        assert_eq!(p.get::<f64>().unwrap(), 1.0);
    }

    #[test]
    fn test_parse_failure_keeps_value() {
        let mut p = Param::new("mass", "double", "1", false, "");
        assert!(!p.set_from_string("heavy"));
        assert_eq!(p.get::<f64>().unwrap(), 1.0);
        assert!(!p.is_set());
    }

    #[test]
    fn test_comma_decimal_is_rejected_for_float() {
        let mut p = Param::new("scale", "float", "1.0", false, "");
        assert!(!p.set_from_string("2,5"));
        assert_eq!(p.get::<f32>().unwrap(), 1.0);
        assert!(p.set_from_string("2.5"));
        assert_eq!(p.get::<f32>().unwrap(), 2.5);
    }

    #[test]
    fn test_inf_is_accepted() {
        let mut d = Param::new("upper", "double", "0", false, "");
        assert!(d.set_from_string("inf"));
        assert_eq!(d.get::<f64>().unwrap(), f64::INFINITY);
        assert_eq!(d.as_string(), "inf");

        // an integer cannot hold it, but the token is still not fatal
        let mut i = Param::new("count", "int", "4", false, "");
        assert!(i.set_from_string("-inf"));
        assert_eq!(i.get::<i32>().unwrap(), 4);
        assert!(!i.set_from_string("nope"));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut p = Param::new("xyz", "vector3", "0 0 1", false, "");
        assert!(p.set_from_string("1 2 3"));
        assert!(p.is_set());
        p.reset();
        assert_eq!(p.as_string(), p.default_as_string());
        assert!(!p.is_set());
    }

    #[test]
    fn test_clone_default_is_current_value() {
        let mut p = Param::new("mass", "double", "1", false, "");
        assert!(p.set_from_string("7"));
        let mut c = p.clone();
        assert_eq!(c.default_as_string(), "7");
        assert!(!c.is_set());
        assert!(c.set_from_string("9"));
        c.reset();
        assert_eq!(c.as_string(), "7");
    }

    #[test]
    fn test_cross_type_get() {
        let p = Param::new("count", "int", "3", false, "");
        assert_eq!(p.get::<f64>().unwrap(), 3.0);
        assert_eq!(p.get::<String>().unwrap(), "3");
        assert!(p.get::<Pose>().is_err());
    }

    #[test]
    fn test_bool_from_string_declared_cell() {
        let p = Param::new("flag", "string", "1", false, "");
        assert!(p.get::<bool>().unwrap());
        let p = Param::new("flag", "string", "yes", false, "");
        assert!(!p.get::<bool>().unwrap());
    }

    #[test]
    fn test_is_type_is_exact() {
        let p = Param::new("count", "int", "3", false, "");
        assert!(p.is_type::<i32>());
        assert!(!p.is_type::<u32>());
        assert!(!p.is_type::<f64>());
    }

    #[test]
    fn test_typed_set() {
        let mut p = Param::new("pose", "pose", "0 0 0 0 0 0", false, "");
        assert!(p.set(Pose::new(1.0, 2.0, 3.0, 0.0, 0.0, 0.5)));
        assert_eq!(p.as_string(), "1 2 3 0 0 0.5");
        assert!(p.is_set());
    }

    #[test]
    fn test_update_callback() {
        let mut p = Param::new("time", "double", "0", false, "");
        p.set_update_func(|| Ok(ParamValue::Double(4.5)));
        p.update();
        assert_eq!(p.get::<f64>().unwrap(), 4.5);
    }

    #[test]
    fn test_failing_update_leaves_value() {
        let mut p = Param::new("time", "double", "2", false, "");
        p.set_update_func(|| Err("sensor offline".to_string()));
        p.update();
        assert_eq!(p.get::<f64>().unwrap(), 2.0);

        p.set_update_func(|| Ok(ParamValue::String("2.5".to_string())));
        p.update();
        assert_eq!(p.get::<f64>().unwrap(), 2.0);
    }

    #[test]
    fn test_try_set_reports_parse_failure() {
        let mut p = Param::new("xyz", "vector3", "0 0 1", false, "");
        let err = p.try_set_from_string("1 2").unwrap_err();
        assert!(matches!(err, Error::ParseFailure { ref key, .. } if key == "xyz"));
    }
}
