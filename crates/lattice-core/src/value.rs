//! The uniform value model shared by options, collections and codecs.
//!
//! Every value a config tree can hold is one of the [`ConfigValue`] variants;
//! every option declares the shape it accepts through a [`ValueDescriptor`].
//! Codecs and the dotted-path update API validate candidate values against
//! the descriptor before committing them, so an invalid conversion is a
//! checked branch rather than a runtime cast failure.

use crate::node::ConfigNode;

// ─── Type tags ────────────────────────────────────────────────────────────────

/// The scalar types a leaf value can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// `bool`.
    Bool,
    /// `i64`.
    Int,
    /// `f64`.
    Float,
    /// `String`.
    Str,
}

impl ScalarKind {
    /// Human-readable name, used in log messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
        }
    }
}

/// The element type of a collection-valued option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Homogeneous scalar elements.
    Scalar(ScalarKind),
    /// Structured elements, each a config node subtree.
    Node,
}

/// The overall shape of an option's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A single scalar.
    Scalar(ScalarKind),
    /// A nested node subtree stored as a leaf value.
    Node,
    /// An ordered sequence of homogeneous elements.
    List(ElementKind),
}

// ─── ValueDescriptor ──────────────────────────────────────────────────────────

/// Identifies an option's runtime type (and, for collections, its element
/// type) so codecs and mutation checks can validate at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueDescriptor {
    kind: ValueKind,
}

impl ValueDescriptor {
    /// Descriptor for a scalar option.
    pub const fn scalar(kind: ScalarKind) -> Self {
        Self {
            kind: ValueKind::Scalar(kind),
        }
    }

    /// Descriptor for a node-valued option.
    pub const fn node() -> Self {
        Self {
            kind: ValueKind::Node,
        }
    }

    /// Descriptor for a collection-valued option.
    pub const fn list(element: ElementKind) -> Self {
        Self {
            kind: ValueKind::List(element),
        }
    }

    /// The declared value shape.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The declared element shape, for collection-valued options.
    pub fn element_kind(&self) -> Option<ElementKind> {
        match self.kind {
            ValueKind::List(element) => Some(element),
            _ => None,
        }
    }

    /// Returns `true` if `value` satisfies this descriptor.
    ///
    /// For collections every element is checked, so homogeneity is enforced
    /// on whole-value assignment as well as on individual inserts.
    pub fn accepts(&self, value: &ConfigValue) -> bool {
        match self.kind {
            ValueKind::Scalar(kind) => value.scalar_kind() == Some(kind),
            ValueKind::Node => matches!(value, ConfigValue::Node(_)),
            ValueKind::List(element) => match value {
                ConfigValue::List(items) => {
                    items.iter().all(|item| element_accepts(element, item))
                }
                _ => false,
            },
        }
    }
}

fn element_accepts(element: ElementKind, value: &ConfigValue) -> bool {
    match element {
        ElementKind::Scalar(kind) => value.scalar_kind() == Some(kind),
        ElementKind::Node => matches!(value, ConfigValue::Node(_)),
    }
}

// ─── ConfigValue ──────────────────────────────────────────────────────────────

/// A dynamically-tagged config value.
///
/// This is the currency of the codec boundary and of the dotted-path
/// [`resolve`](crate::node::ConfigNode::resolve) /
/// [`apply`](crate::node::ConfigNode::apply) API. Typed access goes through
/// the handles returned at declaration time instead.
#[derive(Debug, Clone)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An ordered sequence of homogeneous values.
    List(Vec<ConfigValue>),
    /// A node subtree stored as a leaf value.
    Node(ConfigNode),
}

impl ConfigValue {
    /// The scalar kind of this value, or `None` for lists and nodes.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Bool(_) => Some(ScalarKind::Bool),
            Self::Int(_) => Some(ScalarKind::Int),
            Self::Float(_) => Some(ScalarKind::Float),
            Self::Str(_) => Some(ScalarKind::Str),
            Self::List(_) | Self::Node(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&ConfigNode> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }
}

impl PartialEq for ConfigValue {
    /// Scalars and lists compare structurally; node values compare by
    /// identity (two values are equal only if they are the same subtree).
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a.same_node(b),
            _ => false,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

// ─── ScalarValue ──────────────────────────────────────────────────────────────

/// Conversion seam between host-facing typed handles and the tagged value
/// model. Implemented for the four scalar types an option can be declared
/// with.
pub trait ScalarValue: Clone + Send + Sync + 'static {
    /// The tag this type maps to.
    const KIND: ScalarKind;

    /// Wraps `self` in the matching [`ConfigValue`] variant.
    fn into_value(self) -> ConfigValue;

    /// Extracts a typed value, or `None` on a variant mismatch.
    fn from_value(value: &ConfigValue) -> Option<Self>;
}

impl ScalarValue for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn into_value(self) -> ConfigValue {
        ConfigValue::Bool(self)
    }

    fn from_value(value: &ConfigValue) -> Option<Self> {
        value.as_bool()
    }
}

impl ScalarValue for i64 {
    const KIND: ScalarKind = ScalarKind::Int;

    fn into_value(self) -> ConfigValue {
        ConfigValue::Int(self)
    }

    fn from_value(value: &ConfigValue) -> Option<Self> {
        value.as_int()
    }
}

impl ScalarValue for f64 {
    const KIND: ScalarKind = ScalarKind::Float;

    fn into_value(self) -> ConfigValue {
        ConfigValue::Float(self)
    }

    fn from_value(value: &ConfigValue) -> Option<Self> {
        value.as_float()
    }
}

impl ScalarValue for String {
    const KIND: ScalarKind = ScalarKind::Str;

    fn into_value(self) -> ConfigValue {
        ConfigValue::Str(self)
    }

    fn from_value(value: &ConfigValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}
