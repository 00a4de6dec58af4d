//! Type representation

use crate::Purity;
use derive_more::Display;
use qss_name::QualifiedName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Built-in types with no further structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Primitive {
    /// `Bool`
    Bool,
    /// `Int`
    Int,
    /// `String`
    String,
    /// `Text`, formatted user-facing text
    Text,
    /// `Entity`
    Entity,
    /// `Ratio`, a fractional number
    Ratio,
    /// `Col`, a colour
    Col,
    /// `Pos`, a position in the world
    Pos,
    /// `Stat`
    Stat,
    /// `Texture`
    Texture,
    /// `Player`
    Player,
    /// Any struct value
    AnyStruct,
    /// Placeholder for a type that could not be determined
    #[display("<unknown>")]
    Unknown,
    /// The absence of a value
    #[display("<nothing>")]
    Void,
}

impl Primitive {
    /// Every primitive type
    pub const ALL: [Self; 14] = [
        Self::Bool,
        Self::Int,
        Self::String,
        Self::Text,
        Self::Entity,
        Self::Ratio,
        Self::Col,
        Self::Pos,
        Self::Stat,
        Self::Texture,
        Self::Player,
        Self::AnyStruct,
        Self::Unknown,
        Self::Void,
    ];
}

/// The type of any value in a QSS program
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    /// A built-in type
    Primitive(Primitive),
    /// An instance of the named struct
    Struct(QualifiedName),
    /// A value viewed through the named trait
    Trait(QualifiedName),
    /// The implementing type inside a trait or impl block
    This,
    /// An optional value, written `T?`
    Maybe(Box<VariableType>),
    /// A list, written `[T]`
    List(Box<VariableType>),
    /// A map, written `{K => V}`
    Map {
        /// Key type
        key: Box<VariableType>,
        /// Value type
        value: Box<VariableType>,
    },
    /// A function
    Function(FunctionType),
}

impl VariableType {
    /// The sentinel for types that could not be determined
    pub const UNKNOWN: Self = Self::Primitive(Primitive::Unknown);
    /// The type of functions that return nothing
    pub const VOID: Self = Self::Primitive(Primitive::Void);
    /// `Bool`
    pub const BOOL: Self = Self::Primitive(Primitive::Bool);
    /// `Int`
    pub const INT: Self = Self::Primitive(Primitive::Int);
    /// `Ratio`
    pub const RATIO: Self = Self::Primitive(Primitive::Ratio);
    /// `String`
    pub const STRING: Self = Self::Primitive(Primitive::String);

    /// Wrap in `Maybe`
    #[must_use]
    pub fn maybe(inner: Self) -> Self {
        Self::Maybe(Box::new(inner))
    }

    /// Wrap in `List`
    #[must_use]
    pub fn list(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    /// Build a map type
    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Whether this is the unknown sentinel
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Unknown))
    }

    /// Whether this is the void type
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Void))
    }

    /// Whether `This` appears anywhere inside this type
    #[must_use]
    pub fn mentions_this(&self) -> bool {
        match self {
            Self::This => true,
            Self::Primitive(_) | Self::Struct(_) | Self::Trait(_) => false,
            Self::Maybe(inner) | Self::List(inner) => inner.mentions_this(),
            Self::Map { key, value } => key.mentions_this() || value.mentions_this(),
            Self::Function(function) => {
                function.return_type.mentions_this()
                    || function.params.iter().any(Self::mentions_this)
            }
        }
    }

    /// Replace every `This` with `this_type`
    #[must_use]
    pub fn replace_this(&self, this_type: &Self) -> Self {
        match self {
            Self::This => this_type.clone(),
            Self::Primitive(_) | Self::Struct(_) | Self::Trait(_) => self.clone(),
            Self::Maybe(inner) => Self::maybe(inner.replace_this(this_type)),
            Self::List(inner) => Self::list(inner.replace_this(this_type)),
            Self::Map { key, value } => {
                Self::map(key.replace_this(this_type), value.replace_this(this_type))
            }
            Self::Function(function) => Self::Function(FunctionType {
                params: function
                    .params
                    .iter()
                    .map(|param| param.replace_this(this_type))
                    .collect(),
                return_type: Box::new(function.return_type.replace_this(this_type)),
                ..function.clone()
            }),
        }
    }
}

impl From<Primitive> for VariableType {
    fn from(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }
}

impl From<FunctionType> for VariableType {
    fn from(function: FunctionType) -> Self {
        Self::Function(function)
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => write!(formatter, "{primitive}"),
            Self::Struct(name) | Self::Trait(name) => write!(formatter, "{name}"),
            Self::This => formatter.write_str("This"),
            Self::Maybe(inner) => write!(formatter, "{inner}?"),
            Self::List(element) => write!(formatter, "[{element}]"),
            Self::Map { key, value } => write!(formatter, "{{{key} => {value}}}"),
            Self::Function(function) => write!(formatter, "{function}"),
        }
    }
}

/// The type of a function value
///
/// Equality and hashing consider only the parameters, return type and purity; how a function
/// is declared (receiver style, owning trait, native body) does not change its type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionType {
    /// Whether the first parameter is a `this` receiver
    pub receiver_style: bool,
    /// Parameter types, receiver included
    pub params: Vec<VariableType>,
    /// Return type, [`VariableType::VOID`] if nothing is returned
    pub return_type: Box<VariableType>,
    /// Declared purity
    pub purity: Purity,
    /// The trait declaring this function, for trait functions
    pub container_trait: Option<QualifiedName>,
    /// Whether the body is provided natively by the runtime
    pub is_native: bool,
}

impl FunctionType {
    /// An impure, free-standing function type
    #[must_use]
    pub fn new(params: Vec<VariableType>, return_type: VariableType) -> Self {
        Self {
            receiver_style: false,
            params,
            return_type: Box::new(return_type),
            purity: Purity::Impure,
            container_trait: None,
            is_native: false,
        }
    }

    /// Set the purity
    #[must_use]
    pub fn with_purity(mut self, purity: Purity) -> Self {
        self.purity = purity;
        self
    }

    /// Mark the first parameter as a receiver
    #[must_use]
    pub fn with_receiver(mut self) -> Self {
        self.receiver_style = true;
        self
    }

    /// Mark as declared by `trait_name`
    #[must_use]
    pub fn in_trait(mut self, trait_name: QualifiedName) -> Self {
        self.container_trait = Some(trait_name);
        self
    }

    /// Whether this function is declared by a trait
    #[must_use]
    pub fn is_trait_function(&self) -> bool {
        self.container_trait.is_some()
    }
}

impl PartialEq for FunctionType {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
            && self.return_type == other.return_type
            && self.purity == other.purity
    }
}

impl Eq for FunctionType {}

impl Hash for FunctionType {
    fn hash<State: Hasher>(&self, state: &mut State) {
        self.params.hash(state);
        self.return_type.hash(state);
        self.purity.hash(state);
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.purity {
            Purity::Pure => "PureFunc",
            Purity::Eager => "EagerFunc",
            Purity::Ui => "UiFunc",
            Purity::Impure => "Func",
        };
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        write!(formatter, "{keyword}({})", params.join(", "))?;
        if !self.return_type.is_void() {
            write!(formatter, " -> {}", self.return_type)?;
        }
        Ok(())
    }
}
