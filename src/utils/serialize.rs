//! Bigint-safe wire serialization.
//!
//! Values embedded in JSON responses are first lowered into a [`Node`] tree
//! and then folded by a [`Visitor`]. [`HexJson`] renders every integer as a
//! `0x`-prefixed hexadecimal quantity so no precision is lost on clients that
//! parse JSON numbers as doubles.

use {
    alloy::primitives::{hex, Address, Bytes, U256},
    serde::{Serialize, Serializer},
    serde_json::{Map, Value},
};

/// Leaf values of a [`Node`] tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(U256),
    Bytes(Bytes),
    Address(Address),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(Vec<(String, Node)>),
}

impl Node {
    pub fn integer(value: impl Into<U256>) -> Self {
        Node::Scalar(Scalar::Integer(value.into()))
    }

    pub fn bytes(value: &Bytes) -> Self {
        Node::Scalar(Scalar::Bytes(value.clone()))
    }

    pub fn address(value: Address) -> Self {
        Node::Scalar(Scalar::Address(value))
    }

    pub fn mapping<K: Into<String>>(entries: impl IntoIterator<Item = (K, Node)>) -> Self {
        Node::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Fold the tree bottom-up. Sequence and mapping children are visited in
    /// order before their parent, so the output keeps the input's shape.
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Node::Scalar(scalar) => visitor.scalar(scalar),
            Node::Sequence(items) => {
                let items = items.iter().map(|item| item.accept(visitor)).collect();
                visitor.sequence(items)
            }
            Node::Mapping(entries) => {
                let entries = entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.accept(visitor)))
                    .collect();
                visitor.mapping(entries)
            }
        }
    }
}

pub trait Visitor {
    type Output;

    fn scalar(&mut self, scalar: &Scalar) -> Self::Output;
    fn sequence(&mut self, items: Vec<Self::Output>) -> Self::Output;
    fn mapping(&mut self, entries: Vec<(String, Self::Output)>) -> Self::Output;
}

/// Types that can be lowered into a [`Node`] tree.
pub trait ToNode {
    fn to_node(&self) -> Node;
}

impl ToNode for U256 {
    fn to_node(&self) -> Node {
        Node::integer(*self)
    }
}

impl ToNode for Bytes {
    fn to_node(&self) -> Node {
        Node::bytes(self)
    }
}

impl ToNode for Address {
    fn to_node(&self) -> Node {
        Node::address(*self)
    }
}

impl<T: ToNode> ToNode for Vec<T> {
    fn to_node(&self) -> Node {
        Node::Sequence(self.iter().map(ToNode::to_node).collect())
    }
}

impl<T: ToNode> ToNode for Option<T> {
    fn to_node(&self) -> Node {
        match self {
            Some(value) => value.to_node(),
            None => Node::Scalar(Scalar::Null),
        }
    }
}

/// Renders a [`Node`] tree as JSON with integers as hex quantities.
#[derive(Debug, Default, Clone, Copy)]
pub struct HexJson;

impl Visitor for HexJson {
    type Output = Value;

    fn scalar(&mut self, scalar: &Scalar) -> Value {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(value) => Value::Bool(*value),
            Scalar::Integer(value) => Value::String(format!("0x{value:x}")),
            Scalar::Bytes(value) => Value::String(hex::encode_prefixed(value)),
            Scalar::Address(value) => Value::String(value.to_checksum(None)),
            Scalar::Text(value) => Value::String(value.clone()),
        }
    }

    fn sequence(&mut self, items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    fn mapping(&mut self, entries: Vec<(String, Value)>) -> Value {
        Value::Object(entries.into_iter().collect::<Map<_, _>>())
    }
}

pub fn to_hex_json<T: ToNode + ?Sized>(value: &T) -> Value {
    value.to_node().accept(&mut HexJson)
}

/// `serialize_with` adapter for fields that must go through [`HexJson`].
pub fn serialize_hex_json<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: ToNode,
    S: Serializer,
{
    to_hex_json(value).serialize(serializer)
}
