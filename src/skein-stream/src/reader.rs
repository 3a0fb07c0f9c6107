use std::{
    cell::Cell,
    fmt,
    io::{BufReader, Read},
};

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

/// A node in a buffered JSON document.
///
/// Numbers keep their literal text from the document so that
/// consumers can parse them into whatever width they expect.
#[derive(Debug)]
pub enum Node {
    /// The `null` literal.
    Null,
    /// A `true` or `false` literal.
    Bool(bool),
    /// A number, exactly as written in the document.
    Number(String),
    /// A string literal.
    String(String),
    /// An ordered sequence of nodes.
    Array(Vec<Node>),
    /// An object with its members in document order.
    Object(Object),
}

impl Node {
    /// A short human-readable name of the node's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Array(_) => "array",
            Node::Object(_) => "object",
        }
    }

    /// Whether this node is the `null` literal.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }
}

/// A JSON object as an ordered list of [`Field`]s.
///
/// Duplicate member names are retained as they appear in the
/// document.
#[derive(Debug, Default)]
pub struct Object {
    fields: Vec<Field>,
}

impl Object {
    /// Finds the first member with the given name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterates over all members in document order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.fields.iter()
    }

    /// Returns the number of members in the object.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Indicates whether the object has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A named member of an [`Object`].
///
/// Each member carries a flag recording whether a consumer has
/// already taken its value.
#[derive(Debug)]
pub struct Field {
    name: String,
    value: Node,
    consumed: Cell<bool>,
}

impl Field {
    /// The member's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member's value, without marking it consumed.
    #[inline]
    pub fn value(&self) -> &Node {
        &self.value
    }

    /// Whether [`Field::consume`] was called on this member.
    #[inline]
    pub fn is_consumed(&self) -> bool {
        self.consumed.get()
    }

    /// Marks the member consumed and returns its value.
    ///
    /// Returns [`None`] when the member was consumed before.
    pub fn consume(&self) -> Option<&Node> {
        if self.consumed.replace(true) {
            None
        } else {
            Some(&self.value)
        }
    }
}

/// Buffers an entire JSON document from `reader` into memory.
///
/// Fails on malformed JSON and on trailing characters after the
/// document's root value.
pub fn read_document<R: Read>(reader: R) -> anyhow::Result<Node> {
    let mut de = serde_json::Deserializer::from_reader(BufReader::new(reader));
    let node = Node::deserialize(&mut de)?;
    de.end()?;

    Ok(node)
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

const NUMBER_TOKEN: &str = "$serde_json::private::Number";

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Bool(v))
    }

    // Only reached by deserializers other than serde_json's, which
    // hands out numbers through `visit_map` instead.
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Number(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(Node::Number(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(Node::Number(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(3));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }

        Ok(Node::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(3));
        while let Some(name) = map.next_key::<String>()? {
            // With `arbitrary_precision`, a number arrives as a map
            // with this single key, holding its literal source text.
            if fields.is_empty() && name == NUMBER_TOKEN {
                return map.next_value().map(Node::Number);
            }

            let value = map.next_value()?;
            fields.push(Field {
                name,
                value,
                consumed: Cell::new(false),
            });
        }

        Ok(Node::Object(Object { fields }))
    }
}
