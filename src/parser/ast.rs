//! Semantic node types produced by tree transformation

use serde::{Deserialize, Serialize};

/// Source location of a node. Used for diagnostics and for slicing raw
/// argument text out of the original source, never for identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line of the node's first character
    pub line: usize,
    /// 1-based column of the node's first character
    pub column: usize,
    /// Byte offset of the node's first character
    pub start: usize,
    /// Byte offset one past the node's last character
    pub stop: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
    Null,
}

/// Coerced literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    Class,
    Interface,
    Method,
    Enum,
    Property,
}

/// A call-like expression. `target` holds the textual receiver of a dotted
/// call; `assignment` holds the field/assignment node the call's result is
/// bound to, lifted here so queries never unwrap declaration wrappers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub location: Location,
    pub name: String,
    pub arguments: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Box<Node>>,
}

/// Semantic node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Id {
        location: Location,
        text: String,
    },
    Literal {
        location: Location,
        kind: LiteralKind,
        value: LiteralValue,
    },
    MethodCall(MethodCall),
    Field {
        type_name: String,
        children: Vec<Node>,
    },
    Assignment {
        children: Vec<Node>,
    },
    Member {
        kind: MemberKind,
        name: String,
    },
    /// Fallback for expression forms the model does not cover; preserves the
    /// raw source text verbatim.
    GenericExpression {
        location: Location,
        text: String,
    },
    /// Presence marker only
    Statement,
    /// Wrapper over zero or more children. A traversal that finds nothing
    /// modeled yields an empty one, never a null-like value.
    Block {
        children: Vec<Node>,
    },
}

impl Node {
    pub fn location(&self) -> Option<Location> {
        match self {
            Node::Id { location, .. }
            | Node::Literal { location, .. }
            | Node::GenericExpression { location, .. } => Some(*location),
            Node::MethodCall(call) => Some(call.location),
            _ => None,
        }
    }

    /// Node kinds that qualify as a modeled method parameter. Anything else
    /// is recorded verbatim as a `GenericExpression` by the visitor.
    pub fn is_atomic_argument(&self) -> bool {
        matches!(
            self,
            Node::Literal { .. } | Node::Id { .. } | Node::MethodCall(_) | Node::GenericExpression { .. }
        )
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Block { children } | Node::Field { children, .. } | Node::Assignment { children } => {
                children
            }
            _ => &[],
        }
    }
}
