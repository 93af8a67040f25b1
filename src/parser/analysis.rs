//! Structural queries over a parsed script
//!
//! `ScriptAnalysis` is the seam between the open-ended semantic graph and
//! closed validation logic: lookups scan arbitrarily deep, and every failure
//! is typed so callers can tell "wrong script shape" from "internal
//! assumption violated".

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::ast::{LiteralKind, LiteralValue, MemberKind, MethodCall, Node};
use super::{parse_script, ParseError};

/* ===================== Error Types ===================== */

/// Typed failures raised by the parameter accessors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("argument {index} of '{call}' is not a boolean literal")]
    ParamType { call: String, index: usize },

    #[error("'{call}' has no argument at index {index}")]
    ParamIndex { call: String, index: usize },
}

/* ===================== Query Layer ===================== */

/// Method calls found in a script, split by where their definition lives.
#[derive(Debug, Clone, Default)]
pub struct MethodCalls {
    /// Calls to methods the script does not define itself
    pub external: Vec<MethodCall>,
    /// Calls bound to helpers declared inside the script
    pub internal: Vec<MethodCall>,
}

/// Wraps a built semantic node graph plus the original source text.
pub struct ScriptAnalysis {
    root: Node,
    source: String,
}

impl ScriptAnalysis {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Ok(Self {
            root: parse_script(source)?,
            source: source.to_string(),
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// All method calls found by a deep scan of the graph. Calls whose name
    /// matches a method declared in the script itself are classified
    /// internal; everything else is external.
    pub fn method_calls(&self) -> MethodCalls {
        let mut calls = Vec::new();
        let mut declared = HashSet::new();
        collect_calls(&self.root, &mut calls, &mut declared);

        let mut found = MethodCalls::default();
        for call in calls {
            if declared.contains(call.name.as_str()) {
                found.internal.push(call);
            } else {
                found.external.push(call);
            }
        }
        found
    }

    /// Group calls by exact name against a fixed expected-name list. Names
    /// absent from the source map to an empty list, never a missing key.
    pub fn call_dictionary(
        &self,
        calls: &[MethodCall],
        names: &[&str],
    ) -> HashMap<String, Vec<MethodCall>> {
        let mut dictionary: HashMap<String, Vec<MethodCall>> = names
            .iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();
        for call in calls {
            if let Some(group) = dictionary.get_mut(&call.name) {
                group.push(call.clone());
            }
        }
        dictionary
    }

    /// The value of argument `index`, required to be a boolean literal.
    pub fn boolean_param(&self, call: &MethodCall, index: usize) -> Result<bool, QueryError> {
        match call.arguments.get(index) {
            Some(Node::Literal {
                kind: LiteralKind::Boolean,
                value: LiteralValue::Bool(v),
                ..
            }) => Ok(*v),
            Some(_) => Err(QueryError::ParamType {
                call: call.name.clone(),
                index,
            }),
            None => Err(QueryError::ParamIndex {
                call: call.name.clone(),
                index,
            }),
        }
    }

    /// Raw source text of argument `index`, regardless of its modeled kind.
    pub fn expression_param(&self, call: &MethodCall, index: usize) -> Result<&str, QueryError> {
        let argument = call.arguments.get(index).ok_or_else(|| QueryError::ParamIndex {
            call: call.name.clone(),
            index,
        })?;
        match argument.location() {
            Some(location) => Ok(self.source[location.start..location.stop].trim()),
            None => Err(QueryError::ParamType {
                call: call.name.clone(),
                index,
            }),
        }
    }
}

/// Deep pre-order scan: calls are collected wherever they appear (including
/// inside other calls' arguments), and declared-method names are gathered
/// from member nodes along the way.
fn collect_calls(node: &Node, calls: &mut Vec<MethodCall>, declared: &mut HashSet<String>) {
    match node {
        Node::MethodCall(call) => {
            calls.push(call.clone());
            for argument in &call.arguments {
                collect_calls(argument, calls, declared);
            }
        }
        Node::Member {
            kind: MemberKind::Method,
            name,
        } => {
            declared.insert(name.clone());
        }
        _ => {
            for child in node.children() {
                collect_calls(child, calls, declared);
            }
        }
    }
}
