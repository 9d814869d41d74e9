//! Parsed GraphQL operation documents.
//!
//! A document is parsed once by the caller and reused across many executions.
//! The printed form is what goes on the wire.

use graphql_parser::query::{Definition, Document, OperationDefinition};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::DocumentError;

/// The kind of operation a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Returns the keyword used for this kind in GraphQL source.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed query or mutation document.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDocument {
    ast: Document<'static, String>,
    source: String,
}

impl OperationDocument {
    /// Parses GraphQL source into a document.
    pub fn parse(source: &str) -> Result<Self, DocumentError> {
        let ast = graphql_parser::parse_query::<String>(source)
            .map_err(|e| DocumentError::new(e.to_string()))?
            .into_static();
        let source = ast.to_string();
        Ok(Self { ast, source })
    }

    /// Returns the printed document sent upstream.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed document.
    pub fn ast(&self) -> &Document<'static, String> {
        &self.ast
    }

    /// Returns the name of the first named operation, if any.
    pub fn operation_name(&self) -> Option<&str> {
        self.operations().find_map(|op| match op {
            OperationDefinition::Query(q) => q.name.as_deref(),
            OperationDefinition::Mutation(m) => m.name.as_deref(),
            OperationDefinition::Subscription(s) => s.name.as_deref(),
            OperationDefinition::SelectionSet(_) => None,
        })
    }

    /// Returns the kind of the first operation in the document.
    pub fn operation_kind(&self) -> Option<OperationKind> {
        self.operations().next().map(|op| match op {
            OperationDefinition::Query(_) | OperationDefinition::SelectionSet(_) => {
                OperationKind::Query
            }
            OperationDefinition::Mutation(_) => OperationKind::Mutation,
            OperationDefinition::Subscription(_) => OperationKind::Subscription,
        })
    }

    fn operations(&self) -> impl Iterator<Item = &OperationDefinition<'static, String>> {
        self.ast.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
    }
}

impl FromStr for OperationDocument {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OperationDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for OperationDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.source)
    }
}
