//! Virtual category rules.
//!
//! A virtual category's membership is a rule tree rather than explicit product assignment.
//! [`VirtualRuleResolver`] compiles the tree into a [`cq_query::QueryNode`], following
//! references to other categories and cutting reference cycles with an
//! [`ExcludedCategories`] set.

mod excluded;
mod resolver;
mod store;

use std::{fmt, str::FromStr};

use cq_query::FieldValue;
pub use excluded::ExcludedCategories;
pub use resolver::{VirtualRuleResolver, condition_query};
use serde::{Deserialize, Serialize};
use serde_with::{OneOrMany, serde_as};
pub use store::{CategoryStore, InMemoryCategoryStore};

use crate::ParseError;

/// A category record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Category {
    /// Category id.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether membership is computed from `rule`.
    #[serde(default)]
    pub is_virtual: bool,
    /// Membership rule of a virtual category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<VirtualRule>,
    /// Category whose members bound the virtual membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_root: Option<u64>,
}

impl Category {
    /// Creates a plain (non-virtual) category.
    pub fn plain(id: u64) -> Self {
        Self {
            id,
            name: String::new(),
            is_virtual: false,
            rule: None,
            virtual_root: None,
        }
    }

    /// Creates a virtual category with a rule.
    pub fn virtual_category(id: u64, rule: VirtualRule) -> Self {
        Self {
            id,
            name: String::new(),
            is_virtual: true,
            rule: Some(rule),
            virtual_root: None,
        }
    }
}

/// A node of a rule tree.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VirtualRule {
    /// Combination of child rules.
    Combine {
        /// How children combine.
        aggregator: Aggregator,
        /// Whether children must be true (`false` inverts them).
        #[serde(default = "default_expected")]
        expected: bool,
        /// Child rules.
        #[serde(default)]
        children: Vec<VirtualRule>,
    },
    /// Attribute comparison.
    Condition(Condition),
    /// Membership of other categories.
    Category {
        /// Referenced category ids.
        #[serde_as(as = "OneOrMany<_>")]
        ids: Vec<u64>,
    },
}

/// Default for `Combine.expected`.
fn default_expected() -> bool {
    true
}

impl VirtualRule {
    /// Creates an `All` combination.
    pub fn all(children: Vec<Self>) -> Self {
        Self::Combine {
            aggregator: Aggregator::All,
            expected: true,
            children,
        }
    }

    /// Creates an `Any` combination.
    pub fn any(children: Vec<Self>) -> Self {
        Self::Combine {
            aggregator: Aggregator::Any,
            expected: true,
            children,
        }
    }

    /// Creates a reference to other categories.
    pub fn categories(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::Category {
            ids: ids.into_iter().collect(),
        }
    }

    /// Creates an attribute condition.
    pub fn condition(
        attribute: impl Into<String>,
        operator: Operator,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self::Condition(Condition {
            attribute: attribute.into(),
            operator,
            value: vec![value.into()],
        })
    }
}

/// How the children of a combination combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregator {
    /// Every child.
    All,
    /// At least one child.
    Any,
}

/// An attribute comparison.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Condition {
    /// Logical attribute name.
    pub attribute: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Compared values; list operators use all of them, the others the first.
    #[serde_as(as = "OneOrMany<_>")]
    #[serde(default)]
    pub value: Vec<FieldValue>,
}

impl FromStr for Condition {
    type Err = ParseError;

    /// Parses `attribute<op>value`, for example `price<50` or `color()red,blue`.
    ///
    /// List operators split the value on commas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, operator) = Operator::ALL
            .iter()
            .filter_map(|op| s.find(op.symbol()).map(|start| (start, *op)))
            .min_by_key(|(start, op)| (*start, usize::MAX - op.symbol().len()))
            .ok_or_else(|| ParseError::MissingOperator {
                input: s.to_string(),
            })?;

        let attribute = s[..start].trim();
        if attribute.is_empty() {
            return Err(ParseError::MissingAttribute {
                input: s.to_string(),
            });
        }
        let raw = s[start + operator.symbol().len()..].trim();
        let value = if operator.is_list() {
            raw.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(FieldValue::from_literal)
                .collect()
        } else if raw.is_empty() {
            Vec::new()
        } else {
            vec![FieldValue::from_literal(raw)]
        };

        Ok(Self {
            attribute: attribute.to_string(),
            operator,
            value,
        })
    }
}

/// Comparison operators of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Operator {
    /// Equals.
    #[serde(rename = "==")]
    Eq,
    /// Differs.
    #[serde(rename = "!=")]
    Ne,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Gte,
    /// Lower than or equal.
    #[serde(rename = "<=")]
    Lte,
    /// Greater than.
    #[serde(rename = ">")]
    Gt,
    /// Lower than.
    #[serde(rename = "<")]
    Lt,
    /// One of.
    #[serde(rename = "()")]
    In,
    /// None of.
    #[serde(rename = "!()")]
    NotIn,
    /// Contains.
    #[serde(rename = "{}")]
    Contains,
    /// Does not contain.
    #[serde(rename = "!{}")]
    NotContains,
}

impl Operator {
    /// Every operator.
    pub const ALL: [Self; 10] = [
        Self::Eq,
        Self::Ne,
        Self::Gte,
        Self::Lte,
        Self::Gt,
        Self::Lt,
        Self::In,
        Self::NotIn,
        Self::Contains,
        Self::NotContains,
    ];

    /// Returns the operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::In => "()",
            Self::NotIn => "!()",
            Self::Contains => "{}",
            Self::NotContains => "!{}",
        }
    }

    /// Returns true for operators taking a list of values.
    pub fn is_list(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Returns true for negated operators.
    pub fn is_negated(self) -> bool {
        matches!(self, Self::Ne | Self::NotIn | Self::NotContains)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
