//! Scope filter expressions.
//!
//! Scopes narrow events, dashboards and alerts to a subset of entities, e.g.
//! `kubernetes.namespace.name = 'prod' and host.hostName in ('a', 'b')`.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Comparison used by a scope selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// `=`
    Is,
    /// `!=`
    IsNot,
    /// `in (...)`
    In,
    /// `not ... in (...)`
    NotIn,
    /// `contains`
    Contains,
    /// `not ... contains`
    DoesNotContain,
    /// `starts with`
    StartsWith,
}

impl Selector {
    /// The selector as written in a scope expression.
    pub fn as_str(&self) -> &'static str {
        match self {
            Selector::Is => "=",
            Selector::IsNot => "!=",
            Selector::In => "in",
            Selector::NotIn => "not in",
            Selector::Contains => "contains",
            Selector::DoesNotContain => "does not contain",
            Selector::StartsWith => "starts with",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    selector: Selector,
    label: String,
    values: Vec<String>,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Negations are rendered as a `not` prefix on the positive form.
        let (prefix, selector) = match self.selector {
            Selector::NotIn => ("not ", Selector::In),
            Selector::DoesNotContain => ("not ", Selector::Contains),
            other => ("", other),
        };
        let values = self
            .values
            .iter()
            .map(|value| format!("'{value}'"))
            .collect::<Vec<_>>()
            .join(", ");

        match selector {
            Selector::In => write!(f, "{prefix}{} {} ({values})", self.label, selector.as_str()),
            _ => write!(f, "{prefix}{} {} {values}", self.label, selector.as_str()),
        }
    }
}

/// A conjunction of label selections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    selections: Vec<Selection>,
}

impl Scope {
    /// An empty scope, which matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single-valued selection.
    pub fn selection(
        mut self,
        selector: Selector,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.selections.push(Selection {
            selector,
            label: label.into(),
            values: vec![value.into()],
        });
        self
    }

    /// Add a selection over several values.
    pub fn selection_multiple<I, V>(
        mut self,
        selector: Selector,
        label: impl Into<String>,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.selections.push(Selection {
            selector,
            label: label.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// `label = 'value'`
    pub fn is(self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.selection(Selector::Is, label, value)
    }

    /// `label != 'value'`
    pub fn is_not(self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.selection(Selector::IsNot, label, value)
    }

    /// `label in ('a', 'b')`
    pub fn in_values<I, V>(self, label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.selection_multiple(Selector::In, label, values)
    }

    /// `not label in ('a', 'b')`
    pub fn not_in_values<I, V>(self, label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.selection_multiple(Selector::NotIn, label, values)
    }

    /// `label contains 'value'`
    pub fn contains(self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.selection(Selector::Contains, label, value)
    }

    /// `not label contains 'value'`
    pub fn does_not_contain(self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.selection(Selector::DoesNotContain, label, value)
    }

    /// `label starts with 'value'`
    pub fn starts_with(self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.selection(Selector::StartsWith, label, value)
    }

    /// Check if the scope has no selections.
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selection) in self.selections.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{selection}")?;
        }
        Ok(())
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Labels attached to a created event. Only equality selections are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventScope(Scope);

impl EventScope {
    /// An empty event scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// An event scope with one `label = 'value'` selection per entry, in label order.
    pub fn with_labels<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let sorted: BTreeMap<String, String> = labels
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        sorted
            .into_iter()
            .fold(Self::new(), |scope, (label, value)| scope.is(label, value))
    }

    /// `label = 'value'`
    pub fn is(self, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self(self.0.is(label, value))
    }

    /// Check if the scope has no selections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EventScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for EventScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl From<EventScope> for Scope {
    fn from(scope: EventScope) -> Self {
        scope.0
    }
}
