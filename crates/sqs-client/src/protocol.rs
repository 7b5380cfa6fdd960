//! Query-protocol request encoding.
//!
//! Every operation is a form-encoded `POST` carrying `Action`, `Version` and
//! the operation parameters. Lists are flattened into 1-based numbered
//! members (`AttributeName.1`, `Attribute.2.Name`, ...).

use crate::attributes::Attribute;

/// Query API version spoken by the client
pub const API_VERSION: &str = "2012-11-05";

/// Parameters of one query-protocol call
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryRequest {
    action: &'static str,
    params: Vec<(String, String)>,
}

impl QueryRequest {
    pub fn new(action: &'static str) -> Self {
        Self {
            action,
            params: Vec::new(),
        }
    }

    pub fn action(&self) -> &'static str {
        self.action
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.push(name, value);
        self
    }

    pub fn param_opt(self, name: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl ToString) {
        self.params.push((name.into(), value.to_string()));
    }

    /// Add `prefix.1`, `prefix.2`, ... for each value
    pub fn list<I, S>(mut self, prefix: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        for (index, value) in values.into_iter().enumerate() {
            self.push(format!("{}.{}", prefix, index + 1), value);
        }
        self
    }

    /// Add `Attribute.N.Name` / `Attribute.N.Value` pairs
    pub fn attributes(mut self, attributes: &[Attribute]) -> Self {
        for (index, attribute) in attributes.iter().enumerate() {
            let n = index + 1;
            self.push(format!("Attribute.{}.Name", n), &attribute.name);
            self.push(format!("Attribute.{}.Value", n), &attribute.value);
        }
        self
    }

    /// Value of a parameter, if present
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Form-encoded request body
    pub fn encode(&self, version: &str) -> String {
        let mut body = format!("Action={}&Version={}", self.action, urlencoding::encode(version));
        for (name, value) in &self.params {
            body.push('&');
            body.push_str(&urlencoding::encode(name));
            body.push('=');
            body.push_str(&urlencoding::encode(value));
        }
        body
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
