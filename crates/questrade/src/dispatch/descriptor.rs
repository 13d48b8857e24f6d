use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};
use crate::transport::HttpMethod;

/// One logical API call: endpoint template, positional path arguments, parameters and verb.
///
/// Parameters go to the query string for GET and to a JSON body for POST.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub endpoint: String,
    pub path_args: Vec<String>,
    pub params: Map<String, Value>,
    pub verb: HttpMethod,
    /// First parameter that failed to serialize.
    invalid: Option<String>,
}

impl RequestDescriptor {
    pub fn new(verb: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            path_args: Vec::new(),
            params: Map::new(),
            verb,
            invalid: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    /// Append the next positional path argument.
    pub fn arg(mut self, value: impl ToString) -> Self {
        self.path_args.push(value.to_string());
        self
    }

    /// Set a parameter. Serialization failures surface as `InvalidArgument` on execute.
    pub fn param<V: Serialize>(mut self, name: impl Into<String>, value: V) -> Self {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.params.insert(name, value);
            }
            Err(e) => {
                if self.invalid.is_none() {
                    self.invalid = Some(format!("parameter `{name}`: {e}"));
                }
            }
        }
        self
    }

    /// Set a parameter only when present.
    pub fn param_opt<V: Serialize>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn param_value(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Endpoint with `{0}`, `{1}`, … replaced by URL-encoded path arguments.
    ///
    /// Every placeholder must have an argument and every argument must be used.
    pub fn render_path(&self) -> Result<String> {
        let mut rendered = String::with_capacity(self.endpoint.len());
        let mut used = vec![false; self.path_args.len()];
        let mut rest = self.endpoint.as_str();

        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                ApiError::invalid_argument(format!(
                    "unterminated placeholder in endpoint `{}`",
                    self.endpoint
                ))
            })?;
            let index: usize = after[..close].parse().map_err(|_| {
                ApiError::invalid_argument(format!(
                    "placeholder `{{{}}}` in endpoint `{}` is not positional",
                    &after[..close],
                    self.endpoint
                ))
            })?;
            let value = self.path_args.get(index).ok_or_else(|| {
                ApiError::invalid_argument(format!(
                    "endpoint `{}` needs argument {} but {} supplied",
                    self.endpoint,
                    index,
                    self.path_args.len()
                ))
            })?;
            if value.is_empty() {
                return Err(ApiError::invalid_argument(format!(
                    "argument {} of endpoint `{}` is empty",
                    index, self.endpoint
                )));
            }
            rendered.push_str(&urlencoding::encode(value));
            used[index] = true;
            rest = &after[close + 1..];
        }
        rendered.push_str(rest);

        if let Some(unused) = used.iter().position(|used| !used) {
            return Err(ApiError::invalid_argument(format!(
                "argument {} is not referenced by endpoint `{}`",
                unused, self.endpoint
            )));
        }

        Ok(rendered)
    }

    /// Parameters as query pairs. Only scalars are accepted; `null` is dropped.
    pub fn query_pairs(&self) -> Result<Vec<(String, String)>> {
        self.check_params()?;
        let mut pairs = Vec::with_capacity(self.params.len());
        for (name, value) in &self.params {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(ApiError::invalid_argument(format!(
                        "query parameter `{name}` must be a scalar"
                    )));
                }
            };
            pairs.push((name.clone(), value));
        }
        Ok(pairs)
    }

    /// Parameters as a JSON object body.
    pub fn json_body(&self) -> Result<String> {
        self.check_params()?;
        serde_json::to_string(&self.params)
            .map_err(|e| ApiError::invalid_argument(format!("request body: {e}")))
    }

    fn check_params(&self) -> Result<()> {
        match &self.invalid {
            Some(message) => Err(ApiError::invalid_argument(message.clone())),
            None => Ok(()),
        }
    }
}
