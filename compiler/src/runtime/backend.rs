//! Step backends: the side-effecting half of the interpreter.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        BackendError {
            message: message.into(),
        }
    }
}

/// Model settings passed alongside a rendered prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Executes the side effects of pipeline steps.
pub trait StepBackend {
    fn call_function(
        &mut self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, BackendError>;

    /// Invoke a remote endpoint (`/api/...`).
    fn call_api(&mut self, path: &str, params: &Map<String, Value>) -> Result<Value, BackendError>;

    fn call_llm(&mut self, prompt: &str, settings: &LlmSettings) -> Result<Value, BackendError>;

    /// Render a visualization payload: `{component_type, template, resolved_template}`.
    fn visualize(&mut self, payload: &Value) -> Result<Value, BackendError>;
}

impl<B: StepBackend + ?Sized> StepBackend for &mut B {
    fn call_function(
        &mut self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, BackendError> {
        (**self).call_function(name, params)
    }

    fn call_api(&mut self, path: &str, params: &Map<String, Value>) -> Result<Value, BackendError> {
        (**self).call_api(path, params)
    }

    fn call_llm(&mut self, prompt: &str, settings: &LlmSettings) -> Result<Value, BackendError> {
        (**self).call_llm(prompt, settings)
    }

    fn visualize(&mut self, payload: &Value) -> Result<Value, BackendError> {
        (**self).visualize(payload)
    }
}

// =============================================================================
// MOCK BACKEND
// =============================================================================

/// One recorded backend invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum MockCall {
    Function { name: String, params: Map<String, Value> },
    Api { path: String, params: Map<String, Value> },
    Llm { prompt: String, settings: LlmSettings },
    Visualize { payload: Value },
}

/// Deterministic backend: every result is derived from the seed and the
/// call's inputs, so identical runs produce identical states.
#[derive(Debug, Clone)]
pub struct MockBackend {
    seed: String,
    calls: Vec<MockCall>,
}

impl MockBackend {
    pub fn new(seed: impl Into<String>) -> Self {
        MockBackend {
            seed: seed.into(),
            calls: Vec::new(),
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> &[MockCall] {
        &self.calls
    }

    fn digest(&self, kind: &str, subject: &str, body: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.as_bytes());
        hasher.update([0]);
        hasher.update(kind.as_bytes());
        hasher.update([0]);
        hasher.update(subject.as_bytes());
        hasher.update([0]);
        hasher.update(body.to_string().as_bytes());
        hex::encode(hasher.finalize())[..12].to_string()
    }
}

impl StepBackend for MockBackend {
    fn call_function(
        &mut self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, BackendError> {
        let id = self.digest("function", name, &Value::Object(params.clone()));
        self.calls.push(MockCall::Function {
            name: name.to_string(),
            params: params.clone(),
        });
        Ok(json!({
            "mock_id": id,
            "function": name,
            "params": params,
        }))
    }

    fn call_api(&mut self, path: &str, params: &Map<String, Value>) -> Result<Value, BackendError> {
        let id = self.digest("api", path, &Value::Object(params.clone()));
        self.calls.push(MockCall::Api {
            path: path.to_string(),
            params: params.clone(),
        });
        Ok(json!({
            "mock_id": id,
            "endpoint": path,
            "status": 200,
        }))
    }

    fn call_llm(&mut self, prompt: &str, settings: &LlmSettings) -> Result<Value, BackendError> {
        let model = settings.model.as_deref().unwrap_or("default");
        let id = self.digest("llm", model, &Value::String(prompt.to_string()));
        self.calls.push(MockCall::Llm {
            prompt: prompt.to_string(),
            settings: settings.clone(),
        });
        Ok(Value::String(format!(
            "[mock {model} {id}] response to a {}-character prompt",
            prompt.chars().count()
        )))
    }

    fn visualize(&mut self, payload: &Value) -> Result<Value, BackendError> {
        let component = payload
            .get("component_type")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::new("visualization payload has no component_type"))?
            .to_string();
        let id = self.digest("visualize", &component, payload);
        self.calls.push(MockCall::Visualize {
            payload: payload.clone(),
        });
        Ok(json!({
            "mock_id": id,
            "rendered": component,
        }))
    }
}
