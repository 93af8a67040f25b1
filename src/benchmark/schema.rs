//! Named payload schemas and the compiled-validator cache

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use jsonschema::JSONSchema;
use serde_json::Value as JsonValue;

pub const GOVERNOR_LIMITS_SCHEMA: &str = "governor_limits";
pub const BENCHMARK_REPORT_SCHEMA: &str = "benchmark_report";

const GOVERNOR_LIMITS_SOURCE: &str = r#"{
    "type": "object",
    "required": [
        "duration",
        "cpuTime",
        "dbStatements",
        "dbRows",
        "queries",
        "queryRows",
        "heapSize",
        "asyncJobs"
    ],
    "properties": {
        "duration": { "type": "integer", "minimum": 0 },
        "cpuTime": { "type": "integer", "minimum": 0 },
        "dbStatements": { "type": "integer", "minimum": 0 },
        "dbRows": { "type": "integer", "minimum": 0 },
        "queries": { "type": "integer", "minimum": 0 },
        "queryRows": { "type": "integer", "minimum": 0 },
        "heapSize": { "type": "integer", "minimum": 0 },
        "asyncJobs": { "type": "integer", "minimum": 0 }
    }
}"#;

const BENCHMARK_REPORT_SOURCE: &str = r#"{
    "type": "object",
    "required": ["limits"],
    "properties": {
        "name": { "type": "string" },
        "action": { "type": "string" },
        "limits": {
            "type": "object",
            "required": [
                "duration",
                "cpuTime",
                "dbStatements",
                "dbRows",
                "queries",
                "queryRows",
                "heapSize",
                "asyncJobs"
            ],
            "properties": {
                "duration": { "type": "integer", "minimum": 0 },
                "cpuTime": { "type": "integer", "minimum": 0 },
                "dbStatements": { "type": "integer", "minimum": 0 },
                "dbRows": { "type": "integer", "minimum": 0 },
                "queries": { "type": "integer", "minimum": 0 },
                "queryRows": { "type": "integer", "minimum": 0 },
                "heapSize": { "type": "integer", "minimum": 0 },
                "asyncJobs": { "type": "integer", "minimum": 0 }
            }
        }
    }
}"#;

/// Registry of compiled payload validators, keyed by schema name.
///
/// Validators compile lazily on the first lookup of each name and are shared
/// afterwards. Compiled validators are pure functions of already-parsed
/// JSON, so one registry may serve concurrent benchmark runs.
pub struct SchemaRegistry {
    validators: Mutex<HashMap<String, Arc<JSONSchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            validators: Mutex::new(HashMap::new()),
        }
    }

    pub fn validator(&self, name: &str) -> Result<Arc<JSONSchema>> {
        let mut cache = self.validators.lock().unwrap();
        if let Some(validator) = cache.get(name) {
            return Ok(validator.clone());
        }

        let source = match name {
            GOVERNOR_LIMITS_SCHEMA => GOVERNOR_LIMITS_SOURCE,
            BENCHMARK_REPORT_SCHEMA => BENCHMARK_REPORT_SOURCE,
            _ => return Err(anyhow!("Unknown schema: {}", name)),
        };

        let schema: JsonValue = serde_json::from_str(source)?;
        let compiled = JSONSchema::compile(&schema)
            .map_err(|e| anyhow!("Schema '{}' failed to compile: {}", name, e))?;

        let validator = Arc::new(compiled);
        cache.insert(name.to_string(), validator.clone());
        Ok(validator)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
