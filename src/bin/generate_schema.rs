//! Schema generator for the adapter's contracts.
//!
//! This binary writes `adapter_schema.json` with JSON Schemas for the
//! configuration bag and the buffered gateway reply, so deployments can
//! validate configuration files and downstream consumers can validate replies.

use aws_lambda_http_adapter::models::{AdapterOptions, GatewayResponse};
use schemars::{JsonSchema, schema_for};
use serde_json::{Value, json};
use std::fs;

const OUTPUT: &str = "adapter_schema.json";

// A named contract and its schema
struct Contract {
    name: String,
    description: String,
    schema: Value,
}

fn main() {
    let contracts = vec![
        Contract {
            name: "AdapterOptions".into(),
            description: "Adapter configuration. Every field is optional; unknown fields are ignored.".into(),
            schema: generate_schema::<AdapterOptions>(),
        },
        Contract {
            name: "GatewayResponse".into(),
            description: "Buffered reply returned to API Gateway or the load balancer.".into(),
            schema: generate_schema::<GatewayResponse>(),
        },
    ];

    write_schema(&contracts);
    println!("✅ Generated {OUTPUT} with {} contract(s)", contracts.len());
}

// Generates a schema for the given type without the meta-schema marker
fn generate_schema<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schema_for!(T)).unwrap_or_else(|e| {
        eprintln!("Failed to serialize schema: {e}");
        std::process::exit(1);
    });

    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }

    schema
}

fn write_schema(contracts: &[Contract]) {
    let schemas: Vec<Value> = contracts
        .iter()
        .map(|contract| {
            json!({
                "name": contract.name,
                "description": contract.description,
                "schema": contract.schema
            })
        })
        .collect();

    let json = serde_json::to_string_pretty(&schemas).unwrap_or_else(|e| {
        eprintln!("Failed to serialize schema: {e}");
        std::process::exit(1);
    });

    fs::write(OUTPUT, json).unwrap_or_else(|e| {
        eprintln!("Failed to write {OUTPUT}: {e}");
        std::process::exit(1);
    });
}
