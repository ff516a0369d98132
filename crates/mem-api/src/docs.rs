//! API documentation: an HTML overview and an OpenAPI 3.0 document.

use axum::response::Html;
use axum::Json;
use serde_json::{json, Value};

const DOCS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Memory Management API</title>
<style>
body { font-family: sans-serif; max-width: 52rem; margin: 2rem auto; }
code { background: #f3f3f3; padding: 0 .25rem; }
td, th { text-align: left; padding: .25rem .75rem; border-bottom: 1px solid #ddd; }
</style>
</head>
<body>
<h1>Memory Management API</h1>
<p>Record routes require <code>Authorization: Bearer &lt;key&gt;</code> when the server runs with an API key.
Machine-readable schema: <a href="/memory/openapi.json">/memory/openapi.json</a>.</p>
<table>
<tr><th>Method</th><th>Path</th><th>Description</th></tr>
<tr><td>GET</td><td><code>/memory/health</code></td><td>Service status and record count</td></tr>
<tr><td>GET</td><td><code>/memory/docs</code></td><td>This page</td></tr>
<tr><td>POST</td><td><code>/memory</code></td><td>Create a memory; answers 201 with <code>memory_id</code></td></tr>
<tr><td>GET</td><td><code>/memory/{memory_id}</code></td><td>Fetch one memory</td></tr>
<tr><td>DELETE</td><td><code>/memory/{memory_id}</code></td><td>Delete one memory</td></tr>
<tr><td>GET</td><td><code>/memory/user/{user_id}</code></td><td>List a user's memories (<code>persona_id</code>, <code>limit</code>, <code>offset</code>)</td></tr>
</table>
<h2>Create body</h2>
<pre>{
  "user_id": "user_123",
  "persona_id": "persona_456",
  "content": "Remember that the launch moved to Friday",
  "content_type": "text",
  "metadata": { "tags": ["work"], "importance": 7, "topic": "schedule" }
}</pre>
</body>
</html>
"#;

pub async fn handle_docs() -> Html<&'static str> {
    Html(DOCS_PAGE)
}

pub async fn handle_openapi() -> Json<Value> {
    Json(openapi_document())
}

fn error_ref() -> Value {
    json!({ "$ref": "#/components/schemas/ErrorResponse" })
}

/// OpenAPI 3.0 description of the routes served by `server::router`.
pub fn openapi_document() -> Value {
    let id_param = json!({
        "name": "memory_id", "in": "path", "required": true, "schema": { "type": "string" }
    });
    let err = |desc: &str| json!({ "description": desc, "content": { "application/json": { "schema": error_ref() } } });
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Memory Management API",
            "version": env!("CARGO_PKG_VERSION")
        },
        "components": {
            "securitySchemes": { "bearer": { "type": "http", "scheme": "bearer" } },
            "schemas": {
                "ErrorResponse": {
                    "type": "object",
                    "required": ["detail"],
                    "properties": { "detail": { "type": "string" } }
                },
                "MemoryMetadata": {
                    "type": "object",
                    "additionalProperties": true,
                    "properties": {
                        "tags": { "type": "array", "items": { "type": "string" } },
                        "importance": { "type": "integer", "minimum": 1, "maximum": 10 },
                        "topic": { "type": "string" }
                    }
                },
                "CreateMemoryRequest": {
                    "type": "object",
                    "required": ["user_id", "persona_id", "content"],
                    "properties": {
                        "user_id": { "type": "string" },
                        "persona_id": { "type": "string" },
                        "content": { "type": "string", "maxLength": mem_types::MAX_CONTENT_BYTES },
                        "content_type": {
                            "type": "string",
                            "enum": ["text", "json", "markdown", "image", "audio"],
                            "default": "text"
                        },
                        "metadata": { "$ref": "#/components/schemas/MemoryMetadata" }
                    }
                },
                "CreateMemoryResponse": {
                    "type": "object",
                    "properties": {
                        "memory_id": { "type": "string" },
                        "status": { "type": "string" },
                        "created_at": { "type": "string", "format": "date-time" }
                    }
                },
                "MemoryRecord": {
                    "type": "object",
                    "properties": {
                        "memory_id": { "type": "string" },
                        "user_id": { "type": "string" },
                        "persona_id": { "type": "string" },
                        "content": { "type": "string" },
                        "content_type": { "type": "string" },
                        "metadata": { "$ref": "#/components/schemas/MemoryMetadata" },
                        "created_at": { "type": "string", "format": "date-time" },
                        "updated_at": { "type": "string", "format": "date-time" }
                    }
                }
            }
        },
        "paths": {
            "/memory/health": {
                "get": { "summary": "Service health", "responses": { "200": { "description": "Healthy" } } }
            },
            "/memory/docs": {
                "get": { "summary": "HTML documentation", "responses": { "200": { "description": "Docs page" } } }
            },
            "/memory": {
                "post": {
                    "summary": "Create a memory",
                    "security": [{ "bearer": [] }],
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CreateMemoryRequest" } } }
                    },
                    "responses": {
                        "201": {
                            "description": "Created",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CreateMemoryResponse" } } }
                        },
                        "401": err("Missing or invalid bearer token"),
                        "422": err("Validation failed")
                    }
                }
            },
            "/memory/{memory_id}": {
                "get": {
                    "summary": "Fetch a memory",
                    "security": [{ "bearer": [] }],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": {
                            "description": "Found",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/MemoryRecord" } } }
                        },
                        "404": err("Unknown memory id")
                    }
                },
                "delete": {
                    "summary": "Delete a memory",
                    "security": [{ "bearer": [] }],
                    "parameters": [id_param],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "404": err("Unknown memory id")
                    }
                }
            },
            "/memory/user/{user_id}": {
                "get": {
                    "summary": "List a user's memories",
                    "security": [{ "bearer": [] }],
                    "parameters": [
                        { "name": "user_id", "in": "path", "required": true, "schema": { "type": "string" } },
                        { "name": "persona_id", "in": "query", "schema": { "type": "string" } },
                        { "name": "limit", "in": "query", "schema": { "type": "integer", "default": 50, "maximum": 500 } },
                        { "name": "offset", "in": "query", "schema": { "type": "integer", "default": 0 } }
                    ],
                    "responses": { "200": { "description": "Page of memories" } }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = openapi_document();
        let paths = doc["paths"].as_object().unwrap();
        for p in [
            "/memory/health",
            "/memory/docs",
            "/memory",
            "/memory/{memory_id}",
            "/memory/user/{user_id}",
        ] {
            assert!(paths.contains_key(p), "missing {}", p);
        }
        assert_eq!(
            doc["paths"]["/memory"]["post"]["responses"]["201"]["description"],
            "Created"
        );
    }
}
