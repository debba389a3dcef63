//! Swagger-documented API under the `/tts` namespace.

use crate::constants::{DEFAULT_SPEED, DEFAULT_VOICE, MAX_SPEED, MAX_TEXT_CHARS, MIN_SPEED};
use crate::error::TtsError;
use crate::server::{
    health_body, parse_payload, synthesize_wav, voices_body, wav_attachment, AppState,
    HealthResponse, TtsPayload, VoicesResponse, MODEL_NAME,
};
use crate::voice::all_voices;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{Html, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

const SWAGGER_PAGE: &str = include_str!("assets/swagger.html");

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tts/health", get(health))
        .route("/tts/voices", get(voices))
        .route("/tts/generate", post(generate))
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(docs))
}

async fn health() -> Json<HealthResponse> {
    Json(health_body())
}

async fn voices() -> Json<VoicesResponse> {
    Json(voices_body())
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<TtsPayload>, JsonRejection>,
) -> Result<Response, TtsError> {
    let request = parse_payload(payload)?;
    let filename = format!("kokoro_output_{}.wav", sanitize_filename(&request.voice));
    let bytes = synthesize_wav(&state, request).await?;
    Ok(wav_attachment(bytes, &filename))
}

async fn openapi_json() -> Json<Value> {
    Json(document())
}

async fn docs() -> Html<&'static str> {
    Html(SWAGGER_PAGE)
}

/// Keep voice names usable inside a quoted `Content-Disposition` filename.
fn sanitize_filename(voice: &str) -> String {
    voice
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// OpenAPI 3 description of the `/tts` namespace.
pub fn document() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": format!("{} TTS API", MODEL_NAME),
            "version": "1.0",
            "description": "Lightweight speech synthesis API. Use \"Try it out\" on /tts/generate to listen to a voice."
        },
        "tags": [{ "name": "tts", "description": "Speech synthesis operations" }],
        "paths": paths(),
        "components": { "schemas": schemas() }
    })
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        }
    })
}

fn paths() -> Value {
    json!({
            "/tts/health": {
                "get": {
                    "tags": ["tts"],
                    "operationId": "health_check",
                    "summary": "Health check",
                    "responses": {
                        "200": {
                            "description": "Service status",
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/HealthResponse" } }
                            }
                        }
                    }
                }
            },
            "/tts/voices": {
                "get": {
                    "tags": ["tts"],
                    "operationId": "list_voices",
                    "summary": "List available voices",
                    "responses": {
                        "200": {
                            "description": "Voice names",
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/VoicesResponse" } }
                            }
                        }
                    }
                }
            },
            "/tts/generate": {
                "post": {
                    "tags": ["tts"],
                    "operationId": "text_to_speech",
                    "summary": "Convert text to speech",
                    "description": "Generates a 24 kHz mono 32-bit float WAV file.",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": { "schema": { "$ref": "#/components/schemas/TTSRequest" } }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "Generated audio",
                            "content": {
                                "audio/wav": { "schema": { "type": "string", "format": "binary" } }
                            }
                        },
                        "400": error_response("Invalid request"),
                        "500": error_response("Synthesis failed")
                    }
                }
            }
        })
}

fn schemas() -> Value {
    json!({
                "TTSRequest": {
                    "type": "object",
                    "required": ["text"],
                    "properties": {
                        "text": {
                            "type": "string",
                            "description": "Text to synthesize",
                            "maxLength": MAX_TEXT_CHARS,
                            "example": "こんにちは、これはテストです。"
                        },
                        "voice": {
                            "type": "string",
                            "description": "Voice name; its prefix selects the language",
                            "default": DEFAULT_VOICE,
                            "enum": all_voices()
                        },
                        "speed": {
                            "type": "number",
                            "format": "float",
                            "description": "Speech speed multiplier",
                            "default": DEFAULT_SPEED,
                            "minimum": MIN_SPEED,
                            "maximum": MAX_SPEED
                        },
                        "language": {
                            "type": "string",
                            "description": "Single-letter language code overriding voice-based detection",
                            "enum": ["a", "b", "j", "z", "e", "f", "h", "i", "p"]
                        }
                    }
                },
                "HealthResponse": {
                    "type": "object",
                    "properties": {
                        "status": { "type": "string", "description": "Service status" },
                        "model": { "type": "string", "description": "Model in use" }
                    }
                },
                "VoicesResponse": {
                    "type": "object",
                    "properties": {
                        "voices": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Available voices"
                        }
                    }
                },
                "ErrorResponse": {
                    "type": "object",
                    "properties": { "error": { "type": "string" } }
                }
            })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_describes_generate_endpoint() {
        let doc = document();
        assert_eq!(doc["openapi"], "3.0.3");
        let generate = &doc["paths"]["/tts/generate"]["post"];
        assert_eq!(generate["operationId"], "text_to_speech");
        assert!(generate["responses"]["200"]["content"]["audio/wav"].is_object());

        let request = &doc["components"]["schemas"]["TTSRequest"];
        assert_eq!(request["required"][0], "text");
        assert_eq!(request["properties"]["speed"]["minimum"], 0.5);
        assert_eq!(request["properties"]["voice"]["enum"].as_array().unwrap().len(), 54);
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("af_heart"), "af_heart");
        assert_eq!(sanitize_filename("a\"b/c"), "a_b_c");
    }
}
