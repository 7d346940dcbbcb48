//! End-to-end tests: real server on 127.0.0.1:0 (once mode), real WebSocket client.

mod common;
mod embed;
mod health;
mod invalid_json;
mod lookup;
mod stream;
