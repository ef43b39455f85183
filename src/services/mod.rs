/// Camera WebSocket connection and frame handling service.
pub mod camera_service;
/// Per-round countdown task.
pub mod countdown;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match lifecycle: start, rounds, throws, stop and end.
pub mod match_service;
/// Public service for read-only match information.
pub mod public_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
