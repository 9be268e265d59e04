//! Default value functions for configuration.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on
//! `Config` fields so partial YAML files fill in the rest.

// ── Primitive helpers ──────────────────────────────────────────────────────

pub fn bool_true() -> bool {
    true
}

// ── Connection ─────────────────────────────────────────────────────────────

pub fn server_url() -> String {
    "ws://127.0.0.1:8080".to_string()
}

pub fn attach_path() -> String {
    "/ws/attach".to_string()
}

pub fn reconnect_base_ms() -> u64 {
    1000
}

pub fn reconnect_max_ms() -> u64 {
    30_000
}

// ── Layout ─────────────────────────────────────────────────────────────────

pub fn narrow_viewport_px() -> u32 {
    900
}

pub fn divider_ratio() -> f32 {
    0.5
}

pub fn cols() -> u16 {
    80
}

pub fn rows() -> u16 {
    24
}
