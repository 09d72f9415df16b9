//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn title() -> String {
        "My Notes".into()
    }

    pub fn url() -> Option<String> {
        None
    }

    pub fn base_url() -> String {
        "/".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "docs".into()
    }

    pub fn static_dir() -> PathBuf {
        "static".into()
    }

    pub fn output() -> PathBuf {
        "build".into()
    }

    pub fn cache() -> PathBuf {
        ".quire".into()
    }

    pub mod slug {
        use super::super::super::SlugMode;

        pub fn mode() -> SlugMode {
            SlugMode::default()
        }
    }
}

// ============================================================================
// [theme] Section Defaults
// ============================================================================

pub mod theme {
    pub mod search {
        pub fn excerpt_length() -> usize {
            160
        }

        pub fn min_term_length() -> usize {
            2
        }
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        3000
    }
}
