use chrono::Utc;
use uuid::Uuid;

/// Default directory-like prefix for attachment keys.
pub const DEFAULT_KEY_PREFIX: &str = "images";

const MAX_HINT_LEN: usize = 64;

/// Reduce a display name to characters that are safe in object keys and
/// file paths. Anything outside `[A-Za-z0-9._-]` becomes `-`.
pub fn sanitize_name_hint(hint: &str) -> String {
    let cleaned: String = hint
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .take(MAX_HINT_LEN)
        .collect();

    // A hint made only of dots would produce `.`/`..` path segments.
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "blob".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Best-effort `Content-Type` for a name hint or key, from its extension.
pub fn guess_content_type(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Builds fresh storage keys of the form
/// `{prefix}/{unix_millis}-{uuid}-{hint}`.
///
/// The name hint is informational only; the UUID suffix guarantees that
/// two calls never produce the same key, even for identical hints.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    prefix: String,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

impl KeyGenerator {
    /// Create a generator with the given prefix (leading/trailing `/` are ignored).
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_matches('/').to_owned(),
        }
    }

    /// Return the configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a new, never-before-issued key for `name_hint`.
    pub fn generate(&self, name_hint: &str) -> String {
        let millis = Utc::now().timestamp_millis();
        let unique = Uuid::now_v7().simple();
        let hint = sanitize_name_hint(name_hint);
        if self.prefix.is_empty() {
            format!("{millis}-{unique}-{hint}")
        } else {
            format!("{}/{millis}-{unique}-{hint}", self.prefix)
        }
    }
}
