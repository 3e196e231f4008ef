//! Identifier derivation for Telegram accounts and agents.
//!
//! Usernames are human-chosen (`@canyonMain_bot`, `@OpsBot`, ...). These
//! helpers turn them into stable ids that are safe to use as JSON keys and
//! directory names. All functions are total: they never fail and never
//! return an empty string.

/// Agent id reserved for the default agent.
pub const MAIN_AGENT_ID: &str = "main";

/// Last-resort identifier when neither the username nor the display name
/// yields anything usable.
const FALLBACK_ID: &str = "bot";

/// Lowercase `value` and collapse every run of characters outside
/// `[a-z0-9]` into a single `-`, trimming dashes at both ends.
///
/// May return an empty string; see [`slugify`] for the non-empty variant.
pub fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Like [`slug`], but falls back to `bot` when nothing survives.
pub fn slugify(value: &str) -> String {
    let slug = slug(value);
    if slug.is_empty() {
        FALLBACK_ID.to_string()
    } else {
        slug
    }
}

/// Derive a Telegram account id from a bot username.
///
/// Strips a leading `@`, turns `_` into `-`, drops a trailing `-bot` or
/// `bot` suffix (case-insensitive) and slugifies the rest. Falls back to the
/// slugified display name, and finally to `bot`.
pub fn derive_account_id(username: &str, display_name: &str) -> String {
    let raw = username.trim();
    let raw = raw.strip_prefix('@').unwrap_or(raw).replace('_', "-");
    let raw = strip_bot_suffix(&raw);
    let id = slug(raw);
    if id.is_empty() {
        slugify(display_name)
    } else {
        id
    }
}

/// Derive the agent id: `main` for the default agent, otherwise the explicit
/// override or the slugified display name. A blank override counts as none.
pub fn derive_agent_id(is_main: bool, explicit: Option<&str>, display_name: &str) -> String {
    if is_main {
        return MAIN_AGENT_ID.to_string();
    }
    match explicit.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => slugify(display_name),
    }
}

fn strip_bot_suffix(raw: &str) -> &str {
    let lower = raw.to_ascii_lowercase();
    for suffix in ["-bot", "bot"] {
        if lower.ends_with(suffix) {
            // The suffix is ASCII, so the cut lands on a char boundary.
            return &raw[..raw.len() - suffix.len()];
        }
    }
    raw
}
