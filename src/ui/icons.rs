//! Shared UI icons.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");

// Board
pub static QUESTION: Emoji<'_, '_> = Emoji("❓ ", "#");
pub static NOTE: Emoji<'_, '_> = Emoji("📝 ", "-");
pub static HIDDEN: Emoji<'_, '_> = Emoji("🙈 ", "-");
pub static VOTE: Emoji<'_, '_> = Emoji("👍 ", "+");

// Connection
pub static LIVE: Emoji<'_, '_> = Emoji("🟢 ", "[LIVE]");
pub static OFFLINE: Emoji<'_, '_> = Emoji("🔴 ", "[OFF]");
pub static RECONNECT: Emoji<'_, '_> = Emoji("🔄 ", "[...]");
