use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::ErrorInstance;

/// Joins the class prefix and the discriminator of an aggregation key.
pub const KEY_SEPARATOR: char = '@';

/// Frames hashed by `KeyStrategy::StackHead`, counted from the innermost.
pub const STACK_HEAD_FRAMES: usize = 4;

/// Hex digits of the stack-head hash kept in the key.
const STACK_HEAD_HASH_LEN: usize = 8;

/// Key for an occurrence: `explicit` verbatim when non-empty, else
/// `<class>@<message>`.
pub fn derive_key(class: &str, message: &str, explicit: Option<&str>) -> String {
    match explicit {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => format!("{class}{KEY_SEPARATOR}{message}"),
    }
}

/// How keys are derived when the caller supplies none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// `<class>@<message>`
    #[default]
    Message,
    /// `<class>@<hash of the innermost frames>`; errors raised at the same
    /// place group together even when their messages differ.
    StackHead,
}

impl KeyStrategy {
    pub fn key_for(&self, instance: &ErrorInstance, explicit: Option<&str>) -> String {
        if let Some(key) = explicit.filter(|k| !k.is_empty()) {
            return key.to_string();
        }
        match self {
            KeyStrategy::StackHead if !instance.stacktrace.is_empty() => format!(
                "{}{KEY_SEPARATOR}{}",
                instance.class,
                stack_head_hash(&instance.stacktrace)
            ),
            _ => derive_key(&instance.class, &instance.message, None),
        }
    }
}

/// Frames are ordered outermost first, so the head is the tail of the slice.
fn stack_head_hash(frames: &[String]) -> String {
    let start = frames.len().saturating_sub(STACK_HEAD_FRAMES);
    let mut hasher = Sha256::new();
    for frame in &frames[start..] {
        hasher.update(frame.as_bytes());
        hasher.update(b"\n");
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(STACK_HEAD_HASH_LEN);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn derived_from_class_and_message() {
        assert_eq!(derive_key("io", "disk full", None), "io@disk full");
        assert_eq!(derive_key("io", "disk full", None), derive_key("io", "disk full", None));
    }

    #[test]
    fn explicit_key_wins() {
        assert_eq!(
            derive_key("io", "disk full", Some("*errors.errorString@grouped-err")),
            "*errors.errorString@grouped-err"
        );
    }

    #[test]
    fn empty_explicit_key_is_ignored() {
        assert_eq!(derive_key("io", "disk full", Some("")), "io@disk full");
    }

    #[test]
    fn distinct_pairs_do_not_collide() {
        assert_ne!(derive_key("io", "a", None), derive_key("net", "a", None));
        assert_ne!(derive_key("io", "a", None), derive_key("io", "b", None));
    }

    #[test]
    fn stack_head_ignores_message() {
        let st = frames(&["main @ a.rs:1", "run @ a.rs:9", "load @ b.rs:3"]);
        let a = ErrorInstance::custom("first", "io", st.clone());
        let b = ErrorInstance::custom("second", "io", st);
        let ka = KeyStrategy::StackHead.key_for(&a, None);
        assert_eq!(ka, KeyStrategy::StackHead.key_for(&b, None));
        let (class, hash) = ka.split_once(KEY_SEPARATOR).unwrap();
        assert_eq!(class, "io");
        assert_eq!(hash.len(), STACK_HEAD_HASH_LEN);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn stack_head_uses_innermost_frames_only() {
        let a = ErrorInstance::custom("m", "io", frames(&["x", "1", "2", "3", "4"]));
        let b = ErrorInstance::custom("m", "io", frames(&["y", "1", "2", "3", "4"]));
        let c = ErrorInstance::custom("m", "io", frames(&["x", "1", "2", "3", "5"]));
        let s = KeyStrategy::StackHead;
        assert_eq!(s.key_for(&a, None), s.key_for(&b, None));
        assert_ne!(s.key_for(&a, None), s.key_for(&c, None));
    }

    #[test]
    fn stack_head_without_frames_falls_back_to_message() {
        let inst = ErrorInstance::custom("m", "io", vec![]);
        assert_eq!(KeyStrategy::StackHead.key_for(&inst, None), "io@m");
    }

    #[test]
    fn explicit_key_wins_for_every_strategy() {
        let inst = ErrorInstance::custom("m", "io", frames(&["f"]));
        for s in [KeyStrategy::Message, KeyStrategy::StackHead] {
            assert_eq!(s.key_for(&inst, Some("io@custom")), "io@custom");
        }
    }
}
