use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

/// Raw platform mention syntax: users, nicknames, roles and channels.
static RAW_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:@[!&]?|#)\d+>").expect("mention pattern compiles"));

/// A platform user as the engine sees it. Read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: String,
    pub display_name: String,
    /// Unique handle, matched exactly by the tag fallback.
    pub tag: String,
    /// Avatar URL without size parameters; `None` when the user has no avatar.
    pub avatar_base: Option<String>,
}

impl UserRef {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            tag: tag.into(),
            avatar_base: None,
        }
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_base = Some(url.into());
        self
    }

    /// Avatar URL sized for `size_hint`, rounded up to a power of two in `[16, 4096]`.
    ///
    /// Any query string on the stored URL is replaced.
    pub fn avatar_url(&self, size_hint: u32) -> Option<String> {
        let base = self.avatar_base.as_deref()?;
        let base = base.split_once('?').map_or(base, |(b, _)| b);
        let size = size_hint.clamp(16, 4096).next_power_of_two().min(4096);
        Some(format!("{base}?size={size}"))
    }
}

/// Users the tag fallback may match, keyed by exact tag.
#[derive(Clone, Debug, Default)]
pub struct UserDirectory {
    by_tag: HashMap<String, UserRef>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_users(users: impl IntoIterator<Item = UserRef>) -> Self {
        let mut dir = Self::new();
        for u in users {
            dir.insert(u);
        }
        dir
    }

    pub fn insert(&mut self, user: UserRef) {
        self.by_tag.insert(user.tag.clone(), user);
    }

    pub fn lookup(&self, tag: &str) -> Option<&UserRef> {
        self.by_tag.get(tag)
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

/// Who a command targets and what free text accompanies it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedArguments {
    pub target_users: Vec<UserRef>,
    /// Whitespace-normalized, mention-free text after the command token.
    pub caption_text: String,
    pub invoking_user: UserRef,
    /// Caption word, as written, that the tag fallback matched. It stays in `caption_text`.
    pub fallback_tag: Option<String>,
}

impl ResolvedArguments {
    /// Caption with the fallback-matched word removed once.
    pub fn caption_without_fallback_tag(&self) -> String {
        let Some(tag) = self.fallback_tag.as_deref() else {
            return self.caption_text.clone();
        };
        let mut words: Vec<&str> = self.caption_text.split(' ').collect();
        if let Some(i) = words.iter().position(|w| *w == tag) {
            words.remove(i);
        }
        words.join(" ")
    }
}

/// Resolve targets and caption from a message.
///
/// Explicit mentions win, in mention order. Without mentions, the first caption token that is
/// exactly a known tag (other than the invoker's) becomes the target; the caption keeps it.
pub fn resolve(
    raw_text: &str,
    mentioned_users: &[UserRef],
    invoking_user: &UserRef,
    known_users_by_tag: &UserDirectory,
) -> ResolvedArguments {
    let mut target_users: Vec<UserRef> = Vec::with_capacity(mentioned_users.len());
    for u in mentioned_users {
        if !target_users.iter().any(|t| t.id == u.id) {
            target_users.push(u.clone());
        }
    }

    let rest = strip_command_token(raw_text);
    let rest = RAW_MENTION.replace_all(rest, " ");
    let rest = strip_named_mentions(&rest, &target_users);

    let words: Vec<&str> = rest.split_whitespace().collect();
    let mut fallback_tag = None;
    if target_users.is_empty() {
        let hit = words.iter().find_map(|w| {
            let tag = w.strip_prefix('@').unwrap_or(w);
            known_users_by_tag
                .lookup(tag)
                .filter(|u| u.id != invoking_user.id)
                .map(|u| (*w, u.clone()))
        });
        if let Some((word, user)) = hit {
            fallback_tag = Some(word.to_string());
            target_users.push(user);
        }
    }

    ResolvedArguments {
        target_users,
        caption_text: words.join(" "),
        invoking_user: invoking_user.clone(),
        fallback_tag,
    }
}

fn strip_command_token(raw_text: &str) -> &str {
    let trimmed = raw_text.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(i) => &trimmed[i..],
        None => "",
    }
}

// Rendered mentions ("@Bob") of users that were explicitly mentioned.
fn strip_named_mentions(text: &str, mentioned: &[UserRef]) -> String {
    let mut names: Vec<&str> = mentioned
        .iter()
        .flat_map(|u| [u.display_name.as_str(), u.tag.as_str()])
        .filter(|n| !n.is_empty())
        .collect();
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    names.dedup();

    let mut out = text.to_string();
    for name in names {
        let boundary = if name.ends_with(|c: char| c.is_alphanumeric() || c == '_') {
            r"\b"
        } else {
            ""
        };
        if let Ok(re) = Regex::new(&format!("@{}{boundary}", regex::escape(name))) {
            out = re.replace_all(&out, " ").into_owned();
        }
    }
    out
}

/// Truncate on a char boundary to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => text[..i].trim_end(),
        None => text,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/args.rs"]
mod tests;
