//! Emoji picker catalog shown under the editor.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EmojiCategory {
    pub label: &'static str,
    pub icon: &'static str,
    pub emojis: &'static [&'static str],
}

const CATEGORIES: &[EmojiCategory] = &[
    EmojiCategory {
        label: "Smileys",
        icon: "😀",
        emojis: &[
            "😀", "😃", "😄", "😁", "😆", "😅", "🤣", "😂", "🙂", "😉", "😊", "😇", "🥰", "😍",
            "🤩", "😘", "😋", "😜", "🤪", "🤔", "🤗", "🤭", "😏", "😴", "😎", "🥳", "😭", "😱",
        ],
    },
    EmojiCategory {
        label: "Gestures",
        icon: "👍",
        emojis: &[
            "👍", "👎", "👌", "✌️", "🤞", "🤟", "🤘", "👏", "🙌", "👐", "🙏", "💪", "👋", "✋",
            "👉", "👈", "👆", "👇", "☝️", "✍️",
        ],
    },
    EmojiCategory {
        label: "Travel",
        icon: "📍",
        emojis: &[
            "📍", "🗺️", "🧭", "🏔️", "⛰️", "🌋", "🏕️", "🏖️", "🏞️", "🏯", "🏰", "🌉", "🚄", "✈️",
            "🚗", "🚌", "🚢", "🛶", "🚠", "🎫",
        ],
    },
    EmojiCategory {
        label: "Food",
        icon: "🍜",
        emojis: &[
            "🍎", "🍊", "🍉", "🍓", "🍑", "🥭", "🍜", "🍲", "🍚", "🥟", "🍢", "🍡", "🍰", "🧋",
            "🍵", "☕", "🍺", "🥂",
        ],
    },
    EmojiCategory {
        label: "Symbols",
        icon: "❗",
        emojis: &[
            "❗", "❓", "‼️", "⁉️", "✅", "❌", "⭐", "🌟", "✨", "🔥", "💯", "❤️", "🧡", "💛",
            "💚", "💙", "💜", "⚠️", "🔔", "📌",
        ],
    },
    EmojiCategory {
        label: "Keycaps",
        icon: "1️⃣",
        emojis: &[
            "0️⃣", "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟", "#️⃣", "*️⃣",
        ],
    },
];

/// All picker categories, in display order.
pub fn categories() -> &'static [EmojiCategory] {
    CATEGORIES
}

#[cfg(test)]
mod tests {
    use super::categories;
    use crate::emoji::{segments, Segment};

    #[test]
    fn every_picker_entry_is_a_single_emoji_cluster() {
        for category in categories() {
            assert!(!category.emojis.is_empty(), "{} is empty", category.label);
            for emoji in category.emojis {
                assert_eq!(
                    segments(*emoji),
                    vec![Segment::Emoji(*emoji)],
                    "{} in {}",
                    emoji,
                    category.label
                );
            }
        }
    }
}
