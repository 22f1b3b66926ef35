//! Placeholder author metadata for uploads that do not supply their own.

use ephemera_core::rng::DeterministicRng;
use ephemera_stories::domain::story::StoryMetadata;

const USERNAMES: [&str; 5] = [
    "Alex Chen",
    "Sofia Martinez",
    "Emma Wilson",
    "Liam Johnson",
    "Maya Patel",
];

const CAPTIONS: [&str; 5] = [
    "Living my best life ✨",
    "Chasing sunsets 🌅",
    "Coffee and vibes ☕️",
    "Weekend mood 🎉",
    "Making memories 📸",
];

const AVATAR_COUNT: u32 = 70;
const MIN_LIKES: u32 = 50;
const MAX_LIKES: u32 = 549;

/// Fields an upload may specify explicitly.
#[derive(Debug, Clone, Default)]
pub struct MetadataOverrides {
    /// Author display name.
    pub username: Option<String>,
    /// Caption text.
    pub caption: Option<String>,
    /// Avatar URL.
    pub avatar: Option<String>,
    /// Like count.
    pub likes: Option<u32>,
}

/// Fills every field missing from `overrides` with a random placeholder.
pub fn fill(overrides: MetadataOverrides, rng: &mut dyn DeterministicRng) -> StoryMetadata {
    let username = overrides
        .username
        .unwrap_or_else(|| pick(&USERNAMES, rng).to_owned());
    let avatar = overrides.avatar.unwrap_or_else(|| {
        let img = rng.next_u32_range(0, AVATAR_COUNT - 1);
        format!("https://i.pravatar.cc/150?img={img}")
    });
    let likes = overrides
        .likes
        .unwrap_or_else(|| rng.next_u32_range(MIN_LIKES, MAX_LIKES));
    let caption = overrides
        .caption
        .unwrap_or_else(|| pick(&CAPTIONS, rng).to_owned());

    StoryMetadata {
        username,
        avatar: Some(avatar),
        caption: Some(caption),
        likes,
    }
}

fn pick<'a>(options: &[&'a str], rng: &mut dyn DeterministicRng) -> &'a str {
    let last = u32::try_from(options.len().saturating_sub(1)).unwrap_or(u32::MAX);
    let index = usize::try_from(rng.next_u32_range(0, last)).unwrap_or_default();
    options.get(index).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use ephemera_test_support::{MockRng, SequenceRng};

    use super::*;

    #[test]
    fn test_missing_fields_are_drawn_from_rng() {
        // Arrange: username index, avatar number, likes, caption index.
        let mut rng = SequenceRng::new(vec![3, 12, 321, 2]);

        // Act
        let metadata = fill(MetadataOverrides::default(), &mut rng);

        // Assert
        assert_eq!(metadata.username, "Liam Johnson");
        assert_eq!(
            metadata.avatar.as_deref(),
            Some("https://i.pravatar.cc/150?img=12")
        );
        assert_eq!(metadata.likes, 321);
        assert_eq!(metadata.caption.as_deref(), Some("Coffee and vibes ☕️"));
    }

    #[test]
    fn test_supplied_fields_are_kept() {
        let overrides = MetadataOverrides {
            username: Some("Jordan".to_owned()),
            caption: Some("Trail run".to_owned()),
            avatar: Some("https://example.com/me.png".to_owned()),
            likes: Some(4),
        };

        let metadata = fill(overrides, &mut MockRng);

        assert_eq!(metadata.username, "Jordan");
        assert_eq!(metadata.caption.as_deref(), Some("Trail run"));
        assert_eq!(metadata.avatar.as_deref(), Some("https://example.com/me.png"));
        assert_eq!(metadata.likes, 4);
    }

    #[test]
    fn test_minimum_draws_stay_in_range() {
        let metadata = fill(MetadataOverrides::default(), &mut MockRng);

        assert_eq!(metadata.username, "Alex Chen");
        assert_eq!(metadata.likes, MIN_LIKES);
        assert_eq!(
            metadata.avatar.as_deref(),
            Some("https://i.pravatar.cc/150?img=0")
        );
    }
}
