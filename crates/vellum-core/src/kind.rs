use crate::locator::FileLocator;
use std::fmt;

/// The type tag of a resource.
///
/// Builtin kinds are inferred from file extensions through
/// [`ResourceKind::from_locator`]. Anything else (datasheets, game-specific
/// content) is a [`ResourceKind::Custom`] named after the custom factory that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Texture,
    Font,
    AudioClip,
    AudioMixerGroup,
    SoundCue,
    ImageSet,
    AnimSet,
    ParticleEffect,
    ElementWidget,
    LocalizationTable,
    Custom(String),
}

// ---------------------------------------------------------------------------
// Extension table
// ---------------------------------------------------------------------------

/// Ordered extension table. The first matching row decides the kind, so the
/// more specific `sound` suffix sits after `soundcue`.
const EXTENSION_TABLE: &[(&[&str], ResourceKind)] = &[
    (
        &["png", "jpg", "jpeg", "bmp", "tga", "gif"],
        ResourceKind::Texture,
    ),
    (&["ttf"], ResourceKind::Font),
    (&["wav", "ogg", "flac"], ResourceKind::AudioClip),
    (
        &["audiomixergroup", "audiomixergroup.xml"],
        ResourceKind::AudioMixerGroup,
    ),
    (
        &["soundcue", "soundcue.xml", "sound", "sound.xml"],
        ResourceKind::SoundCue,
    ),
    (&["imageset", "imageset.xml"], ResourceKind::ImageSet),
    (&["animset", "animset.xml"], ResourceKind::AnimSet),
    (&["particle", "particle.xml"], ResourceKind::ParticleEffect),
    (&["widget", "widget.xml"], ResourceKind::ElementWidget),
    (
        &["localization", "localization.xml"],
        ResourceKind::LocalizationTable,
    ),
];

impl ResourceKind {
    /// Infer a builtin kind from the locator's extension. Returns `None` for
    /// extensions only a custom factory can handle.
    pub fn from_locator(locator: &FileLocator) -> Option<ResourceKind> {
        EXTENSION_TABLE
            .iter()
            .find(|(extensions, _)| extensions.iter().any(|ext| locator.has_extension(ext)))
            .map(|(_, kind)| kind.clone())
    }

    /// Every builtin kind, in extension table order.
    pub fn builtins() -> impl Iterator<Item = ResourceKind> {
        EXTENSION_TABLE.iter().map(|(_, kind)| kind.clone())
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, ResourceKind::Custom(_))
    }

    pub fn name(&self) -> &str {
        match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Font => "font",
            ResourceKind::AudioClip => "audio clip",
            ResourceKind::AudioMixerGroup => "audio mixer group",
            ResourceKind::SoundCue => "sound cue",
            ResourceKind::ImageSet => "image set",
            ResourceKind::AnimSet => "anim set",
            ResourceKind::ParticleEffect => "particle effect",
            ResourceKind::ElementWidget => "element widget",
            ResourceKind::LocalizationTable => "localization table",
            ResourceKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
