//! Transcoder lookup.

use crate::capability::{AudioType, CapabilityRegistry, TranscoderInfo};

/// Finds enabled transcoders that bridge an engine's output formats and the
/// formats a player accepts. Results follow registry order.
#[derive(Debug, Clone, Copy)]
pub struct TranscoderLocator<'r> {
    registry: &'r CapabilityRegistry,
}

impl<'r> TranscoderLocator<'r> {
    pub fn new(registry: &'r CapabilityRegistry) -> Self {
        Self { registry }
    }

    /// Every transcoder reading one of `sources` and writing one of `accepted`.
    pub fn candidates<'a>(
        &self,
        sources: &'a [AudioType],
        accepted: &'a [AudioType],
    ) -> impl Iterator<Item = &'r TranscoderInfo> + 'a
    where
        'r: 'a,
    {
        self.registry.enabled_transcoders().filter(move |t| {
            t.input != t.output && sources.contains(&t.input) && accepted.contains(&t.output)
        })
    }

    /// First transcoder reading one of `sources` and writing one of `accepted`.
    pub fn find(&self, sources: &[AudioType], accepted: &[AudioType]) -> Option<&'r TranscoderInfo> {
        self.candidates(sources, accepted).next()
    }

    /// First transcoder turning one of `sources` into `target`.
    pub fn find_producing(&self, sources: &[AudioType], target: AudioType) -> Option<&'r TranscoderInfo> {
        self.find(sources, &[target])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{builtin_descriptors, AdapterDescriptor, RegistryBuilder};

    fn registry_with(disabled: &[&str]) -> CapabilityRegistry {
        disabled
            .iter()
            .fold(RegistryBuilder::new().extend(builtin_descriptors()), |b, id| {
                b.disable(*id)
            })
            .build()
    }

    #[test]
    fn finds_first_enabled_in_registry_order() {
        let reg = registry_with(&[]);
        let locator = TranscoderLocator::new(&reg);
        let t = locator
            .find_producing(&[AudioType::Wav], AudioType::Mp3)
            .expect("transcoder");
        assert_eq!(t.id, "lame");

        let reg = registry_with(&["lame"]);
        let locator = TranscoderLocator::new(&reg);
        let t = locator
            .find(&[AudioType::Wav], &[AudioType::Mp3])
            .expect("transcoder");
        assert_eq!(t.id, "ffmpeg");
    }

    #[test]
    fn no_transcoder_for_unmatched_formats() {
        let reg = registry_with(&[]);
        let locator = TranscoderLocator::new(&reg);
        assert!(locator.find_producing(&[AudioType::Mp3], AudioType::Wav).is_none());
        assert!(locator.find(&[], &[AudioType::Mp3]).is_none());
    }

    #[test]
    fn identity_transcoders_are_ignored() {
        let reg = RegistryBuilder::new()
            .add(AdapterDescriptor::Transcoder(TranscoderInfo {
                id: "copy".into(),
                enabled: true,
                input: AudioType::Wav,
                output: AudioType::Wav,
            }))
            .build();
        let locator = TranscoderLocator::new(&reg);
        assert!(locator.find(&[AudioType::Wav], &[AudioType::Wav]).is_none());
    }

    #[test]
    fn all_disabled_means_none() {
        let reg = registry_with(&["lame", "ffmpeg"]);
        let locator = TranscoderLocator::new(&reg);
        assert_eq!(locator.candidates(&[AudioType::Wav], &[AudioType::Mp3]).count(), 0);
    }
}
