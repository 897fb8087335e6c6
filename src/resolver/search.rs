//! Candidate filtering for one audio format: input format, cache policy,
//! then player mode.
//!
//! Each step returns `Option`; a `None` sends the caller on to its next
//! fallback.

use crate::capability::{AudioType, EngineInfo, PlayerInfo, PlayerMode};

/// A player that works with the engine for one audio format.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlayerMatch<'r> {
    pub player: &'r PlayerInfo,
    pub mode: PlayerMode,
    pub use_cache: bool,
    /// The forced mode or the forced cache flag could not be kept.
    pub overrode_request: bool,
}

/// Audio formats to try for `engine`, best first: the forced format, then
/// cache-friendly formats, then the engine's remaining formats in declared
/// order.
pub(crate) fn audio_candidates(engine: &EngineInfo, wanted: Option<AudioType>) -> Vec<AudioType> {
    let mut ordered: Vec<AudioType> = Vec::with_capacity(engine.output_formats.len());
    let preferred = wanted
        .into_iter()
        .chain(AudioType::PREFERENCE)
        .chain(engine.output_formats.iter().copied());

    for audio in preferred {
        if audio != AudioType::None && engine.produces(audio) && !ordered.contains(&audio) {
            ordered.push(audio);
        }
    }
    ordered
}

/// Transports to try, best first: the forced mode, the engine's default,
/// then the engine's other modes in priority order.
fn mode_candidates(engine: &EngineInfo, wanted: Option<PlayerMode>) -> Vec<PlayerMode> {
    let mut ordered: Vec<PlayerMode> = Vec::with_capacity(engine.player_modes.len());
    let preferred = wanted
        .into_iter()
        .chain(engine.default_mode())
        .chain(engine.player_modes.iter().copied());

    for mode in preferred {
        if mode.uses_player() && engine.supports_mode(mode) && !ordered.contains(&mode) {
            ordered.push(mode);
        }
    }
    ordered
}

/// Pick the best player among `players` (already in preference order) for
/// `engine` writing `audio` directly to the player.
///
/// Cache policy: the config caches when caching was forced on, or left open
/// and `audio` is cache-friendly. Only then are caching players preferred;
/// otherwise the default player and the engine's default mode keep their
/// precedence. If no caching player survives the mode filter, the search is
/// repeated over all players with caching off.
pub(crate) fn find_best_config<'r>(
    engine: &EngineInfo,
    audio: AudioType,
    players: &[&'r PlayerInfo],
    wanted_mode: Option<PlayerMode>,
    wanted_cache: Option<bool>,
) -> Option<PlayerMatch<'r>> {
    let accepting: Vec<&'r PlayerInfo> = players
        .iter()
        .copied()
        .filter(|p| p.accepts(audio))
        .collect();
    if accepting.is_empty() {
        return None;
    }

    let modes = mode_candidates(engine, wanted_mode);
    let wants_cache = engine.supports_cache
        && audio != AudioType::None
        && wanted_cache.unwrap_or_else(|| audio.is_cache_friendly());

    if wants_cache {
        let caching: Vec<&'r PlayerInfo> = accepting
            .iter()
            .copied()
            .filter(|p| p.supports_cache)
            .collect();
        if let Some((player, mode)) = first_with_mode(&caching, &modes) {
            return Some(PlayerMatch {
                player,
                mode,
                use_cache: true,
                overrode_request: wanted_mode.is_some_and(|m| m != mode),
            });
        }
    }

    let (player, mode) = first_with_mode(&accepting, &modes)?;
    Some(PlayerMatch {
        player,
        mode,
        use_cache: false,
        overrode_request: wanted_mode.is_some_and(|m| m != mode) || wanted_cache == Some(true),
    })
}

/// First mode (in order) that some player supports, with the first such
/// player.
fn first_with_mode<'r>(
    players: &[&'r PlayerInfo],
    modes: &[PlayerMode],
) -> Option<(&'r PlayerInfo, PlayerMode)> {
    modes.iter().find_map(|mode| {
        players
            .iter()
            .find(|p| p.supports_mode(*mode))
            .map(|p| (*p, *mode))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::PlayerMode::{EngineSpeak, File, Pipe, SlaveFile};

    fn engine(formats: &[AudioType], modes: &[PlayerMode]) -> EngineInfo {
        EngineInfo {
            id: "e".into(),
            enabled: true,
            output_formats: formats.to_vec(),
            player_modes: modes.to_vec(),
            default_mode: None,
            default_player: None,
            supports_cache: true,
            settings: Vec::new(),
        }
    }

    fn player(id: &str, formats: &[AudioType], modes: &[PlayerMode], cache: bool) -> PlayerInfo {
        PlayerInfo {
            id: id.into(),
            enabled: true,
            input_formats: formats.to_vec(),
            player_modes: modes.to_vec(),
            supports_cache: cache,
            rank: 0,
            settings: Vec::new(),
        }
    }

    #[test]
    fn audio_candidates_prefer_forced_then_mp3() {
        let e = engine(&[AudioType::Wav, AudioType::Mp3], &[File]);
        assert_eq!(audio_candidates(&e, None), vec![AudioType::Mp3, AudioType::Wav]);
        assert_eq!(
            audio_candidates(&e, Some(AudioType::Wav)),
            vec![AudioType::Wav, AudioType::Mp3]
        );
        assert!(audio_candidates(&engine(&[], &[EngineSpeak]), None).is_empty());
    }

    #[test]
    fn mode_candidates_skip_engine_speak_and_duplicates() {
        let mut e = engine(&[AudioType::Wav], &[EngineSpeak, Pipe, File]);
        e.default_mode = Some(File);
        assert_eq!(mode_candidates(&e, Some(Pipe)), vec![Pipe, File]);
        assert_eq!(mode_candidates(&e, None), vec![File, Pipe]);
        // An unsupported wish is ignored.
        assert_eq!(mode_candidates(&e, Some(SlaveFile)), vec![File, Pipe]);
    }

    #[test]
    fn prefers_caching_player_for_mp3() {
        let e = engine(&[AudioType::Mp3], &[File]);
        let plain = player("plain", &[AudioType::Mp3], &[File], false);
        let caching = player("caching", &[AudioType::Mp3], &[File], true);

        let m = find_best_config(&e, AudioType::Mp3, &[&plain, &caching], None, None)
            .expect("match");
        assert_eq!(m.player.id, "caching");
        assert!(m.use_cache);
        assert!(!m.overrode_request);
    }

    #[test]
    fn wav_is_not_cached_unless_forced() {
        let e = engine(&[AudioType::Wav], &[File]);
        let caching = player("caching", &[AudioType::Wav], &[File], true);

        let m = find_best_config(&e, AudioType::Wav, &[&caching], None, None).expect("match");
        assert!(!m.use_cache);

        let m = find_best_config(&e, AudioType::Wav, &[&caching], None, Some(true)).expect("match");
        assert!(m.use_cache);
    }

    #[test]
    fn uncached_wav_keeps_player_order() {
        let e = engine(&[AudioType::Wav], &[File]);
        let plain = player("plain", &[AudioType::Wav], &[File], false);
        let caching = player("caching", &[AudioType::Wav], &[File], true);

        let m = find_best_config(&e, AudioType::Wav, &[&plain, &caching], None, None)
            .expect("match");
        assert_eq!(m.player.id, "plain");
        assert!(!m.use_cache);
        assert!(!m.overrode_request);
    }

    #[test]
    fn forced_cache_falls_back_when_no_caching_player_fits() {
        let e = engine(&[AudioType::Wav], &[Pipe]);
        let caching = player("caching", &[AudioType::Wav], &[File], true);
        let piping = player("piping", &[AudioType::Wav], &[Pipe], false);

        let m = find_best_config(&e, AudioType::Wav, &[&caching, &piping], None, Some(true))
            .expect("match");
        assert_eq!(m.player.id, "piping");
        assert!(!m.use_cache);
        assert!(m.overrode_request);
    }

    #[test]
    fn forced_mode_is_negotiated_away_when_unshared() {
        let e = engine(&[AudioType::Wav], &[Pipe, File]);
        let p = player("p", &[AudioType::Wav], &[File], false);

        let m = find_best_config(&e, AudioType::Wav, &[&p], Some(Pipe), None).expect("match");
        assert_eq!(m.mode, File);
        assert!(m.overrode_request);
    }

    #[test]
    fn no_match_without_shared_mode_or_format() {
        let e = engine(&[AudioType::Wav], &[Pipe]);
        let file_only = player("f", &[AudioType::Wav], &[File], true);
        let mp3_only = player("m", &[AudioType::Mp3], &[Pipe], true);

        assert!(find_best_config(&e, AudioType::Wav, &[&file_only, &mp3_only], None, None).is_none());
    }

    #[test]
    fn cache_forced_off_keeps_registry_order() {
        let e = engine(&[AudioType::Mp3], &[File]);
        let plain = player("plain", &[AudioType::Mp3], &[File], false);
        let caching = player("caching", &[AudioType::Mp3], &[File], true);

        let m = find_best_config(&e, AudioType::Mp3, &[&plain, &caching], None, Some(false))
            .expect("match");
        assert_eq!(m.player.id, "plain");
        assert!(!m.use_cache);
    }
}
