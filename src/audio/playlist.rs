use rand::Rng;

use crate::audio::error::PlayerError;
use crate::audio::state::Track;

/// Fixed, non-empty, ordered list of tracks.
#[derive(Debug, Clone)]
pub struct Playlist {
    tracks: Vec<Track>,
}

// `new` rejects empty track lists, so there is no `is_empty`.
#[allow(clippy::len_without_is_empty)]
impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Result<Self, PlayerError> {
        if tracks.is_empty() {
            return Err(PlayerError::EmptyPlaylist);
        }
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Sequential successor, wrapping to the first track.
    pub fn next_index(&self, current: usize) -> usize {
        (current + 1) % self.len()
    }

    /// Sequential predecessor, wrapping to the last track.
    pub fn prev_index(&self, current: usize) -> usize {
        (current + self.len() - 1) % self.len()
    }

    /// Uniformly random index other than `current`. A single-track playlist returns 0.
    pub fn random_other<R: Rng + ?Sized>(&self, current: usize, rng: &mut R) -> usize {
        let len = self.len();
        if len == 1 {
            return 0;
        }
        (current + rng.random_range(1..len)) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn playlist(len: usize) -> Playlist {
        let tracks = (0..len)
            .map(|i| Track {
                title: format!("Track {i}"),
                artist: "Artist".into(),
                source: format!("/music/{i}.mp3"),
            })
            .collect();
        Playlist::new(tracks).unwrap()
    }

    #[test]
    fn rejects_empty_playlist() {
        assert!(matches!(
            Playlist::new(Vec::new()),
            Err(PlayerError::EmptyPlaylist)
        ));
    }

    #[test]
    fn sequential_indices_wrap() {
        for len in 2..8 {
            let list = playlist(len);
            for i in 0..len {
                assert_eq!(list.next_index(i), (i + 1) % len);
                assert_eq!(list.prev_index(i), (i + len - 1) % len);
            }
        }
    }

    #[test]
    fn single_track_wraps_onto_itself() {
        let list = playlist(1);
        assert_eq!(list.next_index(0), 0);
        assert_eq!(list.prev_index(0), 0);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(list.random_other(0, &mut rng), 0);
    }

    #[test]
    fn shuffle_never_repeats_current() {
        let mut rng = StdRng::seed_from_u64(42);
        for len in 2..6 {
            let list = playlist(len);
            for current in 0..len {
                for _ in 0..200 {
                    let next = list.random_other(current, &mut rng);
                    assert_ne!(next, current);
                    assert!(next < len);
                }
            }
        }
    }

    #[test]
    fn shuffle_reaches_every_other_track() {
        let mut rng = StdRng::seed_from_u64(1);
        let list = playlist(4);
        let mut seen = [false; 4];
        for _ in 0..500 {
            seen[list.random_other(0, &mut rng)] = true;
        }
        assert_eq!(seen, [false, true, true, true]);
    }
}
