use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use lumina_player::audio::engine::{EngineSettings, PlayerEngineHandle};
use lumina_player::audio::host::{MediaElement, MediaEvent};
use lumina_player::audio::tap::SampleTap;
use lumina_player::audio::{
    PlaybackStatus, PlayerError, PlayerNotification, PlayerState, Playlist, Track, UserAction,
};

const WAIT: Duration = Duration::from_secs(3);

#[derive(Default)]
struct Script {
    source: String,
    loads: usize,
    plays: usize,
    pauses: usize,
    position: f64,
    volume: f32,
    muted: bool,
    refuse_play: bool,
    pending: Vec<MediaEvent>,
}

/// Media element driven by the test through a shared script.
struct ScriptedMedia(Arc<Mutex<Script>>);

impl MediaElement for ScriptedMedia {
    fn set_source(&mut self, locator: &str) {
        self.0.lock().source = locator.to_string();
    }

    fn load(&mut self) {
        let mut script = self.0.lock();
        script.loads += 1;
        script.position = 0.0;
        script.pending.push(MediaEvent::MetadataLoaded);
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        let mut script = self.0.lock();
        if script.refuse_play {
            return Err(PlayerError::NotLoaded);
        }
        script.plays += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.0.lock().pauses += 1;
    }

    fn current_time(&self) -> f64 {
        self.0.lock().position
    }

    fn duration(&self) -> Option<f64> {
        Some(100.0)
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut script = self.0.lock();
        script.position = seconds;
        script.pending.push(MediaEvent::TimeUpdate);
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.lock().volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.0.lock().muted = muted;
    }

    fn output_tap(&self) -> SampleTap {
        SampleTap::new()
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.0.lock().pending)
    }
}

fn playlist() -> Playlist {
    let tracks = ["Aurora", "Borealis", "Cascade"]
        .iter()
        .map(|title| Track {
            title: title.to_string(),
            artist: "Lumen".into(),
            source: format!("/music/{}.mp3", title.to_lowercase()),
        })
        .collect();
    Playlist::new(tracks).unwrap()
}

fn spawn(script: &Arc<Mutex<Script>>) -> PlayerEngineHandle {
    let mut settings = EngineSettings::new(playlist());
    settings.options.loading_hold = Duration::from_millis(30);
    settings.options.volume = 0.7;
    let script = script.clone();
    PlayerEngineHandle::spawn_with(settings, move || Ok(ScriptedMedia(script))).unwrap()
}

fn wait_for(
    engine: &PlayerEngineHandle,
    what: &str,
    check: impl Fn(&PlayerState) -> bool,
) -> PlayerState {
    let deadline = Instant::now() + WAIT;
    loop {
        let state = engine.get_state();
        if check(&state) {
            return state;
        }
        if Instant::now() > deadline {
            panic!("timed out waiting for {}: {:?}", what, state);
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn mounts_paused_on_first_track() {
    let script = Arc::new(Mutex::new(Script::default()));
    let engine = spawn(&script);

    let state = wait_for(&engine, "duration label", |s| s.duration_label == "1:40");
    assert_eq!(state.status, PlaybackStatus::Paused);
    assert_eq!(state.current_index, 0);
    assert_eq!(state.current_track.title, "Aurora");
    assert_eq!(state.current_time_label, "0:00");
    assert_eq!(state.volume, 0.7);

    let script = script.lock();
    assert_eq!(script.source, "/music/aurora.mp3");
    assert_eq!(script.loads, 1);
    assert_eq!(script.volume, 0.7);
    assert!(!script.muted);
}

#[test]
fn play_then_skip_passes_through_loading() {
    let script = Arc::new(Mutex::new(Script::default()));
    let engine = spawn(&script);
    let notifications = engine.notifications();

    engine.toggle_play().unwrap();
    wait_for(&engine, "playing", |s| s.status == PlaybackStatus::Playing);

    engine.skip_forward().unwrap();
    let state = wait_for(&engine, "second track playing", |s| {
        s.current_index == 1 && s.status == PlaybackStatus::Playing
    });
    assert_eq!(state.current_track.title, "Borealis");
    assert_eq!(script.lock().source, "/music/borealis.mp3");
    assert_eq!(script.lock().plays, 2);

    let seen: Vec<PlayerNotification> = notifications.try_iter().collect();
    assert!(seen.contains(&PlayerNotification::TrackChanged {
        index: 1,
        track: state.current_track.clone(),
    }));
    assert!(seen.iter().any(|n| matches!(
        n,
        PlayerNotification::StateChanged(s) if s.status == PlaybackStatus::Loading
    )));
}

#[test]
fn ended_advances_to_next_track() {
    let script = Arc::new(Mutex::new(Script::default()));
    let engine = spawn(&script);

    engine.toggle_play().unwrap();
    wait_for(&engine, "playing", |s| s.status == PlaybackStatus::Playing);

    script.lock().pending.push(MediaEvent::Ended);
    wait_for(&engine, "next track", |s| {
        s.current_index == 1 && s.status == PlaybackStatus::Playing
    });
}

#[test]
fn repeat_restarts_the_same_track() {
    let script = Arc::new(Mutex::new(Script::default()));
    let engine = spawn(&script);

    engine.send(UserAction::ToggleRepeat).unwrap();
    engine.toggle_play().unwrap();
    wait_for(&engine, "playing with repeat", |s| {
        s.repeat_enabled && s.status == PlaybackStatus::Playing
    });

    {
        let mut media = script.lock();
        media.position = 99.0;
        media.pending.push(MediaEvent::TimeUpdate);
    }
    wait_for(&engine, "near the end", |s| (s.progress_percent - 99.0).abs() < 1e-9);

    script.lock().pending.push(MediaEvent::Ended);
    let state = wait_for(&engine, "restart", |s| s.progress_percent == 0.0);
    assert_eq!(state.current_index, 0);
    assert_eq!(state.current_time_label, "0:00");
    assert_eq!(state.status, PlaybackStatus::Playing);
    assert_eq!(script.lock().plays, 2);
}

#[test]
fn seek_updates_progress() {
    let script = Arc::new(Mutex::new(Script::default()));
    let engine = spawn(&script);

    wait_for(&engine, "metadata", |s| s.duration_label == "1:40");
    engine.send(UserAction::SeekPercent(25.0)).unwrap();
    let state = wait_for(&engine, "progress", |s| s.progress_percent == 25.0);
    assert_eq!(state.current_time_label, "0:25");
}

#[test]
fn volume_zero_mutes() {
    let script = Arc::new(Mutex::new(Script::default()));
    let engine = spawn(&script);

    engine.send(UserAction::SetVolume(0.0)).unwrap();
    wait_for(&engine, "muted", |s| s.is_muted && s.volume == 0.0);
    assert!(script.lock().muted);
}

#[test]
fn refused_play_stays_paused() {
    let script = Arc::new(Mutex::new(Script {
        refuse_play: true,
        ..Script::default()
    }));
    let engine = spawn(&script);

    engine.toggle_play().unwrap();
    engine.send(UserAction::ToggleShuffle).unwrap();
    let state = wait_for(&engine, "shuffle applied", |s| s.shuffle_enabled);
    assert_eq!(state.status, PlaybackStatus::Paused);
    assert_eq!(state.visualizer_bars, [20.0; 5]);
}

#[test]
fn failing_media_element_fails_spawn() {
    let result = PlayerEngineHandle::spawn_with(EngineSettings::new(playlist()), || {
        Err::<ScriptedMedia, _>(PlayerError::OutputUnavailable("no device".into()))
    });
    assert!(matches!(result, Err(PlayerError::OutputUnavailable(_))));
}

#[test]
fn dropping_the_handle_pauses_media() {
    let script = Arc::new(Mutex::new(Script::default()));
    let engine = spawn(&script);

    engine.toggle_play().unwrap();
    wait_for(&engine, "playing", |s| s.status == PlaybackStatus::Playing);
    let pauses_before = script.lock().pauses;

    drop(engine);
    assert!(script.lock().pauses > pauses_before);
}
