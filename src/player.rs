//! Music player state machine.
//!
//! Demo mode simulates playback: a short buffering delay after `play_track`,
//! then a 1 Hz tick that advances the position until the track ends, at which
//! point the next playlist entry starts after a short delay. Every timer is a
//! stored task handle that is aborted before it is replaced, and a generation
//! counter makes a timer that already fired against superseded state a no-op,
//! so rapid transport toggling can never stack ticks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::models::Track;

const BUFFERING_DELAY: Duration = Duration::from_millis(800);
const TICK_INTERVAL: Duration = Duration::from_secs(1);
const AUTO_ADVANCE_DELAY: Duration = Duration::from_secs(1);
const DEMO_REENTRY_DELAY: Duration = Duration::from_millis(100);

/// Fallback length for tracks whose metadata carries no duration.
const DEFAULT_DURATION_SECS: u32 = 180;

/// Owning handle to the player. Dropping it aborts all scheduled timers.
#[derive(Debug)]
pub struct MusicPlayer {
    inner: Arc<Mutex<PlayerInner>>,
}

/// Point-in-time view of the player state.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub current_time: u32,
    pub duration: u32,
    pub volume: f32,
    pub is_loading: bool,
    pub is_demo_mode: bool,
    pub playlist: Vec<Track>,
}

#[derive(Debug)]
struct PlayerInner {
    current_track: Option<Track>,
    is_playing: bool,
    current_time: u32,
    duration: u32,
    volume: f32,
    is_loading: bool,
    is_demo_mode: bool,
    playlist: Vec<Track>,
    /// Generation counter; bumped on every transition that invalidates
    /// outstanding timers.
    epoch: u64,
    ticker: Option<JoinHandle<()>>,
    pending: Option<JoinHandle<()>>,
}

enum Direction {
    Next,
    Previous,
}

impl Default for MusicPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicPlayer {
    pub fn new() -> Self {
        MusicPlayer {
            inner: Arc::new(Mutex::new(PlayerInner {
                current_track: None,
                is_playing: false,
                current_time: 0,
                duration: 0,
                volume: 0.7,
                is_loading: false,
                is_demo_mode: true,
                playlist: Vec::new(),
                epoch: 0,
                ticker: None,
                pending: None,
            })),
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let state = lock(&self.inner);
        PlayerSnapshot {
            current_track: state.current_track.clone(),
            is_playing: state.is_playing,
            current_time: state.current_time,
            duration: state.duration,
            volume: state.volume,
            is_loading: state.is_loading,
            is_demo_mode: state.is_demo_mode,
            playlist: state.playlist.clone(),
        }
    }

    /// Start a track from the beginning. In demo mode playback begins after
    /// the simulated buffering delay; outside demo mode the player flips
    /// back to demo and restarts the track shortly after.
    pub fn play_track(&self, track: Track) {
        start_track(&self.inner, track);
    }

    /// Stop playback, cancelling the tick and any pending start.
    pub fn pause(&self) {
        let mut state = lock(&self.inner);
        state.epoch += 1;
        abort_timers(&mut state);
        state.is_playing = false;
        state.is_loading = false;
    }

    /// Continue playing the current track; no-op without one or while
    /// already playing.
    pub fn resume(&self) {
        let mut state = lock(&self.inner);
        if state.current_track.is_none() || state.is_playing {
            return;
        }
        state.epoch += 1;
        abort_timers(&mut state);
        state.is_loading = false;
        state.is_playing = true;
        if state.is_demo_mode {
            let epoch = state.epoch;
            state.ticker = Some(spawn_ticker(Arc::clone(&self.inner), epoch));
        }
    }

    /// Jump to a position, clamped to `[0, duration]`, regardless of play
    /// state.
    pub fn seek_to(&self, seconds: i64) {
        let mut state = lock(&self.inner);
        state.current_time = seconds.clamp(0, i64::from(state.duration)) as u32;
    }

    /// Stored as given; callers are responsible for keeping it in `[0, 1]`.
    pub fn set_volume(&self, volume: f32) {
        lock(&self.inner).volume = volume;
    }

    pub fn next_track(&self) {
        play_adjacent(&self.inner, Direction::Next, None);
    }

    pub fn previous_track(&self) {
        play_adjacent(&self.inner, Direction::Previous, None);
    }

    /// Flip between demo and real playback. An abrupt reset: whatever was
    /// scheduled is cancelled and the position returns to zero, paused.
    pub fn toggle_demo_mode(&self) {
        let mut state = lock(&self.inner);
        state.epoch += 1;
        abort_timers(&mut state);
        state.is_demo_mode = !state.is_demo_mode;
        state.is_playing = false;
        state.current_time = 0;
        state.is_loading = false;
    }

    /// Replace the play queue wholesale. Membership of the current track is
    /// not validated.
    pub fn set_playlist(&self, tracks: Vec<Track>) {
        lock(&self.inner).playlist = tracks;
    }
}

impl Drop for MusicPlayer {
    fn drop(&mut self) {
        let mut state = lock(&self.inner);
        state.epoch += 1;
        abort_timers(&mut state);
    }
}

fn lock(inner: &Arc<Mutex<PlayerInner>>) -> MutexGuard<'_, PlayerInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn abort_timers(state: &mut PlayerInner) {
    if let Some(handle) = state.ticker.take() {
        handle.abort();
    }
    if let Some(handle) = state.pending.take() {
        handle.abort();
    }
}

fn start_track(inner: &Arc<Mutex<PlayerInner>>, track: Track) {
    let mut state = lock(inner);
    state.epoch += 1;
    abort_timers(&mut state);

    state.duration = track
        .duration
        .filter(|d| *d > 0)
        .map(|d| d as u32)
        .unwrap_or(DEFAULT_DURATION_SECS);
    state.current_track = Some(track);
    state.current_time = 0;
    state.is_playing = false;

    if state.is_demo_mode {
        state.is_loading = true;
        let epoch = state.epoch;
        state.pending = Some(spawn_buffering(Arc::clone(inner), epoch));
    } else {
        // Real audio playback is not wired up; fall back to demo mode and
        // restart the track through the buffering path.
        state.is_demo_mode = true;
        state.is_loading = false;
        let epoch = state.epoch;
        state.pending = Some(spawn_demo_reentry(Arc::clone(inner), epoch));
    }
}

fn play_adjacent(inner: &Arc<Mutex<PlayerInner>>, direction: Direction, required_epoch: Option<u64>) {
    let target = {
        let state = lock(inner);
        if let Some(required) = required_epoch {
            if state.epoch != required {
                return;
            }
        }
        let current = match &state.current_track {
            Some(track) => track,
            None => return,
        };
        if state.playlist.is_empty() {
            return;
        }
        let index = match state.playlist.iter().position(|t| t.id == current.id) {
            Some(index) => match direction {
                Direction::Next => (index + 1) % state.playlist.len(),
                Direction::Previous => {
                    if index == 0 {
                        state.playlist.len() - 1
                    } else {
                        index - 1
                    }
                }
            },
            None => 0,
        };
        state.playlist[index].clone()
    };
    start_track(inner, target);
}

fn spawn_buffering(inner: Arc<Mutex<PlayerInner>>, epoch: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(BUFFERING_DELAY).await;
        let mut state = lock(&inner);
        if state.epoch != epoch {
            return;
        }
        state.is_loading = false;
        state.is_playing = true;
        state.pending = None;
        state.ticker = Some(spawn_ticker(Arc::clone(&inner), epoch));
    })
}

fn spawn_ticker(inner: Arc<Mutex<PlayerInner>>, epoch: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(TICK_INTERVAL).await;
            let ended = {
                let mut state = lock(&inner);
                if state.epoch != epoch || !state.is_playing {
                    return;
                }
                if state.current_time < state.duration {
                    state.current_time += 1;
                }
                if state.current_time >= state.duration {
                    state.is_playing = false;
                    state.ticker = None;
                    state.pending = Some(spawn_auto_advance(Arc::clone(&inner), epoch));
                    true
                } else {
                    false
                }
            };
            if ended {
                return;
            }
        }
    })
}

fn spawn_auto_advance(inner: Arc<Mutex<PlayerInner>>, epoch: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(AUTO_ADVANCE_DELAY).await;
        play_adjacent(&inner, Direction::Next, Some(epoch));
    })
}

fn spawn_demo_reentry(inner: Arc<Mutex<PlayerInner>>, epoch: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(DEMO_REENTRY_DELAY).await;
        let track = {
            let state = lock(&inner);
            if state.epoch != epoch {
                return;
            }
            match state.current_track.clone() {
                Some(track) => track,
                None => return,
            }
        };
        start_track(&inner, track);
    })
}
