// crates/clipdeck-media/src/pool.rs
//
// MediaPool: the public API. Owns the backend and every open session.
//
// The pool is driven from one thread (the tick context). The only thing that
// crosses to the audio callback is an AudioTap, obtained per handle.
//
// Every operation taking a SessionHandle resolves it through the generational
// pool first; stale or never-issued handles are reported (or ignored, for
// close and render_audio) without touching any session.

use std::path::Path;

use tracing::{debug, info, warn};

use clipdeck_core::{
    AudioFormat, ClockState, OpenError, OpenParams, Pool, PoolConfig, PresentationImage,
    SessionError, SessionHandle,
};

use crate::audio::AudioTap;
use crate::backend::MediaBackend;
use crate::decode::TickOutcome;
use crate::probe::open_session;
use crate::session::Session;
use crate::thumbnail::Thumbnail;

pub struct MediaPool<B: MediaBackend> {
    // Sessions go before the backend so they are torn down first.
    sessions: Pool<Session<B>>,
    config:   PoolConfig,
    backend:  B,
}

impl<B: MediaBackend> MediaPool<B> {
    pub fn new(backend: B, config: PoolConfig) -> Self {
        Self { sessions: Pool::new(config.capacity), config, backend }
    }

    pub fn capacity(&self) -> usize { self.sessions.capacity() }

    pub fn live_count(&self) -> usize { self.sessions.live_count() }

    pub fn contains(&self, handle: SessionHandle) -> bool { self.sessions.contains(handle) }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Open `path`. Fails fast with `PoolExhausted` before touching the file
    /// when every slot is live; the caller must close sessions to recover.
    pub fn open(&mut self, path: impl AsRef<Path>, params: &OpenParams) -> Result<SessionHandle, OpenError> {
        let path = path.as_ref();
        if self.sessions.is_full() {
            warn!(path = %path.display(), capacity = self.capacity(), "session pool exhausted");
            return Err(OpenError::PoolExhausted);
        }
        let session = open_session(&self.backend, path, params, &self.config)
            .inspect_err(|e| warn!(path = %path.display(), error = %e, "open failed"))?;
        let handle = self.sessions.allocate(session)?;
        info!(%handle, path = %path.display(), "session opened");
        Ok(handle)
    }

    /// Tear down a session. No-op for closed, stale or invalid handles.
    pub fn close(&mut self, handle: SessionHandle) -> bool {
        match self.sessions.free(handle) {
            Some(session) => {
                info!(%handle, path = %session.path().display(), "session closed");
                drop(session);
                true
            }
            None => {
                debug!(%handle, "close on stale handle ignored");
                false
            }
        }
    }

    // ── Playback ──────────────────────────────────────────────────────────────

    pub fn tick(&mut self, handle: SessionHandle, position_secs: f64) -> Result<TickOutcome, SessionError> {
        let session = self.sessions.get_mut(handle).ok_or(SessionError::StaleHandle)?;
        Ok(session.tick(position_secs))
    }

    /// Fill `frame_count` interleaved frames of `out` (clamped to its length)
    /// in the session's audio format. Stale handles and sessions without
    /// audio produce silence; a stale handle zeroes all of `out`.
    pub fn render_audio(&self, handle: SessionHandle, out: &mut [f32], frame_count: usize) {
        let Some(session) = self.sessions.get(handle) else {
            out.fill(0.0);
            return;
        };
        let channels = session.output_format().channels as usize;
        let samples  = frame_count.saturating_mul(channels).min(out.len());
        session.render_audio(&mut out[..samples]);
    }

    /// Callback-context handle for the session's audio. `None` when the
    /// handle is stale or the session has no audio track.
    pub fn audio_tap(&self, handle: SessionHandle) -> Option<AudioTap<B>> {
        self.sessions.get(handle)?.audio_tap()
    }

    pub fn make_thumbnail(
        &mut self,
        handle:        SessionHandle,
        position_secs: f64,
        box_size:      (u32, u32),
    ) -> Result<Thumbnail, SessionError> {
        let session = self.sessions.get_mut(handle).ok_or(SessionError::StaleHandle)?;
        session.thumbnail(position_secs, box_size)
    }

    // ── Accessors (pure reads) ────────────────────────────────────────────────

    pub fn total_seconds(&self, handle: SessionHandle) -> Option<f64> {
        self.sessions.get(handle).map(Session::total_secs)
    }

    pub fn position_seconds(&self, handle: SessionHandle) -> Option<f64> {
        self.sessions.get(handle).map(Session::position_secs)
    }

    pub fn next_swap_seconds(&self, handle: SessionHandle) -> Option<f64> {
        self.sessions.get(handle).map(Session::next_swap_secs)
    }

    pub fn clock_state(&self, handle: SessionHandle) -> Option<ClockState> {
        self.sessions.get(handle).map(Session::clock_state)
    }

    pub fn width(&self, handle: SessionHandle) -> Option<u32> {
        self.sessions.get(handle).map(Session::width)
    }

    pub fn height(&self, handle: SessionHandle) -> Option<u32> {
        self.sessions.get(handle).map(Session::height)
    }

    pub fn image(&self, handle: SessionHandle) -> Option<&PresentationImage> {
        self.sessions.get(handle).map(Session::image)
    }

    pub fn file_name(&self, handle: SessionHandle) -> Option<String> {
        self.sessions.get(handle).map(Session::file_name)
    }

    pub fn file_path(&self, handle: SessionHandle) -> Option<&Path> {
        self.sessions.get(handle).map(Session::path)
    }

    pub fn has_audio(&self, handle: SessionHandle) -> Option<bool> {
        self.sessions.get(handle).map(Session::has_audio)
    }

    pub fn audio_format(&self, handle: SessionHandle) -> Option<AudioFormat> {
        self.sessions.get(handle).map(Session::output_format)
    }

    // ── GC sweep ──────────────────────────────────────────────────────────────
    //
    // clear_marks() → mark(h) for every handle still referenced → sweep().
    // Anything not marked since the last clear_marks is closed.

    pub fn clear_marks(&mut self) {
        self.sessions.clear_marks();
    }

    pub fn mark(&mut self, handle: SessionHandle) -> bool {
        self.sessions.mark(handle)
    }

    /// Close every live, unmarked session. Returns how many were closed.
    pub fn sweep(&mut self) -> usize {
        let evicted = self.sessions.sweep();
        let n = evicted.len();
        for (handle, session) in evicted {
            info!(%handle, path = %session.path().display(), "session swept");
        }
        n
    }
}

impl<B: MediaBackend> Drop for MediaPool<B> {
    fn drop(&mut self) {
        let sessions = self.sessions.drain();
        if !sessions.is_empty() {
            debug!(count = sessions.len(), "closing remaining sessions");
        }
    }
}
