//! Sound effects. Each cue is a short tone schedule; the terminal renders it as a bell.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tracing::trace;

/// Named sound cues used by the games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    Click,
    Success,
    Failure,
    Win,
    Swoosh,
    Thud,
}

impl SoundKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SoundKind::Click => "click",
            SoundKind::Success => "success",
            SoundKind::Failure => "failure",
            SoundKind::Win => "win",
            SoundKind::Swoosh => "swoosh",
            SoundKind::Thud => "thud",
        }
    }

    /// Tones making up this cue, in start order.
    pub fn schedule(self) -> &'static [Tone] {
        match self {
            SoundKind::Click => &CLICK,
            SoundKind::Success => &SUCCESS,
            SoundKind::Failure => &FAILURE,
            SoundKind::Win => &WIN,
            SoundKind::Swoosh => &SWOOSH,
            SoundKind::Thud => &THUD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

/// One oscillator burst with an exponential fade-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Start frequency in Hz.
    pub frequency: f64,
    /// Frequency reached at the end of the tone when it glides.
    pub glide_to: Option<f64>,
    pub duration: Duration,
    pub waveform: Waveform,
    /// Peak gain, 0..=1.
    pub volume: f64,
    /// Delay from the start of the cue.
    pub offset: Duration,
}

const fn tone(
    frequency: f64,
    duration_ms: u64,
    waveform: Waveform,
    volume: f64,
    offset_ms: u64,
) -> Tone {
    Tone {
        frequency,
        glide_to: None,
        duration: Duration::from_millis(duration_ms),
        waveform,
        volume,
        offset: Duration::from_millis(offset_ms),
    }
}

static CLICK: [Tone; 1] = [tone(200.0, 100, Waveform::Triangle, 0.3, 0)];

static SUCCESS: [Tone; 2] = [
    tone(440.0, 100, Waveform::Sine, 0.5, 0),
    tone(587.33, 150, Waveform::Sine, 0.5, 100),
];

static FAILURE: [Tone; 2] = [
    tone(220.0, 200, Waveform::Sawtooth, 0.4, 0),
    tone(164.81, 300, Waveform::Sawtooth, 0.4, 150),
];

// C5 E5 G5 C6 arpeggio
static WIN: [Tone; 4] = [
    tone(523.25, 100, Waveform::Sine, 0.5, 0),
    tone(659.25, 100, Waveform::Sine, 0.5, 100),
    tone(783.99, 100, Waveform::Sine, 0.5, 200),
    tone(1046.50, 200, Waveform::Sine, 0.5, 300),
];

static SWOOSH: [Tone; 1] = [Tone {
    glide_to: Some(100.0),
    ..tone(800.0, 300, Waveform::Sawtooth, 0.5, 0)
}];

static THUD: [Tone; 1] = [tone(100.0, 150, Waveform::Square, 0.6, 0)];

/// Process-wide sound output with a mute switch.
#[derive(Debug)]
pub struct SoundEngine {
    muted: AtomicBool,
    audible: bool,
    played: AtomicU64,
}

impl SoundEngine {
    /// Engine that rings the terminal bell.
    pub fn new(muted: bool) -> Self {
        Self {
            muted: AtomicBool::new(muted),
            audible: true,
            played: AtomicU64::new(0),
        }
    }

    /// Engine that only counts and logs cues.
    pub fn silent(muted: bool) -> Self {
        Self {
            audible: false,
            ..Self::new(muted)
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    /// Flips the mute flag and returns the new value.
    pub fn toggle_mute(&self) -> bool {
        !self.muted.fetch_xor(true, Ordering::Relaxed)
    }

    /// Cues played since creation (muted cues excluded).
    pub fn played(&self) -> u64 {
        self.played.load(Ordering::Relaxed)
    }

    /// Plays `kind`; returns false when muted.
    pub fn play(&self, kind: SoundKind) -> bool {
        if self.is_muted() {
            trace!(sound = kind.as_str(), "Sound skipped (muted)");
            return false;
        }
        for tone in kind.schedule() {
            trace!(
                sound = kind.as_str(),
                frequency = tone.frequency,
                glide_to = ?tone.glide_to,
                duration_ms = tone.duration.as_millis() as u64,
                waveform = ?tone.waveform,
                volume = tone.volume,
                offset_ms = tone.offset.as_millis() as u64,
                "Tone"
            );
        }
        self.played.fetch_add(1, Ordering::Relaxed);
        if self.audible {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(b"\x07");
            let _ = stdout.flush();
        }
        true
    }
}

static ENGINE: OnceLock<SoundEngine> = OnceLock::new();

/// The shared engine, created on first use.
pub fn engine() -> &'static SoundEngine {
    ENGINE.get_or_init(|| {
        if cfg!(test) {
            SoundEngine::silent(false)
        } else {
            SoundEngine::new(false)
        }
    })
}

/// Fire-and-forget playback through the shared engine.
pub fn play_sound(kind: SoundKind) {
    engine().play(kind);
}

pub fn toggle_mute() -> bool {
    engine().toggle_mute()
}

pub fn is_muted() -> bool {
    engine().is_muted()
}

pub fn set_muted(muted: bool) {
    engine().set_muted(muted);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muted_engine_skips_cues() {
        let engine = SoundEngine::silent(true);
        assert!(!engine.play(SoundKind::Click));
        assert_eq!(engine.played(), 0);

        assert!(!engine.toggle_mute());
        assert!(engine.play(SoundKind::Win));
        assert_eq!(engine.played(), 1);
    }

    #[test]
    fn toggle_mute_returns_new_state() {
        let engine = SoundEngine::silent(false);
        assert!(engine.toggle_mute());
        assert!(engine.is_muted());
        assert!(!engine.toggle_mute());
        engine.set_muted(true);
        assert!(engine.is_muted());
    }

    #[test]
    fn win_is_a_rising_arpeggio() {
        let schedule = SoundKind::Win.schedule();
        assert_eq!(schedule.len(), 4);
        for pair in schedule.windows(2) {
            assert!(pair[1].frequency > pair[0].frequency);
            assert!(pair[1].offset > pair[0].offset);
        }
        assert_eq!(schedule[3].frequency, 1046.50);
    }

    #[test]
    fn swoosh_glides_down() {
        let [swoosh] = &SWOOSH;
        assert_eq!(swoosh.frequency, 800.0);
        assert_eq!(swoosh.glide_to, Some(100.0));
        assert_eq!(swoosh.duration, Duration::from_millis(300));
        assert_eq!(SoundKind::Swoosh.schedule().len(), 1);
    }

    #[test]
    fn every_cue_has_tones_starting_at_zero() {
        for kind in [
            SoundKind::Click,
            SoundKind::Success,
            SoundKind::Failure,
            SoundKind::Win,
            SoundKind::Swoosh,
            SoundKind::Thud,
        ] {
            let schedule = kind.schedule();
            assert!(!schedule.is_empty(), "{}", kind.as_str());
            assert_eq!(schedule[0].offset, Duration::ZERO);
            assert!(schedule.iter().all(|t| t.volume > 0.0 && t.volume <= 1.0));
        }
    }
}
