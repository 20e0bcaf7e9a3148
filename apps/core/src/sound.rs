use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::{expand_home, Config};

/// Plays one sound clip to completion.
pub trait SoundPlayer {
    fn play(&mut self, clip: &Path);
}

#[derive(Debug, Default)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&mut self, _clip: &Path) {}
}

/// Plays clips through an external program (`paplay` style CLI).
#[derive(Debug)]
pub struct CommandPlayer {
    program: String,
    unavailable: bool,
}

impl CommandPlayer {
    pub fn new(program: &str) -> Self {
        let program = program.trim().to_string();
        let unavailable = program.is_empty();
        if unavailable {
            tracing::error!("sound provider is empty; sounds disabled");
        } else {
            tracing::info!(program = %program, "using sound provider");
        }
        Self {
            program,
            unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.unavailable
    }
}

impl SoundPlayer for CommandPlayer {
    fn play(&mut self, clip: &Path) {
        if self.unavailable {
            return;
        }
        let status = Command::new(&self.program)
            .arg(clip)
            .stdin(Stdio::null())
            .status();
        if let Err(error) = status {
            tracing::error!(
                program = %self.program,
                clip = %clip.display(),
                %error,
                "failed to play sound"
            );
            self.unavailable = true;
        }
    }
}

/// Decodes and plays clips in process on the default output device.
#[cfg(feature = "library-audio")]
#[derive(Debug, Default)]
pub struct LibraryPlayer {
    unavailable: bool,
}

#[cfg(feature = "library-audio")]
impl LibraryPlayer {
    pub fn new() -> Self {
        tracing::info!("using in-process audio playback");
        Self::default()
    }

    fn play_clip(clip: &Path) -> Result<(), String> {
        let (_stream, handle) = rodio::OutputStream::try_default().map_err(|e| e.to_string())?;
        let sink = rodio::Sink::try_new(&handle).map_err(|e| e.to_string())?;
        let file = std::fs::File::open(clip).map_err(|e| e.to_string())?;
        let source =
            rodio::Decoder::new(std::io::BufReader::new(file)).map_err(|e| e.to_string())?;
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

#[cfg(feature = "library-audio")]
impl SoundPlayer for LibraryPlayer {
    fn play(&mut self, clip: &Path) {
        if self.unavailable {
            return;
        }
        if let Err(error) = Self::play_clip(clip) {
            tracing::error!(clip = %clip.display(), %error, "failed to play sound; sounds disabled");
            self.unavailable = true;
        }
    }
}

#[cfg(feature = "library-audio")]
fn library_player() -> Box<dyn SoundPlayer> {
    Box::new(LibraryPlayer::new())
}

#[cfg(not(feature = "library-audio"))]
fn library_player() -> Box<dyn SoundPlayer> {
    tracing::warn!("built without library-audio; falling back to paplay");
    Box::new(CommandPlayer::new("paplay"))
}

/// Which playback implementation a provider name selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundBackend {
    Library,
    Command(String),
}

impl SoundBackend {
    pub fn from_provider(provider: &str) -> Self {
        let provider = provider.trim();
        if provider.eq_ignore_ascii_case("simpleaudio") || provider.eq_ignore_ascii_case("library")
        {
            Self::Library
        } else {
            Self::Command(provider.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Success,
    Failure,
    Startup,
    Shutdown,
}

/// Clip files for each cue; absent cues stay silent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoundCues {
    pub success: Option<PathBuf>,
    pub failure: Option<PathBuf>,
    pub startup: Option<PathBuf>,
    pub shutdown: Option<PathBuf>,
}

impl SoundCues {
    /// Startup/shutdown clips always load; result clips only with sound notifications on.
    pub fn from_config(cfg: &Config) -> Self {
        let mut cues = Self {
            startup: existing_clip(cfg.sounds.startup.as_deref()),
            shutdown: existing_clip(cfg.sounds.shutdown.as_deref()),
            ..Self::default()
        };
        if cfg.sound_notifications {
            cues.success = existing_clip(cfg.sounds.success.as_deref());
            cues.failure = existing_clip(cfg.sounds.failure.as_deref());
        }
        cues
    }

    pub fn clip(&self, cue: Cue) -> Option<&Path> {
        match cue {
            Cue::Success => self.success.as_deref(),
            Cue::Failure => self.failure.as_deref(),
            Cue::Startup => self.startup.as_deref(),
            Cue::Shutdown => self.shutdown.as_deref(),
        }
    }
}

fn existing_clip(path: Option<&Path>) -> Option<PathBuf> {
    let path = path?;
    if path.as_os_str().is_empty() {
        return None;
    }
    let expanded = expand_home(path);
    if expanded.exists() {
        Some(expanded)
    } else {
        tracing::warn!(path = %expanded.display(), "sound file does not exist");
        None
    }
}

pub struct SoundBoard {
    player: Box<dyn SoundPlayer>,
    cues: SoundCues,
}

impl SoundBoard {
    pub fn new(player: Box<dyn SoundPlayer>, cues: SoundCues) -> Self {
        Self { player, cues }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(SilentPlayer), SoundCues::default())
    }

    pub fn from_config(cfg: &Config) -> Self {
        let cues = SoundCues::from_config(cfg);
        if cues == SoundCues::default() {
            return Self::silent();
        }

        let player: Box<dyn SoundPlayer> = match SoundBackend::from_provider(&cfg.sound_provider) {
            SoundBackend::Library => library_player(),
            SoundBackend::Command(program) => Box::new(CommandPlayer::new(&program)),
        };
        Self::new(player, cues)
    }

    pub fn play(&mut self, cue: Cue) {
        if let Some(clip) = self.cues.clip(cue) {
            self.player.play(clip);
        }
    }
}
