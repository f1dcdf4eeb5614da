//! App — the live session event loop.
//!
//! Owns the terminal, the modal mode machine, the level-meter simulator,
//! and the player/recorder process managers. Background producers (key
//! reader, metadata poller, level sampler, recorder watcher) feed one
//! `AppMessage` channel; shared fields live in `SessionHandle` with the
//! writer discipline documented there.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use airwave_core::config::Config;
use airwave_core::favorites::{self, Favorites, LastStation};
use airwave_core::probe;
use airwave_core::session::SessionHandle;

use crate::components;
use crate::meter::LevelMeter;
use crate::modal::{Mode, PickOutcome, PickPurpose, QuickPick, TextEntry, TextOutcome, TextPurpose};
use crate::player::Player;
use crate::pollers;
use crate::recorder::{self, Recorder, RecorderError};
use crate::theme::{self, Theme};

const HINTS: &str = "p=Play/Pause  s=Song  i=Info  r=Record  n=RecordAs  f=Fav  w=Stations  t=Theme  v=Meter  h=Help  q=Quit";
const TEXT_ENTRY_HINT: &str = "(Enter = accept, Esc = cancel)";

/// Everything that flows into the event loop.
pub enum AppMessage {
    /// A key press from the raw terminal reader.
    Key(KeyEvent),
    /// A producer changed session state and wants a frame now.
    Redraw,
    /// One jittered level reading from the audio sampler, already in [1, 10].
    LevelSample(u8),
    /// Formatted recorder progress, one line per complete snapshot.
    RecorderStatus(String),
    /// The recorder's progress stream closed (natural exit or stop).
    RecorderExited,
}

enum TextEvent {
    Live(String),
    Accepted(TextPurpose, String),
    Cancelled,
}

pub struct App {
    config: Config,
    session: SessionHandle,
    favorites: Favorites,
    last_station_path: PathBuf,
    player: Player,
    recorder: Recorder,
    meter: LevelMeter,
    mode: Mode,
    theme: &'static Theme,
    tx: mpsc::Sender<AppMessage>,
    /// Targets behind the current station quick-pick, index-aligned with the
    /// displayed list.
    pick_targets: Vec<(String, String)>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: Config,
        session: SessionHandle,
        favorites: Favorites,
        last_station_path: PathBuf,
        tx: mpsc::Sender<AppMessage>,
    ) -> Self {
        let meter = LevelMeter::new(config.meter.bars);
        let theme = theme::by_name(&config.ui.theme);
        let recorder = Recorder::new(Duration::from_secs(config.recording.stop_grace_secs));
        Self {
            config,
            session,
            favorites,
            last_station_path,
            player: Player::new(),
            recorder,
            meter,
            mode: Mode::Normal,
            theme,
            tx,
            pick_targets: Vec::new(),
            tasks: Vec::new(),
            should_quit: false,
        }
    }

    /// Run the session until quit. The terminal is restored and all child
    /// processes are stopped on every exit path, including errors.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<AppMessage>,
        initial: Option<(String, String)>,
    ) -> anyhow::Result<()> {
        self.session.set_hints(HINTS).await;
        self.tasks.push(spawn_input_reader(self.tx.clone()));
        self.tasks.push(pollers::spawn_metadata_poller(
            self.session.clone(),
            self.tx.clone(),
            self.config.metadata.clone(),
        ));
        self.tasks.push(pollers::spawn_level_sampler(
            self.session.clone(),
            self.tx.clone(),
            self.config.meter.clone(),
        ));

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal, &mut rx, initial).await;

        disable_raw_mode().ok();
        execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
        terminal.show_cursor().ok();

        self.shutdown().await;
        result
    }

    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        rx: &mut mpsc::Receiver<AppMessage>,
        initial: Option<(String, String)>,
    ) -> anyhow::Result<()> {
        if let Some((name, url)) = initial {
            self.switch_station(&name, &url).await;
        }

        let mut render = tokio::time::interval(self.config.ui.frame_interval());
        render.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = render.tick() => {
                    self.on_render_tick().await?;
                    self.draw(terminal).await?;
                }
                msg = rx.recv() => match msg {
                    None => break,
                    Some(msg) => self.on_message(msg, terminal).await?,
                },
            }
            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    async fn shutdown(&mut self) {
        info!("session: shutting down");
        self.player.stop().await;
        if self.recorder.is_recording() {
            self.recorder.stop().await;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    async fn draw(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let state = self.session.snapshot().await;
        let theme = self.theme;
        let bars = self.meter.heights();
        terminal.draw(|frame| components::draw_dashboard(frame, &state, theme, bars))?;
        Ok(())
    }

    /// Per-frame work: quick-pick idle timeout and meter animation. Meter
    /// motion is suspended while a modal prompt owns input.
    async fn on_render_tick(&mut self) -> anyhow::Result<()> {
        let now = Instant::now();
        let finished = if let Mode::QuickPick(qp) = &mut self.mode {
            match qp.on_tick(now) {
                PickOutcome::Done(selection) => Some((qp.purpose, selection)),
                PickOutcome::Pending => None,
            }
        } else {
            None
        };
        if let Some((purpose, selection)) = finished {
            self.leave_modal().await;
            self.apply_pick(purpose, selection).await?;
        }

        if !self.mode.is_modal() {
            let paused = self.session.is_paused().await;
            self.meter.tick(paused, &mut rand::thread_rng());
        }
        Ok(())
    }

    async fn on_message(
        &mut self,
        msg: AppMessage,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        match msg {
            AppMessage::Key(key) => self.on_key(key).await?,
            AppMessage::Redraw => self.draw(terminal).await?,
            AppMessage::LevelSample(level) => {
                if !self.mode.is_modal() {
                    self.meter.push_sample(level);
                }
            }
            AppMessage::RecorderStatus(status) => {
                if !self.mode.is_modal() && self.recorder.is_recording() {
                    self.session.set_info_lines(vec![status]).await;
                }
            }
            AppMessage::RecorderExited => {
                // Arrives after a requested stop too; only report an
                // unrequested exit.
                let path = self.session.snapshot().await.recording_path;
                if let Some(path) = path {
                    if !self.recorder.is_recording() {
                        self.session.set_recording_path(None).await;
                        if !self.mode.is_modal() {
                            self.session
                                .set_info_lines(vec![format!("Recording ended: {}", path)])
                                .await;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // ── Key dispatch ──────────────────────────────────────────────────────────

    async fn on_key(&mut self, key: KeyEvent) -> anyhow::Result<()> {
        if matches!(self.mode, Mode::Normal) {
            return self.on_hotkey(key).await;
        }

        let finished = if let Mode::QuickPick(qp) = &mut self.mode {
            match qp.on_key(key.code, Instant::now()) {
                PickOutcome::Done(selection) => Some((qp.purpose, selection)),
                PickOutcome::Pending => None,
            }
        } else {
            None
        };
        if let Some((purpose, selection)) = finished {
            self.leave_modal().await;
            return self.apply_pick(purpose, selection).await;
        }

        let text_event = if let Mode::TextInput(entry) = &mut self.mode {
            Some(match entry.on_key(key) {
                TextOutcome::Pending => {
                    TextEvent::Live(format!("{}{}", entry.prompt, entry.value()))
                }
                TextOutcome::Accepted(value) => TextEvent::Accepted(entry.purpose, value),
                TextOutcome::Cancelled => TextEvent::Cancelled,
            })
        } else {
            None
        };
        match text_event {
            Some(TextEvent::Live(line)) => {
                self.session
                    .set_info_lines(vec![line, TEXT_ENTRY_HINT.to_string()])
                    .await;
            }
            Some(TextEvent::Accepted(purpose, value)) => {
                self.leave_modal().await;
                self.apply_text(purpose, value).await?;
            }
            Some(TextEvent::Cancelled) => {
                self.leave_modal().await;
            }
            None => {}
        }
        Ok(())
    }

    async fn on_hotkey(&mut self, key: KeyEvent) -> anyhow::Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }
        let KeyCode::Char(c) = key.code else {
            return Ok(());
        };
        match c.to_ascii_lowercase() {
            'p' => {
                let paused = match self.player.toggle_pause().await {
                    Ok(paused) => paused,
                    Err(e) => {
                        warn!("player: pause toggle failed: {}", e);
                        self.player.is_paused()
                    }
                };
                self.session.set_paused(paused).await;
            }
            's' => self.spawn_title_fetch().await,
            'i' => self.show_station_info().await,
            'r' => self.toggle_recording(None, None).await?,
            'n' => self.enter_record_filename_prompt().await,
            'f' => self.add_current_to_favorites().await,
            'w' => self.enter_station_pick().await,
            't' => self.enter_theme_pick().await,
            'v' => {
                self.session.toggle_meter_visible().await;
            }
            'h' | '?' => self.show_help().await,
            'q' => {
                info!("session: quit requested");
                self.should_quit = true;
            }
            _ => {} // unknown keys are ignored
        }
        Ok(())
    }

    // ── Modal lifecycle ───────────────────────────────────────────────────────

    async fn enter_modal(&mut self, mode: Mode) {
        self.session.set_input_active(true).await;
        self.mode = mode;
    }

    /// Release input ownership. Every modal exit path (accept, cancel,
    /// timeout) funnels through here.
    async fn leave_modal(&mut self) {
        self.mode = Mode::Normal;
        self.session.set_input_active(false).await;
        self.session.clear_info().await;
        let _ = self.tx.try_send(AppMessage::Redraw);
    }

    // ── Hotkey actions ────────────────────────────────────────────────────────

    async fn spawn_title_fetch(&self) {
        let session = self.session.clone();
        let tx = self.tx.clone();
        let timeout = self.config.metadata.probe_timeout();
        tokio::spawn(async move {
            let url = session.stream_url().await;
            if url.is_empty() {
                return;
            }
            let line = match probe::stream_title(&url, timeout).await {
                Ok(title) => title,
                Err(e) => {
                    debug!("title fetch failed: {}", e);
                    "No track information available".to_string()
                }
            };
            session.set_info_lines(vec![line]).await;
            let _ = tx.send(AppMessage::Redraw).await;
        });
    }

    async fn show_station_info(&mut self) {
        let state = self.session.snapshot().await;
        if state.stream_url.is_empty() {
            self.session
                .set_info_lines(vec!["No station information available".to_string()])
                .await;
            return;
        }
        let mut rows = vec![
            vec!["Name".to_string(), state.station_name.clone()],
            vec!["URL".to_string(), state.stream_url.clone()],
        ];
        if !state.track_title.is_empty() {
            rows.push(vec!["Track".to_string(), state.track_title.clone()]);
        }
        if let Some(path) = &state.recording_path {
            rows.push(vec!["Recording".to_string(), path.clone()]);
        }
        self.session
            .set_info_table(vec!["Field".to_string(), "Value".to_string()], rows)
            .await;
    }

    async fn show_help(&self) {
        self.session
            .set_info_lines(
                [
                    "p: Play/Pause current station",
                    "s: Current track info",
                    "i: Station information",
                    "r: Record the station (default filename)",
                    "n: Record with custom filename",
                    "f: Add station to favorite list",
                    "w: List favorites and switch",
                    "t: Choose color theme",
                    "v: Toggle level meter",
                    "h/?: Show this help message",
                    "q: Stop playback and quit",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            )
            .await;
    }

    async fn add_current_to_favorites(&mut self) {
        let state = self.session.snapshot().await;
        if state.station_name.is_empty() || state.stream_url.is_empty() {
            self.session
                .set_info_lines(vec!["Nothing playing to add".to_string()])
                .await;
            return;
        }
        if self.favorites.add(&state.station_name, &state.stream_url) {
            if let Err(e) = self.favorites.save() {
                warn!("favorites: save failed: {}", e);
            }
            self.session
                .set_info_lines(vec![format!("Added to favorites: {}", state.station_name)])
                .await;
        } else {
            // Name collision: ask once for an alternate name.
            let entry = TextEntry::new(TextPurpose::FavoriteName, "Enter a different name: ", "");
            let live = format!("{}{}", entry.prompt, entry.value());
            self.enter_modal(Mode::TextInput(entry)).await;
            self.session
                .set_info_lines(vec![live, TEXT_ENTRY_HINT.to_string()])
                .await;
        }
    }

    async fn enter_record_filename_prompt(&mut self) {
        if self.recorder.is_recording() {
            self.session
                .set_info_lines(vec!["Already recording — press r to stop".to_string()])
                .await;
            return;
        }
        let state = self.session.snapshot().await;
        if state.stream_url.is_empty() {
            self.session
                .set_info_lines(vec!["Nothing playing to record".to_string()])
                .await;
            return;
        }
        let default = recorder::default_filename(&state.station_name, chrono::Local::now());
        let prompt = format!("Filename [{}]: ", default);
        let entry = TextEntry::new(TextPurpose::RecordFilename, prompt, "");
        let live = format!("{}{}", entry.prompt, entry.value());
        self.enter_modal(Mode::TextInput(entry)).await;
        self.session
            .set_info_lines(vec![live, TEXT_ENTRY_HINT.to_string()])
            .await;
    }

    async fn enter_station_pick(&mut self) {
        let mut targets: Vec<(String, String)> = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();
        if let Some(last) = favorites::load_last_station(&self.last_station_path) {
            rows.push(vec![
                format!("{}", targets.len() + 1),
                format!("{} (last played)", last.name),
                last.uuid_or_url.clone(),
            ]);
            targets.push((last.name, last.uuid_or_url));
        }
        for entry in self.favorites.entries() {
            rows.push(vec![
                format!("{}", targets.len() + 1),
                entry.name.clone(),
                entry.uuid_or_url.clone(),
            ]);
            targets.push((entry.name.clone(), entry.uuid_or_url.clone()));
        }
        if targets.is_empty() {
            self.session
                .set_info_lines(vec![
                    "No stations to play. Add favorites with f first.".to_string()
                ])
                .await;
            return;
        }
        let max_index = targets.len();
        self.pick_targets = targets;
        let pick = QuickPick::new(
            PickPurpose::Station,
            max_index,
            self.config.ui.quick_pick_timeout(),
            Instant::now(),
        );
        self.enter_modal(Mode::QuickPick(pick)).await;
        self.session
            .set_info_table(
                vec![
                    "#".to_string(),
                    "Station".to_string(),
                    "URL / UUID".to_string(),
                ],
                rows,
            )
            .await;
    }

    async fn enter_theme_pick(&mut self) {
        let lines = theme::THEMES
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let marker = if t.name == self.theme.name { "●" } else { " " };
                format!("{} {}. {}", marker, i + 1, t.name)
            })
            .collect();
        let pick = QuickPick::new(
            PickPurpose::Theme,
            theme::THEMES.len(),
            self.config.ui.quick_pick_timeout(),
            Instant::now(),
        );
        self.enter_modal(Mode::QuickPick(pick)).await;
        self.session.set_info_lines(lines).await;
    }

    // ── Modal results ─────────────────────────────────────────────────────────

    async fn apply_pick(
        &mut self,
        purpose: PickPurpose,
        selection: Option<usize>,
    ) -> anyhow::Result<()> {
        let Some(index) = selection else {
            return Ok(());
        };
        match purpose {
            PickPurpose::Station => {
                let Some((name, target)) = self.pick_targets.get(index).cloned() else {
                    return Ok(());
                };
                if target.contains("://") {
                    self.switch_station(&name, &target).await;
                } else {
                    // A bare UUID needs the station directory, which is an
                    // external collaborator this session does not carry.
                    self.session
                        .set_info_lines(vec![format!(
                            "{}: not a direct stream URL, cannot switch",
                            name
                        )])
                        .await;
                }
            }
            PickPurpose::Theme => {
                if let Some(chosen) = theme::THEMES.get(index) {
                    self.theme = chosen;
                    self.config.ui.theme = chosen.name.to_string();
                    if let Err(e) = self.config.save() {
                        warn!("config: save failed: {}", e);
                    }
                    self.session
                        .set_info_lines(vec![format!("Theme: {}", chosen.name)])
                        .await;
                }
            }
        }
        Ok(())
    }

    async fn apply_text(&mut self, purpose: TextPurpose, value: String) -> anyhow::Result<()> {
        match purpose {
            TextPurpose::RecordFilename => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    self.toggle_recording(None, None).await?;
                } else if let Some(stem) = trimmed.strip_suffix(".mp3") {
                    self.toggle_recording(Some(stem.to_string()), Some("mp3"))
                        .await?;
                } else {
                    self.toggle_recording(Some(trimmed.to_string()), None).await?;
                }
            }
            TextPurpose::FavoriteName => {
                let state = self.session.snapshot().await;
                let name = value.trim();
                if name.is_empty() {
                    self.session
                        .set_info_lines(vec!["Empty name, not added".to_string()])
                        .await;
                } else if self.favorites.add(name, &state.stream_url) {
                    if let Err(e) = self.favorites.save() {
                        warn!("favorites: save failed: {}", e);
                    }
                    self.session
                        .set_info_lines(vec![format!("Added to favorites: {}", name)])
                        .await;
                } else {
                    self.session
                        .set_info_lines(vec![format!("Already in favorites: {}", name)])
                        .await;
                }
            }
        }
        Ok(())
    }

    // ── Playback / recording ──────────────────────────────────────────────────

    /// Sequenced station switch: stop old playback, then swap identity and
    /// clear the stale title in one state write, then start new playback.
    async fn switch_station(&mut self, name: &str, url: &str) {
        self.player.stop().await;
        self.session.set_station(name, url).await;
        self.session.set_paused(false).await;
        match self.player.play(url).await {
            Ok(()) => {
                let last = LastStation {
                    name: name.to_string(),
                    uuid_or_url: url.to_string(),
                };
                if let Err(e) = favorites::save_last_station(&self.last_station_path, &last) {
                    debug!("last station: save failed: {}", e);
                }
                self.session
                    .set_info_lines(vec![format!("Playing: {}", name)])
                    .await;
            }
            Err(e) => {
                warn!("player: {}", e);
                self.session
                    .set_info_lines(vec![format!("Playback failed: {}", e)])
                    .await;
            }
        }
    }

    /// Toggle the recorder. A second toggle while recording always stops,
    /// never starts a second process. Directory failure of both the
    /// configured and fallback paths is the one fatal case.
    async fn toggle_recording(
        &mut self,
        file_stem: Option<String>,
        codec_override: Option<&str>,
    ) -> anyhow::Result<()> {
        if self.recorder.is_recording() {
            self.recorder.stop().await;
            let path = self.recorder.output_path().display().to_string();
            self.session.set_recording_path(None).await;
            self.session
                .set_info_lines(vec![format!("Recording stopped: {}", path)])
                .await;
            return Ok(());
        }

        let state = self.session.snapshot().await;
        if state.stream_url.is_empty() {
            self.session
                .set_info_lines(vec!["Nothing playing to record".to_string()])
                .await;
            return Ok(());
        }

        let mut recording_config = self.config.recording.clone();
        if let Some(codec) = codec_override {
            recording_config.codec = codec.to_string();
        }
        match self
            .recorder
            .start(
                &state.stream_url,
                &state.station_name,
                file_stem,
                &recording_config,
                self.config.metadata.probe_timeout(),
            )
            .await
        {
            Ok((path, progress)) => {
                tokio::spawn(recorder::watch_progress(progress, self.tx.clone()));
                self.session
                    .set_recording_path(Some(path.display().to_string()))
                    .await;
                self.session
                    .set_info_lines(vec![format!("Recording… to: {}", path.display())])
                    .await;
            }
            Err(e @ RecorderError::Directory(..)) => {
                self.session
                    .set_info_lines(vec![format!("Fatal: {}", e)])
                    .await;
                return Err(anyhow::Error::new(e).context("no usable recording directory"));
            }
            Err(e) => {
                warn!("recorder: {}", e);
                self.session
                    .set_info_lines(vec![format!("Could not start recording: {}", e)])
                    .await;
            }
        }
        Ok(())
    }
}

/// Blocking raw-key reader. Reads at most one key per slice and yields
/// ~50 ms when none is available; exits once the app side hangs up.
fn spawn_input_reader(tx: mpsc::Sender<AppMessage>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || loop {
        match event::poll(Duration::from_millis(50)) {
            Ok(true) => {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press
                        && tx.blocking_send(AppMessage::Key(key)).is_err()
                    {
                        break;
                    }
                }
            }
            Ok(false) => {
                if tx.is_closed() {
                    break;
                }
            }
            Err(e) => {
                warn!("input: read error: {}", e);
                break;
            }
        }
    })
}
