//! Router module - the translation and synchronization engine
//!
//! Connects the MIDI adapter, the fader store, and the OSC transport: decides
//! when a hardware event becomes a console message, when console feedback
//! becomes a fader update, and dispatches every UI command. All events enter
//! through one loop and each handler runs to completion before the next is
//! dispatched, so the read-modify-write on a fader's value/last_midi pair is
//! atomic with respect to every other source.

pub mod commands;
mod midi_input;
mod osc_feedback;
pub mod takeover;


use crate::config::SharedConfig;
use crate::events::{EventBus, LogCategory, UiEvent};
use crate::midi::MidiAdapter;
use crate::osc::OscTransport;
use crate::state::ProfileStore;
use std::sync::Arc;

pub use commands::UiCommand;

/// Policy layer connecting MIDI adapter ↔ fader store ↔ OSC transport.
pub struct Router {
    pub(crate) store: Arc<ProfileStore>,
    pub(crate) config: SharedConfig,
    pub(crate) adapter: MidiAdapter,
    pub(crate) transport: OscTransport,
    pub(crate) events: EventBus,
}

impl Router {
    pub fn new(
        store: Arc<ProfileStore>,
        config: SharedConfig,
        adapter: MidiAdapter,
        transport: OscTransport,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            config,
            adapter,
            transport,
            events,
        }
    }

    pub(crate) fn output_enabled(&self) -> bool {
        self.config.lock().tcp.output
    }

    pub(crate) fn input_enabled(&self) -> bool {
        self.config.lock().tcp.input
    }

    /// Initial reconciliation of both connections with the configured flags.
    pub async fn startup(&mut self) {
        self.reconcile_osc().await;
        self.adapter.reconcile();
    }

    /// Close both connections (process shutdown).
    pub async fn shutdown(&mut self) {
        self.adapter.close();
        self.transport.close().await;
    }

    /// Align the transport with the TCP enable flags: open while either
    /// direction is enabled, closed otherwise. An open failure takes the
    /// transport-error fallback.
    pub async fn reconcile_osc(&mut self) {
        let tcp = self.config.lock().tcp.clone();
        if tcp.wants_open() && !self.transport.is_open() {
            let announce = tcp.output.then(|| self.store.faders().len());
            if let Err(e) = self
                .transport
                .open(&tcp.local_address, tcp.local_port, announce)
                .await
            {
                self.on_transport_error(e.to_string()).await;
            }
        } else if !tcp.wants_open() && self.transport.is_open() {
            self.transport.close().await;
        }
    }

    /// Apply a console endpoint change: reconnect only when currently open.
    async fn reopen_osc(&mut self) {
        if self.transport.is_open() {
            self.transport.close().await;
            self.reconcile_osc().await;
        }
    }

    /// Broadcast both connectivity booleans.
    fn emit_connections(&self) {
        self.events
            .emit(UiEvent::MidiConnection(self.adapter.is_open()));
        self.events
            .emit(UiEvent::OscConnection(self.transport.is_open()));
    }

    fn emit_config(&self) {
        self.events.emit(UiEvent::Config(self.config.lock().clone()));
    }

    /// Dispatch one UI command. Failed store operations have already been
    /// logged and are no-ops here.
    pub async fn handle_command(&mut self, cmd: UiCommand) {
        match cmd {
            UiCommand::ProfileCreate {
                name,
                groups,
                faders,
            } => {
                self.store.create_profile(name, groups, faders);
            }
            UiCommand::ProfileRename { name } => {
                let _ = self.store.rename_profile(name);
            }
            UiCommand::ProfileDelete => self.store.delete_profile(),
            UiCommand::ProfileSelect { id } => {
                self.events
                    .log(LogCategory::Log, format!("Selecting fader profile: {id}"));
                self.store.select_profile(id);
            }
            UiCommand::ProfilesGet => {
                self.events.emit(UiEvent::Profiles(self.store.profiles()));
            }

            UiCommand::GroupCreate { name } => {
                let _ = self.store.create_fader_group(name);
            }
            UiCommand::GroupRename { id, name } => {
                let _ = self.store.update_groups(move |groups| {
                    groups
                        .into_iter()
                        .map(|mut g| {
                            if g.id == id {
                                g.name = name.clone();
                            }
                            g
                        })
                        .collect()
                });
            }
            UiCommand::GroupDelete { id } => {
                self.events
                    .log(LogCategory::Log, format!("Deleting fader group: {id}"));
                let _ = self.store.delete_group(&id);
            }
            UiCommand::GroupsReplace { groups } => {
                let _ = self.store.update_groups(move |_| groups);
            }

            UiCommand::FaderCreate { group_id } => self.create_fader(group_id),
            UiCommand::FaderUpdateConfig { id, config } => {
                let _ = self.store.update_faders(move |faders| {
                    faders
                        .into_iter()
                        .map(|mut f| {
                            if f.id == id {
                                f.config = config;
                            }
                            f
                        })
                        .collect()
                });
            }
            UiCommand::FaderUpdateValue { id, value } => {
                let _ = self.store.update_faders(move |faders| {
                    faders
                        .into_iter()
                        .map(|mut f| {
                            if f.id == id {
                                f.value = value;
                            }
                            f
                        })
                        .collect()
                });
            }
            UiCommand::FaderDelete { id } => {
                let _ = self
                    .store
                    .update_faders(move |faders| faders.into_iter().filter(|f| f.id != id).collect());
            }
            UiCommand::FadersReplace { faders } => {
                let _ = self.store.update_faders(move |_| faders);
            }

            UiCommand::MidiListDevices => match MidiAdapter::list_devices() {
                Ok(devices) => self.events.emit(UiEvent::MidiDevices(devices)),
                Err(e) => self
                    .events
                    .log(LogCategory::Error, format!("Failed to list MIDI devices: {e}")),
            },
            UiCommand::MidiSelectDevice { device } => {
                self.events
                    .log(LogCategory::Midi, format!("Setting MIDI device: {device}"));
                let _ = self.adapter.change_device(&device);
                self.emit_config();
            }
            UiCommand::MidiToggleInput => {
                {
                    let mut config = self.config.lock();
                    config.midi.input = !config.midi.input;
                }
                self.adapter.reconcile();
                self.emit_config();
            }
            UiCommand::MidiSetChannel { channel } => {
                self.config.lock().midi.channel = channel;
                self.emit_config();
            }

            UiCommand::TcpSetAddress { address } => {
                self.config.lock().tcp.local_address = address;
                self.reopen_osc().await;
                self.emit_config();
            }
            UiCommand::TcpSetPort { port } => {
                self.config.lock().tcp.local_port = port;
                self.reopen_osc().await;
                self.emit_config();
            }
            UiCommand::OscToggleInput => {
                {
                    let mut config = self.config.lock();
                    config.tcp.input = !config.tcp.input;
                }
                self.reconcile_osc().await;
                self.emit_config();
            }
            UiCommand::OscToggleOutput => {
                {
                    let mut config = self.config.lock();
                    config.tcp.output = !config.tcp.output;
                }
                self.reconcile_osc().await;
                self.emit_config();
            }

            UiCommand::SetDefaultFaderMode { mode } => {
                self.config.lock().app.default_fader_mode = mode;
                self.emit_config();
            }
            UiCommand::SetTheme { theme } => {
                self.config.lock().app.theme = Some(theme);
                self.emit_config();
            }
            UiCommand::ToggleAutostart => {
                {
                    let mut config = self.config.lock();
                    config.app.autostart = Some(!config.app.autostart.unwrap_or(false));
                }
                self.emit_config();
            }
            UiCommand::ToggleAutostartUi => {
                {
                    let mut config = self.config.lock();
                    config.app.autostart_ui = Some(!config.app.autostart_ui.unwrap_or(false));
                }
                self.emit_config();
            }

            UiCommand::StateSync => {
                self.store.emit_all();
                self.emit_connections();
            }
        }
    }

    /// Append a fader into the given group, the first group, or a freshly
    /// created default group; controller numbers continue from the current
    /// fader count.
    fn create_fader(&self, group_id: Option<crate::state::types::Id>) {
        let group_id = match group_id.or_else(|| self.store.groups().first().map(|g| g.id.clone()))
        {
            Some(id) => id,
            None => match self.store.create_fader_group(None) {
                Ok(group) => group.id,
                Err(_) => return,
            },
        };
        let next = self.store.faders().len() + 1;
        let mode = self.config.lock().app.default_fader_mode;
        let _ = self
            .store
            .create_fader(group_id, mode, next as u8, next as u32);
    }
}
