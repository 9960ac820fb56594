//! ProfileStore - canonical in-memory fader state
//!
//! Owns every fader profile and the active-profile pointer inside the shared
//! config. All reads and mutations go through the operations here; the locks
//! are held for the duration of each logical operation so no two updates can
//! interleave partially. Every accepted mutation broadcasts the full current
//! value of the field that changed.

use super::types::{Fader, FaderGroup, FaderMode, FaderProfile, Id};
use crate::config::SharedConfig;
use crate::error::{Error, Result};
use crate::events::{EventBus, LogCategory, UiEvent};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Holds all fader profiles and provides atomic read/update operations.
pub struct ProfileStore {
    profiles: Mutex<BTreeMap<Id, FaderProfile>>,
    config: SharedConfig,
    events: EventBus,
}

impl ProfileStore {
    pub fn new(config: SharedConfig, events: EventBus) -> Self {
        Self {
            profiles: Mutex::new(BTreeMap::new()),
            config,
            events,
        }
    }

    /// Hydrate validated profiles loaded from storage. No broadcast: clients
    /// request state when they attach.
    pub fn load(&self, profiles: Vec<FaderProfile>) {
        let mut map = self.profiles.lock();
        for profile in profiles {
            map.insert(profile.id.clone(), profile);
        }
    }

    /// All profiles, in id (creation) order.
    pub fn profiles(&self) -> Vec<FaderProfile> {
        self.profiles.lock().values().cloned().collect()
    }

    /// Id of the active profile, if one is selected.
    pub fn active_id(&self) -> Option<Id> {
        self.config.lock().app.fader_profile_id.clone()
    }

    /// Resolve the active profile. Empty (not an error) when the pointer is
    /// unset or references an unknown id.
    pub fn active_profile(&self) -> Option<FaderProfile> {
        let id = self.active_id()?;
        self.profiles.lock().get(&id).cloned()
    }

    /// Fader list of the active profile; empty when none is active.
    pub fn faders(&self) -> Vec<Fader> {
        self.active_profile().map(|p| p.faders).unwrap_or_default()
    }

    /// Group list of the active profile; empty when none is active.
    pub fn groups(&self) -> Vec<FaderGroup> {
        self.active_profile()
            .map(|p| p.fader_groups)
            .unwrap_or_default()
    }

    /// First fader bound to the given MIDI controller/note number.
    pub fn find_fader_by_midi_controller(&self, controller: u8) -> Option<Fader> {
        self.faders()
            .into_iter()
            .find(|f| f.config.midi_controller == controller)
    }

    /// Create a profile with `group_count` groups named "Group N" and
    /// `fader_count` faders assigned round-robin across the groups (fader i
    /// goes to group i % group_count). When no groups were requested but
    /// faders were, one default group is created to satisfy the
    /// every-fader-has-a-group invariant. Controller numbers ascend from 1 on
    /// both the MIDI and console sides. The new profile becomes active.
    pub fn create_profile(
        &self,
        name: Option<String>,
        group_count: usize,
        fader_count: usize,
    ) -> FaderProfile {
        let (profile, config_snapshot) = {
            let mut map = self.profiles.lock();
            let mut config = self.config.lock();

            let mut groups: Vec<FaderGroup> = (0..group_count)
                .map(|i| FaderGroup::new(format!("Group {}", i + 1)))
                .collect();

            let mut faders = Vec::with_capacity(fader_count);
            for i in 0..fader_count {
                if groups.is_empty() {
                    groups.push(FaderGroup::new("New Group"));
                }
                let group_id = groups[i % groups.len()].id.clone();
                faders.push(Fader::new(
                    group_id,
                    config.app.default_fader_mode,
                    (i + 1) as u8,
                    (i + 1) as u32,
                ));
            }

            let profile = FaderProfile {
                id: Id::generate(),
                name: name.unwrap_or_else(|| "New Profile".to_string()),
                fader_groups: groups,
                faders,
            };
            map.insert(profile.id.clone(), profile.clone());
            config.app.fader_profile_id = Some(profile.id.clone());
            (profile, config.clone())
        };

        self.events.log(
            LogCategory::Log,
            format!("Created fader profile: {}", profile.id),
        );
        self.events.emit(UiEvent::Profiles(self.profiles()));
        self.events.emit(UiEvent::Config(config_snapshot));
        self.events.emit(UiEvent::Faders(profile.faders.clone()));
        self.events
            .emit(UiEvent::FaderGroups(profile.fader_groups.clone()));
        profile
    }

    /// Make the given profile id active. The id is not required to resolve;
    /// an unknown id simply yields an empty active profile.
    pub fn select_profile(&self, id: Id) {
        let config_snapshot = {
            let mut config = self.config.lock();
            config.app.fader_profile_id = Some(id);
            config.clone()
        };
        self.events.emit(UiEvent::Faders(self.faders()));
        self.events.emit(UiEvent::FaderGroups(self.groups()));
        self.events.emit(UiEvent::Config(config_snapshot));
    }

    /// Rename the active profile.
    pub fn rename_profile(&self, name: String) -> Result<()> {
        self.update_profile(|mut p| {
            p.name = name;
            p
        })
    }

    /// Remove the active profile from the store and clear the active pointer.
    /// The UI must then re-select or recreate a profile.
    pub fn delete_profile(&self) {
        let config_snapshot = {
            let mut map = self.profiles.lock();
            let mut config = self.config.lock();
            if let Some(id) = config.app.fader_profile_id.take() {
                map.remove(&id);
                self.events
                    .log(LogCategory::Log, format!("Deleted fader profile: {id}"));
            }
            config.clone()
        };
        self.events.emit(UiEvent::Faders(Vec::new()));
        self.events.emit(UiEvent::FaderGroups(Vec::new()));
        self.events.emit(UiEvent::Profiles(self.profiles()));
        self.events.emit(UiEvent::Config(config_snapshot));
    }

    /// Apply a pure transformation to the active profile and store the result
    /// as one step. Fails with NotFound (logged, no-op) when no profile is
    /// active.
    pub fn update_profile(&self, mutator: impl FnOnce(FaderProfile) -> FaderProfile) -> Result<()> {
        let result = self.with_active(|profile| {
            *profile = mutator(profile.clone());
        });
        if result.is_ok() {
            self.events.emit(UiEvent::Profiles(self.profiles()));
        }
        result
    }

    /// Apply a pure transformation to the active profile's group list.
    pub fn update_groups(
        &self,
        mutator: impl FnOnce(Vec<FaderGroup>) -> Vec<FaderGroup>,
    ) -> Result<()> {
        let groups = self.with_active(|profile| {
            profile.fader_groups = mutator(std::mem::take(&mut profile.fader_groups));
            profile.fader_groups.clone()
        })?;
        self.events.emit(UiEvent::FaderGroups(groups));
        Ok(())
    }

    /// Apply a pure transformation to the active profile's fader list.
    pub fn update_faders(&self, mutator: impl FnOnce(Vec<Fader>) -> Vec<Fader>) -> Result<()> {
        let faders = self.with_active(|profile| {
            profile.faders = mutator(std::mem::take(&mut profile.faders));
            profile.faders.clone()
        })?;
        self.events.emit(UiEvent::Faders(faders));
        Ok(())
    }

    /// Append a group to the active profile.
    pub fn create_fader_group(&self, name: Option<String>) -> Result<FaderGroup> {
        let group = FaderGroup::new(name.unwrap_or_else(|| "New Group".to_string()));
        let created = group.clone();
        self.update_groups(move |mut groups| {
            groups.push(group);
            groups
        })?;
        Ok(created)
    }

    /// Append a fader to the active profile.
    pub fn create_fader(
        &self,
        group_id: Id,
        mode: FaderMode,
        midi_controller: u8,
        eos_controller: u32,
    ) -> Result<Fader> {
        let fader = Fader::new(group_id, mode, midi_controller, eos_controller);
        let created = fader.clone();
        self.update_faders(move |mut faders| {
            faders.push(fader);
            faders
        })?;
        Ok(created)
    }

    /// Delete a group and every fader referencing it, preserving the
    /// invariant that a fader always has a group.
    pub fn delete_group(&self, id: &Id) -> Result<()> {
        let (groups, faders) = self.with_active(|profile| {
            profile.fader_groups.retain(|g| g.id != *id);
            profile.faders.retain(|f| f.group_id != *id);
            (profile.fader_groups.clone(), profile.faders.clone())
        })?;
        self.events.emit(UiEvent::FaderGroups(groups));
        self.events.emit(UiEvent::Faders(faders));
        Ok(())
    }

    /// Broadcast every full-state value plus the profile list. Used when a
    /// client requests a state sync.
    pub fn emit_all(&self) {
        self.events.emit(UiEvent::FaderGroups(self.groups()));
        self.events.emit(UiEvent::Faders(self.faders()));
        self.events.emit(UiEvent::Profiles(self.profiles()));
        self.events.emit(UiEvent::Config(self.config.lock().clone()));
    }

    /// Lock the store and run `f` against the active profile. The profile and
    /// config locks are held for the whole closure, making the
    /// lookup+mutate sequence atomic from the caller's perspective.
    fn with_active<R>(&self, f: impl FnOnce(&mut FaderProfile) -> R) -> Result<R> {
        let outcome = {
            let mut map = self.profiles.lock();
            let config = self.config.lock();
            match config.app.fader_profile_id.clone() {
                None => Err(Error::NotFound("active fader profile".to_string())),
                Some(id) => match map.get_mut(&id) {
                    Some(profile) => Ok(f(profile)),
                    None => Err(Error::NotFound(format!("fader profile {id}"))),
                },
            }
        };
        if let Err(e) = &outcome {
            self.events.log(LogCategory::Error, e.to_string());
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::sync::Arc;

    fn make_store() -> ProfileStore {
        let config = Arc::new(parking_lot::Mutex::new(AppConfig::default()));
        ProfileStore::new(config, EventBus::new())
    }

    #[test]
    fn test_create_profile_shape() {
        let store = make_store();
        let profile = store.create_profile(Some("Test".to_string()), 2, 5);

        assert_eq!(profile.fader_groups.len(), 2);
        assert_eq!(profile.fader_groups[0].name, "Group 1");
        assert_eq!(profile.fader_groups[1].name, "Group 2");
        assert_eq!(profile.faders.len(), 5);

        // Faders cycle across the groups: 0,1,0,1,0
        for (i, fader) in profile.faders.iter().enumerate() {
            let expected_group = &profile.fader_groups[i % 2].id;
            assert_eq!(&fader.group_id, expected_group);
            assert_eq!(fader.config.midi_controller, (i + 1) as u8);
            assert_eq!(fader.config.eos_controller, (i + 1) as u32);
            assert_eq!(fader.config.mode, FaderMode::Submaster);
            assert_eq!(fader.value, 0.0);
            assert!(fader.last_midi.is_none());
        }

        // The new profile is active
        assert_eq!(store.active_id(), Some(profile.id.clone()));
        assert_eq!(store.active_profile().unwrap(), profile);
    }

    #[test]
    fn test_create_profile_without_groups_adds_default() {
        let store = make_store();
        let profile = store.create_profile(None, 0, 3);

        assert_eq!(profile.fader_groups.len(), 1);
        assert_eq!(profile.fader_groups[0].name, "New Group");
        assert!(profile
            .faders
            .iter()
            .all(|f| f.group_id == profile.fader_groups[0].id));
    }

    #[test]
    fn test_update_without_active_profile_is_noop() {
        let store = make_store();
        let result = store.update_faders(|mut faders| {
            faders.clear();
            faders
        });
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(store.faders().is_empty());
    }

    #[test]
    fn test_delete_profile_clears_active_pointer() {
        let store = make_store();
        store.create_profile(None, 1, 1);
        assert!(store.active_profile().is_some());

        store.delete_profile();
        assert!(store.active_id().is_none());
        assert!(store.active_profile().is_none());
        assert!(store.profiles().is_empty());
    }

    #[test]
    fn test_delete_group_cascades_to_faders() {
        let store = make_store();
        let profile = store.create_profile(None, 2, 4);
        let doomed = profile.fader_groups[0].id.clone();

        store.delete_group(&doomed).unwrap();

        let groups = store.groups();
        assert_eq!(groups.len(), 1);
        assert!(groups.iter().all(|g| g.id != doomed));

        // Faders 0 and 2 were in the first group
        let faders = store.faders();
        assert_eq!(faders.len(), 2);
        assert!(faders.iter().all(|f| f.group_id != doomed));
    }

    #[test]
    fn test_find_fader_by_midi_controller() {
        let store = make_store();
        store.create_profile(None, 1, 3);

        let fader = store.find_fader_by_midi_controller(2).unwrap();
        assert_eq!(fader.config.midi_controller, 2);
        assert!(store.find_fader_by_midi_controller(99).is_none());
    }

    #[test]
    fn test_select_unknown_profile_yields_empty_active() {
        let store = make_store();
        store.create_profile(None, 1, 1);
        store.select_profile(Id::from("nope"));
        assert!(store.active_profile().is_none());
        assert!(store.faders().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_broadcast_full_lists() {
        let config = Arc::new(parking_lot::Mutex::new(AppConfig::default()));
        let bus = EventBus::new();
        let store = ProfileStore::new(config, bus.clone());
        store.create_profile(None, 1, 1);

        let mut rx = bus.subscribe();
        store
            .update_faders(|mut faders| {
                faders[0].value = 64.0;
                faders
            })
            .unwrap();

        match rx.recv().await.unwrap() {
            UiEvent::Faders(faders) => assert_eq!(faders[0].value, 64.0),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
