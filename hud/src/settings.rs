//! Process-wide tunables (§6): the distance-engine penalties plus the two
//! settings the matching engine itself doesn't know about.
//!
//! The reference implementation reads these from a desktop settings service
//! (a GSettings schema). Nothing in the corpus binds to that protocol, so
//! reading is behind [`SettingsSource`] — the same capability-boundary
//! pattern used for [`hud_sources::ActiveWindowWatcher`]. The only
//! implementation, [`EnvSettingsSource`], reads environment overrides once
//! and otherwise returns the compiled-in defaults below, satisfying "a
//! settings read failure falls back to defaults" unconditionally.

use std::env;

use hud_common::Property;
use hud_distance::Penalties;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub penalties: Penalties,
    /// Percentage added to every distance an indicator source produces.
    pub indicator_penalty: u32,
    /// Whether the usage log is persisted to disk.
    pub store_usage_data: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            penalties: Penalties::default(),
            indicator_penalty: 50,
            store_usage_data: true,
        }
    }
}

pub trait SettingsSource: Send + Sync {
    fn read(&self) -> Settings;
}

/// Reads `HUD_SETTING_<KEY>` overrides (e.g. `HUD_SETTING_MAX_DISTANCE`);
/// anything unset or unparsable keeps the compiled-in default for that key.
pub struct EnvSettingsSource;

impl SettingsSource for EnvSettingsSource {
    fn read(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            penalties: Penalties {
                max_distance: env_u32("HUD_SETTING_MAX_DISTANCE", defaults.penalties.max_distance),
                add_penalty: env_u32("HUD_SETTING_ADD_PENALTY", defaults.penalties.add_penalty),
                drop_penalty: env_u32("HUD_SETTING_DROP_PENALTY", defaults.penalties.drop_penalty),
                end_drop_penalty: env_u32(
                    "HUD_SETTING_DROP_PENALTY_END",
                    defaults.penalties.end_drop_penalty,
                ),
                swap_penalty: env_u32("HUD_SETTING_SWAP_PENALTY", defaults.penalties.swap_penalty),
                swap_penalty_case: env_u32(
                    "HUD_SETTING_SWAP_PENALTY_CASE",
                    defaults.penalties.swap_penalty_case,
                ),
                transpose_penalty: env_u32(
                    "HUD_SETTING_TRANSPOSE_PENALTY",
                    defaults.penalties.transpose_penalty,
                ),
            },
            indicator_penalty: env_u32("HUD_SETTING_INDICATOR_PENALTY", defaults.indicator_penalty),
            store_usage_data: env::var("HUD_SETTING_STORE_USAGE_DATA")
                .map(|v| v != "0" && v.to_lowercase() != "false")
                .unwrap_or(defaults.store_usage_data),
        }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// A read-mostly [`Settings`] snapshot, refreshed on demand.
pub struct SettingsStore {
    property: Property<Settings>,
    source: Box<dyn SettingsSource>,
}

impl SettingsStore {
    pub fn new(source: Box<dyn SettingsSource>) -> Self {
        let initial = source.read();
        Self {
            property: Property::new(initial),
            source,
        }
    }

    pub fn get(&self) -> Settings {
        self.property.get()
    }

    pub fn watch(&self) -> impl futures::Stream<Item = Settings> + Send + 'static {
        self.property.watch()
    }

    /// Re-reads the source and publishes the new snapshot, as if the
    /// underlying settings service had signalled a change.
    pub fn refresh(&self) {
        self.property.set(self.source.read());
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;

    struct SwappableSource(std::sync::Arc<std::sync::Mutex<Settings>>);
    impl SettingsSource for SwappableSource {
        fn read(&self) -> Settings {
            *self.0.lock().unwrap()
        }
    }

    #[test]
    fn refresh_publishes_the_latest_read() {
        let current = std::sync::Arc::new(std::sync::Mutex::new(Settings::default()));
        let store = SettingsStore::new(Box::new(SwappableSource(current.clone())));
        assert_eq!(store.get().indicator_penalty, 50);

        let mut updated = Settings::default();
        updated.indicator_penalty = 75;
        *current.lock().unwrap() = updated;

        store.refresh();
        assert_eq!(store.get().indicator_penalty, 75);
    }

    #[test]
    fn env_override_replaces_a_single_default() {
        unsafe {
            env::set_var("HUD_SETTING_INDICATOR_PENALTY", "75");
        }
        let settings = EnvSettingsSource.read();
        unsafe {
            env::remove_var("HUD_SETTING_INDICATOR_PENALTY");
        }
        assert_eq!(settings.indicator_penalty, 75);
        assert_eq!(settings.penalties.max_distance, 30);
    }
}
