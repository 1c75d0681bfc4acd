//! Display detection and the software rendering fallback.
//!
//! Headless CLI runs still bring up the rendering backend. Without a display
//! server, hardware-accelerated initialization fails, so the bootstrap asks
//! the graphics stack for its CPU renderer instead. Values the user already
//! set are never overwritten, and an explicit font configuration from the
//! user turns the whole fallback off.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};

/// Directive consumed by Mesa/GL to use the CPU renderer
pub const SOFTWARE_RENDERING_VAR: &str = "LIBGL_ALWAYS_SOFTWARE";

/// X11 display
pub const DISPLAY_VAR: &str = "DISPLAY";

/// Wayland compositor socket
pub const WAYLAND_DISPLAY_VAR: &str = "WAYLAND_DISPLAY";

/// Explicit fontconfig file chosen by the user
pub const FONTCONFIG_FILE_VAR: &str = "FONTCONFIG_FILE";

/// Read/write access to environment variables
pub trait EnvSource {
    fn var_os(&self, key: &str) -> Option<OsString>;

    fn set_var(&mut self, key: &str, value: &OsStr);

    fn is_set(&self, key: &str) -> bool {
        self.var_os(key).is_some()
    }

    /// Set `key` only when it is absent. Returns whether the value was written.
    fn set_default(&mut self, key: &str, value: &str) -> bool {
        if self.is_set(key) {
            return false;
        }
        self.set_var(key, OsStr::new(value));
        true
    }
}

/// The real process environment.
///
/// Only used on the main thread before the runtime or any worker thread starts.
#[derive(Debug, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var_os(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }

    fn set_var(&mut self, key: &str, value: &OsStr) {
        std::env::set_var(key, value);
    }
}

impl EnvSource for HashMap<String, OsString> {
    fn var_os(&self, key: &str) -> Option<OsString> {
        self.get(key).cloned()
    }

    fn set_var(&mut self, key: &str, value: &OsStr) {
        self.insert(key.to_string(), value.to_os_string());
    }
}

/// Where display presence is looked up and which directive forces CPU rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderingPolicy {
    /// Variables whose presence means a display is reachable. Empty means
    /// the platform always has one.
    pub display_indicators: Vec<&'static str>,
    pub software_var: &'static str,
    pub software_value: &'static str,
    /// When set, the user configured fonts and console by hand and the
    /// environment is left exactly as it is
    pub explicit_config_var: Option<&'static str>,
}

impl RenderingPolicy {
    /// Policy for the platform this binary was built for
    pub fn native() -> Self {
        let display_indicators = if cfg!(any(target_os = "windows", target_os = "macos")) {
            Vec::new()
        } else {
            vec![DISPLAY_VAR, WAYLAND_DISPLAY_VAR]
        };
        Self {
            display_indicators,
            software_var: SOFTWARE_RENDERING_VAR,
            software_value: "1",
            explicit_config_var: Some(FONTCONFIG_FILE_VAR),
        }
    }
}

/// Snapshot of the display indicators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderingEnvironmentProbe {
    pub present: Vec<&'static str>,
    /// The platform does not rely on environment indicators
    pub implicit_display: bool,
}

impl RenderingEnvironmentProbe {
    pub fn probe(env: &impl EnvSource, policy: &RenderingPolicy) -> Self {
        let present = policy.display_indicators.iter().copied().filter(|key| env.is_set(key)).collect();
        Self {
            present,
            implicit_display: policy.display_indicators.is_empty(),
        }
    }

    pub fn has_display(&self) -> bool {
        self.implicit_display || !self.present.is_empty()
    }
}

/// What happened to the software rendering directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingDecision {
    /// A display is present, hardware rendering is left alone
    Hardware,
    /// No display; the directive was set by the bootstrap
    SoftwareForced,
    /// The user had already set the directive; it was kept as is
    UserOverride,
    /// An explicit font/console configuration is present; nothing was touched
    ExplicitConfiguration,
}

/// Force software rendering when no display is reachable, respecting user values.
pub fn select_rendering(env: &mut impl EnvSource, policy: &RenderingPolicy, probe: &RenderingEnvironmentProbe) -> RenderingDecision {
    if policy.explicit_config_var.is_some_and(|key| env.is_set(key)) {
        return RenderingDecision::ExplicitConfiguration;
    }
    if env.is_set(policy.software_var) {
        return RenderingDecision::UserOverride;
    }
    if probe.has_display() {
        return RenderingDecision::Hardware;
    }
    if env.set_default(policy.software_var, policy.software_value) {
        RenderingDecision::SoftwareForced
    } else {
        RenderingDecision::UserOverride
    }
}

#[cfg(test)]
pub(crate) fn linux_policy() -> RenderingPolicy {
    RenderingPolicy {
        display_indicators: vec![DISPLAY_VAR, WAYLAND_DISPLAY_VAR],
        software_var: SOFTWARE_RENDERING_VAR,
        software_value: "1",
        explicit_config_var: Some(FONTCONFIG_FILE_VAR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, OsString> {
        pairs.iter().map(|(k, v)| (k.to_string(), OsString::from(v))).collect()
    }

    #[test]
    fn test_no_display_forces_software() {
        let policy = linux_policy();
        let mut env = env(&[("HOME", "/home/user")]);
        let probe = RenderingEnvironmentProbe::probe(&env, &policy);

        assert!(!probe.has_display());
        assert_eq!(select_rendering(&mut env, &policy, &probe), RenderingDecision::SoftwareForced);
        assert_eq!(env.var_os(SOFTWARE_RENDERING_VAR), Some(OsString::from("1")));
    }

    #[test]
    fn test_either_indicator_keeps_hardware() {
        let policy = linux_policy();
        for indicator in [DISPLAY_VAR, WAYLAND_DISPLAY_VAR] {
            let mut env = env(&[(indicator, ":0")]);
            let probe = RenderingEnvironmentProbe::probe(&env, &policy);

            assert_eq!(probe.present, vec![indicator]);
            assert_eq!(select_rendering(&mut env, &policy, &probe), RenderingDecision::Hardware);
            assert!(!env.is_set(SOFTWARE_RENDERING_VAR));
        }
    }

    #[test]
    fn test_indicator_value_is_ignored() {
        let policy = linux_policy();
        let env = env(&[(DISPLAY_VAR, "")]);
        assert!(RenderingEnvironmentProbe::probe(&env, &policy).has_display());
    }

    #[test]
    fn test_user_directive_is_kept() {
        let policy = linux_policy();
        let mut env = env(&[(SOFTWARE_RENDERING_VAR, "0")]);
        let probe = RenderingEnvironmentProbe::probe(&env, &policy);

        assert_eq!(select_rendering(&mut env, &policy, &probe), RenderingDecision::UserOverride);
        assert_eq!(env.var_os(SOFTWARE_RENDERING_VAR), Some(OsString::from("0")));
    }

    #[test]
    fn test_explicit_configuration_skips_all_mutation() {
        let policy = linux_policy();
        let mut env = env(&[(FONTCONFIG_FILE_VAR, "/etc/fonts/custom.conf")]);
        let before = env.clone();
        let probe = RenderingEnvironmentProbe::probe(&env, &policy);

        assert!(!probe.has_display());
        assert_eq!(select_rendering(&mut env, &policy, &probe), RenderingDecision::ExplicitConfiguration);
        assert_eq!(env, before);
    }

    #[test]
    fn test_explicit_configuration_wins_over_user_directive() {
        let policy = linux_policy();
        let mut env = env(&[(FONTCONFIG_FILE_VAR, ""), (SOFTWARE_RENDERING_VAR, "0")]);
        let probe = RenderingEnvironmentProbe::probe(&env, &policy);

        assert_eq!(select_rendering(&mut env, &policy, &probe), RenderingDecision::ExplicitConfiguration);
        assert_eq!(env.var_os(SOFTWARE_RENDERING_VAR), Some(OsString::from("0")));
    }

    #[test]
    fn test_implicit_display_platform() {
        let policy = RenderingPolicy {
            display_indicators: Vec::new(),
            ..linux_policy()
        };
        let mut env = env(&[]);
        let probe = RenderingEnvironmentProbe::probe(&env, &policy);

        assert!(probe.has_display());
        assert_eq!(select_rendering(&mut env, &policy, &probe), RenderingDecision::Hardware);
        assert!(!env.is_set(SOFTWARE_RENDERING_VAR));
    }

    #[test]
    fn test_set_default_does_not_overwrite() {
        let mut env = env(&[("KEY", "user")]);
        assert!(!env.set_default("KEY", "ours"));
        assert_eq!(env.var_os("KEY"), Some(OsString::from("user")));
        assert!(env.set_default("OTHER", "ours"));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_native_policy_on_linux() {
        assert_eq!(RenderingPolicy::native(), linux_policy());
    }
}
