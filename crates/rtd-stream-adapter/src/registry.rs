/*
[INPUT]:  Well-known provider name + provider settings
[OUTPUT]: Boxed provider session ready for server_start
[POS]:    Provider lookup - the single discovery step a client performs
[UPDATE]: When registering a new provider implementation
*/

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, RtdError};
use crate::provider::RtdServer;
use crate::sim::{SimSettings, SimulatedRtdServer};
use crate::ws::{StandxRtdServer, StandxSettings};

pub const SIM_PROVIDER: &str = "Sim.RTD";
pub const STANDX_PROVIDER: &str = "StandX.RTD";

/// Provider selection and per-provider settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderSettings {
    /// Well-known provider name
    #[serde(default = "default_provider_name")]
    pub name: String,
    #[serde(default)]
    pub sim: SimSettings,
    #[serde(default)]
    pub standx: StandxSettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            sim: SimSettings::default(),
            standx: StandxSettings::default(),
        }
    }
}

fn default_provider_name() -> String {
    SIM_PROVIDER.to_string()
}

/// Names accepted by [`open_provider`]
pub fn known_providers() -> &'static [&'static str] {
    &[SIM_PROVIDER, STANDX_PROVIDER]
}

/// Resolve a well-known provider name (case-insensitive) to a provider handle.
pub fn open_provider(name: &str, settings: &ProviderSettings) -> Result<Box<dyn RtdServer>> {
    let server: Box<dyn RtdServer> = if name.eq_ignore_ascii_case(SIM_PROVIDER) {
        Box::new(SimulatedRtdServer::new(settings.sim.clone()))
    } else if name.eq_ignore_ascii_case(STANDX_PROVIDER) {
        Box::new(StandxRtdServer::new(settings.standx.clone()))
    } else {
        return Err(RtdError::ProviderNotFound {
            name: name.to_string(),
        });
    };

    info!(provider = name, "provider resolved");
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Sim.RTD")]
    #[case("sim.rtd")]
    #[case("StandX.RTD")]
    fn known_names_resolve(#[case] name: &str) {
        assert!(open_provider(name, &ProviderSettings::default()).is_ok());
    }

    #[test]
    fn unknown_name_is_provider_not_found() {
        let err = open_provider("Tos.RTD", &ProviderSettings::default())
            .err()
            .expect("unknown provider");
        assert!(matches!(err, RtdError::ProviderNotFound { ref name } if name == "Tos.RTD"));
        assert!(err.is_fatal());
    }

    #[test]
    fn default_settings_select_simulator() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.name, SIM_PROVIDER);
        assert!(known_providers().contains(&settings.name.as_str()));
    }
}
