//! Named collaborators injected into config-driven stack assembly.

use std::collections::HashMap;
use std::sync::Arc;

use orbital_atmosphere::DensityProvider;

use crate::ForceModel;
use crate::ephemeris::{CircularEphemeris, EphemerisProvider};

/// Registry of ephemerides, density models and user force models, looked up by name.
#[derive(Debug, Clone)]
pub struct Providers {
    ephemerides: HashMap<String, EphemerisProvider>,
    densities: HashMap<String, DensityProvider>,
    custom: HashMap<String, Arc<dyn ForceModel>>,
}

impl Default for Providers {
    /// Registers the `ussa76` atmosphere and circular `sun`/`moon` ephemerides about Earth.
    fn default() -> Self {
        Self::empty()
            .with_density("ussa76", DensityProvider::ussa76())
            .with_ephemeris("sun", CircularEphemeris::sun_from_earth().into_provider("sun"))
            .with_ephemeris(
                "moon",
                CircularEphemeris::moon_from_earth().into_provider("moon"),
            )
    }
}

impl Providers {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self {
            ephemerides: HashMap::new(),
            densities: HashMap::new(),
            custom: HashMap::new(),
        }
    }

    pub fn with_ephemeris(mut self, name: impl Into<String>, provider: EphemerisProvider) -> Self {
        self.ephemerides.insert(name.into(), provider);
        self
    }

    pub fn with_density(mut self, name: impl Into<String>, provider: DensityProvider) -> Self {
        self.densities.insert(name.into(), provider);
        self
    }

    pub fn with_custom(mut self, name: impl Into<String>, model: Arc<dyn ForceModel>) -> Self {
        self.custom.insert(name.into(), model);
        self
    }

    pub fn ephemeris(&self, name: &str) -> Option<&EphemerisProvider> {
        self.ephemerides.get(name)
    }

    pub fn density(&self, name: &str) -> Option<&DensityProvider> {
        self.densities.get(name)
    }

    pub fn custom(&self, name: &str) -> Option<&Arc<dyn ForceModel>> {
        self.custom.get(name)
    }
}
