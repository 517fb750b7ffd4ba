//! The `Compilation` handle (Design Notes §9): rather than a global mutable
//! type registry and method registry, one value owns both and is passed
//! explicitly to the checker, lowerer, and SSA builder. A single
//! compilation owns all of its arenas and is dropped as a unit.

use crate::config::CheckerConfig;
use crate::types::TypeRegistry;

pub struct Compilation {
    pub types: TypeRegistry,
    pub config: CheckerConfig,
}

impl Compilation {
    pub fn new(config: CheckerConfig) -> Self {
        Compilation {
            types: TypeRegistry::new(),
            config,
        }
    }
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new(CheckerConfig::default())
    }
}
