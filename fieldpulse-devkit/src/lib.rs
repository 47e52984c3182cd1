/*!
# Fieldpulse DevKit - Fixtures et Harness de Test

Bibliothèque facilitant les tests du pipeline de simulation avec:
- Fixtures d'actifs et de lectures capteurs
- Générateur aléatoire à graine fixe
- Harness store + moniteur + simulateur pour des ticks sans timer
*/

pub mod fixtures;
pub mod harness;

pub use fixtures::{seeded_rng, test_asset, test_reading};
pub use harness::SimHarness;
