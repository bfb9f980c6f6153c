pub use synthesis_core::{FusionRuntime, ProcessLogic, WorkOutcome};
pub mod config {
    pub use synthesis_core::config::*;
}
pub mod error {
    pub use synthesis_core::error::*;
}
pub mod host {
    pub use synthesis_core::host::*;
}
pub mod inheritance {
    pub use synthesis_core::inheritance::*;
}
pub mod ledger {
    pub use synthesis_core::ledger::*;
}
pub mod metrics {
    pub use synthesis_core::metrics::*;
}
pub mod process {
    pub use synthesis_core::process::*;
}
pub mod runtime {
    pub use synthesis_core::runtime::*;
}
pub mod sandbox {
    pub use synthesis_core::sandbox::*;
}
pub mod slots {
    pub use synthesis_core::slots::*;
}
pub mod synthesizer {
    pub use synthesis_core::synthesizer::*;
}

pub mod state {
    pub use synthesis_data::*;
}
