//! The discovery screen: state record, reducer and event loop.
//!
//! ```ignore
//! let (controller, handle, mut view) = DiscoveryController::new(config, services);
//! tokio::spawn(controller.run());
//!
//! handle.send(DiscoveryEvent::Mount);
//! while let Some(command) = view.recv().await {
//!     if command == ViewCommand::Render {
//!         draw(&handle.snapshot());
//!     }
//! }
//! ```

mod controller;
mod state;

pub use controller::{
    is_settled, DiscoveryController, DiscoveryEvent, DiscoveryServices, ResolvedLocation,
    ScreenHandle, ViewCommand,
};
pub use state::{ScreenPhase, ScreenState, Transition};
