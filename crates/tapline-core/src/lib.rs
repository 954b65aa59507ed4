//! # tapline-core
//!
//! Touch gesture and polling layer for mobile end-to-end UI tests.
//!
//! This crate turns logical interactions ("tap the login button", "scroll
//! down until the footer shows", "wait until the spinner is gone") into
//! timed pointer-event sequences and dispatches them through an
//! [`AutomationSession`](session::AutomationSession). Coordinates are always
//! derived from freshly resolved element geometry or the viewport.
//!
//! ## Modules
//!
//! - [`geometry`] - Points, bounding boxes, directions and gesture path math
//! - [`gesture`] - W3C pointer-action sequences and the gesture builder
//! - [`target`] - Named targets and their locator strategies
//! - [`session`] - The backend trait every interaction talks through
//! - [`actor`] - The performer that runs interactions and keeps a history
//! - [`touch`], [`drag`], [`pinch`], [`swipe`] - The interaction catalog
//! - [`scroll_until`] - Conditional scroll loops
//! - [`wait`] - Condition polling and fixed delays
//! - [`webdriver`] - W3C WebDriver (Appium) backend
//! - [`mock`] - Scriptable in-memory backend for tests
//! - [`record`] - Interaction records and JSON Lines output
//! - [`config`] - Persistent settings in `~/.tapline`
//!
//! ## Example
//!
//! ```no_run
//! use tapline_core::actor::Actor;
//! use tapline_core::scroll_until::ScrollUntil;
//! use tapline_core::target::{Locator, Target};
//! use tapline_core::touch::Tap;
//! use tapline_core::webdriver::WebDriverSession;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = WebDriverSession::attach("http://127.0.0.1:4723", "3f1a9c")?;
//! let mut tester = Actor::named("tester", session);
//!
//! let footer = Target::the("footer link").located_by(Locator::accessibility_id("footer"));
//! tester.attempts_to(&ScrollUntil::down_to_find(footer.clone())).await?;
//! tester.attempts_to(&Tap::on(footer)).await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod interaction;
pub mod mock;
pub mod pinch;
pub mod record;
pub mod scroll_until;
pub mod session;
pub mod swipe;
pub mod target;
pub mod touch;
pub mod wait;
pub mod webdriver;
