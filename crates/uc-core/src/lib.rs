//! # uc-core
//!
//! Plumbing shared by the uc2 native bindings.
//!
//! - [`Handle`] and [`NativeResource`]: unique ownership of an engine
//!   resource with exactly-once teardown
//! - [`Subsystem`] and [`Guarded`]: process-wide engine start/stop and
//!   resources whose teardown depends on it
//! - [`Settings`]: YAML configuration for the three engines
//! - [`CoreError`]: errors of the above
//!
//! ## Crate Structure
//!
//! ```text
//! uc-core (this crate)
//!    ^
//!    +-- uc-cms   (colour engine, lcms2)
//!    +-- uc-img   (image toolkit, image)
//!    +-- uc-text  (text layout, cosmic-text)
//!    +-- uc-py    (Python extension uc_native)
//!    +-- uc-cli   (uc2 command)
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod handle;
pub mod settings;
pub mod subsystem;

pub use error::*;
pub use handle::*;
pub use settings::Settings;
pub use subsystem::*;
