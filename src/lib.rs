//! Headless contact form: typed fields, per-field validation, a guarded
//! submit cycle and a `mailto:` hand-off to the desktop mail composer.
//!
//! Rendering is left to the host. It reads [`form::FormSnapshot`]s through
//! [`contact::ContactForm::subscribe`] and forwards edits and submits back.

pub mod config;
pub mod contact;
pub mod feedback;
pub mod form;
pub mod launcher;
pub mod mailto;
pub mod prelude;
