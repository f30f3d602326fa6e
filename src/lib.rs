//! Censors secret Habitica tasks in place.
//!
//! A task whose description starts with `㊙` (or whose first emoji is the
//! `secret.png` image) is painted over with a striped background and
//! transparent text. The [`io::coordinator::Coordinator`] watches the page for
//! task list changes and re-runs [`ops::reconcile::reconcile_all`] whenever
//! the list is re-rendered.

pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
