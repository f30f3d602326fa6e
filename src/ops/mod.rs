pub mod censor;
pub mod detect;
pub mod reconcile;
pub mod rules;
