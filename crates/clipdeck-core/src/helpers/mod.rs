// crates/clipdeck-core/src/helpers/mod.rs

pub mod time;
