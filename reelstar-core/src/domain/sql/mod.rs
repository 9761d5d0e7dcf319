// reelstar-core/src/domain/sql/mod.rs

pub mod quoter;

pub use quoter::quote_ident;
