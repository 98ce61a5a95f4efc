/// UI module exports
pub mod notice;
