//! Internal helper modules for livepull-media. Not re-exported from lib.rs —
//! implementation details the public `Player`/stage API doesn't need to
//! expose.

pub mod url;
