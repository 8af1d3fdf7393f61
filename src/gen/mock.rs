//! Static mock constants used when the build script cannot run
//! (eg: the read only file system of the docs.rs builders).

pub const COMPILATION_DATE: &str = "UNKNOWN";
pub const COMPILATION_TIME: &str = "UNKNOWN";
pub const NAME: &str = "grayboy";
pub const VERSION: &str = "x.x.x";
pub const COMPILER: &str = "rustc";
pub const COMPILER_VERSION: &str = "x.x.x";
pub const HOST: &str = "UNKNOWN";
pub const TARGET: &str = "UNKNOWN";
pub const PROFILE: &str = "UNKNOWN";
pub const OPT_LEVEL: &str = "UNKNOWN";
pub const MAKEFLAGS: &str = "UNKNOWN";
pub const FEATURES_SEQ: [&str; 1] = ["cpu"];
pub const PLATFORM_CPU_BITS: &str = "64";
pub const PLATFORM_CPU_BITS_INT: usize = 64;

pub static DEPENDENCIES: [(&str, &str); 0] = [];
pub static DEPENDENCIES_STR: &str = "";
pub static FEATURES: [&str; 0] = [];
pub static FEATURES_STR: &str = "";
