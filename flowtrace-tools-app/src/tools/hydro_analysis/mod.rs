// private sub-module defined in other files
mod max_upstream_elevation;

// exports identifiers from private sub-modules in the current module namespace
pub use self::max_upstream_elevation::MaxUpstreamElevation;
