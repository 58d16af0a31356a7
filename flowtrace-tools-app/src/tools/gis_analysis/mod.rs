// private sub-module defined in other files
mod erase_raster_values;

// exports identifiers from private sub-modules in the current module namespace
pub use self::erase_raster_values::EraseRasterValues;
