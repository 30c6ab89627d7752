pub mod gpx_source;
