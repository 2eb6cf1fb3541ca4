/// The webpi version.
///
/// Defaults to the workspace package version. Release builds may inject a tag
/// version through the `WEBPI_VERSION` environment variable at compile time.
pub const WEBPI_VERSION: &str = match option_env!("WEBPI_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
