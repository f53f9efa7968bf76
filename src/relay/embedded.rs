use rust_embed::RustEmbed;

/// Browser client (`web/`), compiled into the binary.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/web/"]
pub struct Assets;
