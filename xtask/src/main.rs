/// Bundler entry point. Everything is delegated to `nih_plug_xtask`:
///
///   cargo xtask bundle toggle-delay --release
///
/// builds the cdylib and writes `target/bundled/Toggle Delay.vst3` and
/// `target/bundled/Toggle Delay.clap`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
