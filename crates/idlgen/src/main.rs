fn main() -> anyhow::Result<()> {
    idlgen::cli::run()
}
