fn main() -> anyhow::Result<()> {
    macaux_lib::run()
}
