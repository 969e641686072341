fn main() -> anyhow::Result<()> {
    arborist::run()?;
    Ok(())
}
