fn main() -> anyhow::Result<()> {
    docserve::cli::run_cli()
}
