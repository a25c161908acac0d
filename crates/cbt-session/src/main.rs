fn main() -> anyhow::Result<()> {
    cbt_session::cli::main()
}
