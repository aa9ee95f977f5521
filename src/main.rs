use anyhow::Result;

fn main() -> Result<()> {
    mountwarden::cli::run()
}
